pub mod dataset;
pub mod entity;
pub mod rating;
pub mod reading;

pub use dataset::*;
pub use entity::*;
pub use rating::*;
pub use reading::*;

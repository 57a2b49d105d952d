pub mod client;
pub mod response;

pub use client::*;
pub use response::*;

use async_trait::async_trait;

use crate::domain::DatasetDescriptor;
use crate::error::FetchError;

/// Source of one reconciled dataset snapshot per call
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<FetchedDataset, FetchError>;
}

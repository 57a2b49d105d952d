//! Singapore air quality sensors.
//!
//! Polls the data.gov.sg PSI and PM2.5 datasets shortly after each hourly
//! update and publishes the readings as one sensor entity per region.

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod publisher;
pub mod registry;
pub mod telemetry;

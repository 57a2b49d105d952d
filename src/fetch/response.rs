//! data.gov.sg environment API payloads and their reconciliation into
//! per-region reading records.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::{display_key, field_count, ReadingRecord};
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub region_metadata: Vec<RegionMetadata>,
    #[serde(default)]
    pub items: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
pub struct RegionMetadata {
    pub name: String,
    pub label_location: LabelLocation,
}

#[derive(Debug, Deserialize)]
pub struct LabelLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct ApiItem {
    pub update_timestamp: Option<DateTime<FixedOffset>>,
    /// field -> region -> value; null or non-numeric values are skipped
    #[serde(default)]
    pub readings: HashMap<String, HashMap<String, Value>>,
}

/// One successfully reconciled dataset fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDataset {
    pub records: Vec<ReadingRecord>,
    pub updated_at: DateTime<FixedOffset>,
}

impl FetchedDataset {
    pub fn display_key(&self) -> String {
        display_key(&self.updated_at)
    }
}

impl ApiResponse {
    /// Cross-join region metadata with every reading field reported for the region.
    ///
    /// A well-formed payload with no readings at all is `EmptyResult`.
    pub fn reconcile(self) -> Result<FetchedDataset, FetchError> {
        let Some(item) = self.items.into_iter().next() else {
            return Err(FetchError::EmptyResult);
        };

        let records = self
            .region_metadata
            .into_iter()
            .map(|region| {
                let mut record = ReadingRecord::new(
                    region.name,
                    region.label_location.latitude,
                    region.label_location.longitude,
                );
                for (field, by_region) in &item.readings {
                    if let Some(value) = by_region.get(&record.location).and_then(Value::as_f64) {
                        record.values.insert(field.clone(), value);
                    }
                }
                record
            })
            .collect::<Vec<_>>();

        if field_count(&records) == 0 {
            return Err(FetchError::EmptyResult);
        }

        let updated_at = item
            .update_timestamp
            .ok_or_else(|| FetchError::Malformed("missing update_timestamp".to_string()))?;

        Ok(FetchedDataset { records, updated_at })
    }
}

/// Parse and reconcile a raw response body.
pub fn parse_body(body: &str) -> Result<FetchedDataset, FetchError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    response.reconcile()
}

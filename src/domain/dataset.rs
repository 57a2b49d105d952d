use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::rating::{classify_pm25, classify_psi};

pub const PSI_HEADLINE_FIELD: &str = "psi_twenty_four_hourly";
pub const PSI_RATING_FIELD: &str = "psi_rating";
pub const PM25_HEADLINE_FIELD: &str = "pm25_one_hourly";
pub const PM25_RATING_FIELD: &str = "pm25_rating";

/// Upstream dataset published by data.gov.sg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DatasetKind {
    Psi,
    Pm25,
}

/// Static description of one upstream source and how its headline reading is rated.
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub kind: DatasetKind,
    pub endpoint: String,
    /// Field that feeds the classifier
    pub headline_field: &'static str,
    /// Field that receives the classifier label
    pub rating_field: &'static str,
    pub classify: fn(f64) -> &'static str,
}

impl DatasetDescriptor {
    pub fn psi(endpoint: impl Into<String>) -> Self {
        Self {
            kind: DatasetKind::Psi,
            endpoint: endpoint.into(),
            headline_field: PSI_HEADLINE_FIELD,
            rating_field: PSI_RATING_FIELD,
            classify: classify_psi,
        }
    }

    pub fn pm25(endpoint: impl Into<String>) -> Self {
        Self {
            kind: DatasetKind::Pm25,
            endpoint: endpoint.into(),
            headline_field: PM25_HEADLINE_FIELD,
            rating_field: PM25_RATING_FIELD,
            classify: classify_pm25,
        }
    }

    pub fn rate(&self, value: f64) -> &'static str {
        (self.classify)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_routes_to_matching_classifier() {
        let psi = DatasetDescriptor::psi("https://example.invalid/psi");
        let pm25 = DatasetDescriptor::pm25("https://example.invalid/pm25");

        assert_eq!(psi.rate(60.0), "Moderate");
        assert_eq!(pm25.rate(60.0), "Elevated");
        assert_eq!(psi.rating_field, "psi_rating");
        assert_eq!(pm25.headline_field, "pm25_one_hourly");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DatasetKind::Psi.to_string(), "psi");
        assert_eq!("pm25".parse::<DatasetKind>().ok(), Some(DatasetKind::Pm25));
    }
}

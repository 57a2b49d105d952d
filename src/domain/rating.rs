//! Severity bands for the two published indices.
//!
//! Each band is inclusive of its lower bound and exclusive of the next
//! threshold; the last band catches everything above the highest threshold.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Pollutant Standards Index air quality descriptor
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    IntoStaticStr,
)]
pub enum PsiRating {
    #[strum(serialize = "Good")]
    Good,
    #[strum(serialize = "Moderate")]
    Moderate,
    #[strum(serialize = "Unhealthy")]
    Unhealthy,
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    #[strum(serialize = "Hazardous")]
    Hazardous,
}

impl PsiRating {
    pub fn from_index(value: f64) -> Self {
        if value < 51.0 {
            Self::Good
        } else if value < 101.0 {
            Self::Moderate
        } else if value < 201.0 {
            Self::Unhealthy
        } else if value < 301.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }
}

/// One-hour PM2.5 concentration band
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    IntoStaticStr,
)]
pub enum Pm25Rating {
    #[strum(serialize = "Normal")]
    Normal,
    #[strum(serialize = "Elevated")]
    Elevated,
    #[strum(serialize = "High")]
    High,
    #[strum(serialize = "Very High")]
    VeryHigh,
}

impl Pm25Rating {
    pub fn from_concentration(value: f64) -> Self {
        if value < 56.0 {
            Self::Normal
        } else if value < 151.0 {
            Self::Elevated
        } else if value < 251.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// Label for a 24-hour PSI reading.
pub fn classify_psi(value: f64) -> &'static str {
    PsiRating::from_index(value).into()
}

/// Label for a one-hour PM2.5 reading.
pub fn classify_pm25(value: f64) -> &'static str {
    Pm25Rating::from_concentration(value).into()
}

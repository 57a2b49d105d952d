use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::DatasetDescriptor;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub adapter: AdapterConfig,
    #[validate(nested)]
    pub api: ApiConfig,
    #[validate(nested)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdapterConfig {
    /// Prefix of every entity id, `{id}-{location}`
    #[validate(length(min = 1))]
    pub id: String,
    pub hide_sub_index: bool,
    /// 0 silent, 1 log request URLs, 2 also log payloads
    #[validate(range(max = 2))]
    pub debug_level: u8,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            id: "psi-sg".to_string(),
            hide_sub_index: false,
            debug_level: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    #[validate(url)]
    pub psi_endpoint: String,
    #[validate(url)]
    pub pm25_endpoint: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            psi_endpoint: "https://api.data.gov.sg/v1/environment/psi".to_string(),
            pm25_endpoint: "https://api.data.gov.sg/v1/environment/pm25".to_string(),
            user_agent: concat!("psi-sg-sensors/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    pub fn datasets(&self) -> Vec<DatasetDescriptor> {
        vec![
            DatasetDescriptor::psi(self.psi_endpoint.clone()),
            DatasetDescriptor::pm25(self.pm25_endpoint.clone()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleConfig {
    /// Upstream publishes on the hour; poll this many minutes after
    #[validate(range(max = 59))]
    pub minutes_past_hour: u64,
    #[validate(range(min = 1))]
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            minutes_past_hour: 11,
            interval_minutes: 60,
        }
    }
}

impl ScheduleConfig {
    pub fn offset(&self) -> Duration {
        Duration::from_secs(self.minutes_past_hour * 60)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PSG__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("config extract failed")?;
        cfg.validate().context("config validation failed")?;
        Ok(cfg)
    }
}

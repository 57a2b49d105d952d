use chrono::{DateTime, Utc};
use chrono_tz::Asia::Singapore;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Url,
};
use tracing::{debug, info};

use super::response::{parse_body, FetchedDataset};
use super::DatasetSource;
use crate::config::ApiConfig;
use crate::domain::DatasetDescriptor;
use crate::error::FetchError;

/// data.gov.sg environment API client
#[derive(Clone)]
pub struct DataGovClient {
    client: reqwest::Client,
    debug_level: u8,
}

impl DataGovClient {
    pub fn new(cfg: &ApiConfig, debug_level: u8) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
        // no explicit timeout; a hung request only risks overlapping the next poll
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { client, debug_level })
    }
}

/// `{endpoint}?date_time=...` with the Singapore local time truncated to seconds.
pub fn request_url(endpoint: &str, now: DateTime<Utc>) -> Result<Url, FetchError> {
    let date_time = now
        .with_timezone(&Singapore)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    Url::parse_with_params(endpoint, &[("date_time", date_time)]).map_err(|e| {
        FetchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    })
}

#[async_trait::async_trait]
impl DatasetSource for DataGovClient {
    async fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<FetchedDataset, FetchError> {
        let url = request_url(&descriptor.endpoint, Utc::now())?;
        if self.debug_level >= 1 {
            info!(dataset = %descriptor.kind, %url, "requesting readings");
        } else {
            debug!(dataset = %descriptor.kind, %url, "requesting readings");
        }

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::http_status(status));
        }

        let body = resp.text().await?;
        if self.debug_level >= 2 {
            info!(dataset = %descriptor.kind, payload = %body, "api payload");
        }

        parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_url_uses_singapore_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 2, 15, 30).unwrap()
            + chrono::Duration::milliseconds(750);
        let url = request_url("https://api.data.gov.sg/v1/environment/psi", now).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.data.gov.sg/v1/environment/psi?date_time=2024-05-01T10%3A15%3A30"
        );
    }

    #[test]
    fn test_request_url_crosses_date_line() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let url = request_url("https://example.invalid/pm25", now).unwrap();
        assert_eq!(url.query(), Some("date_time=2025-01-01T04%3A00%3A00"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = request_url("not a url", Utc::now()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidEndpoint { .. }));
    }
}

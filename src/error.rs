use thiserror::Error;

/// Why one dataset fetch produced nothing to publish.
///
/// Every variant is absorbed by the poll pipeline: it is logged and turned
/// into an `APIerror` event on saved entities.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("api request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("api response status: {status} - {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("malformed api response: {0}")]
    Malformed(String),

    #[error("api returned no readings")]
    EmptyResult,
}

impl FetchError {
    pub fn http_status(status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Short label for log fields: network failures and non-2xx responses are
    /// `transport`, undecodable bodies `malformed`, readable but empty ones `empty`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint { .. } | Self::Transport(_) | Self::HttpStatus { .. } => {
                "transport"
            }
            Self::Malformed(_) => "malformed",
            Self::EmptyResult => "empty",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Malformed(error.to_string())
    }
}

/// Errors returned by the registry-facing hooks of the publisher
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Device: {0} not found.")]
    NotFound(String),

    #[error("addDevice: {0} already exists.")]
    AlreadyExists(String),

    #[error("addDevice: {0} - do not know how to handle.")]
    Unsupported(String),

    #[error("registry error: {0}")]
    Registry(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let e = FetchError::http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "api response status: 500 - Internal Server Error");
        assert_eq!(e.kind(), "transport");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: FetchError = err.into();
        assert!(matches!(e, FetchError::Malformed(_)));
        assert_eq!(e.kind(), "malformed");
        assert_eq!(FetchError::EmptyResult.kind(), "empty");
    }

    #[test]
    fn test_publish_error_display() {
        assert_eq!(
            PublishError::NotFound("psi-sg-west".into()).to_string(),
            "Device: psi-sg-west not found."
        );
    }
}

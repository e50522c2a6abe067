use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Capability;

#[derive(Debug, Error)]
pub enum MedleyError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("provider {name:?} is already registered for {capability}")]
    DuplicateProvider { name: String, capability: Capability },
    #[error("no providers registered for {0}")]
    NoProviders(Capability),
    #[error("no adapter registered for provider {0:?}")]
    AdapterNotFound(String),
    #[error(
        "no provider fits the budget ceiling of {ceiling_usd_micros} USD micros (cheapest estimate: {cheapest_usd_micros})"
    )]
    BudgetExceeded {
        ceiling_usd_micros: u64,
        cheapest_usd_micros: u64,
    },
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MedleyError>;

/// Normalized failure classes shared by every provider adapter. The
/// router only ever sees these kinds; raw provider error codes stay
/// inside the adapter that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    RateLimited,
    InvalidInput,
    ServiceUnavailable,
    Unknown,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RateLimited => "rate_limited",
            Self::InvalidInput => "invalid_input",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let kind = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ProviderErrorKind::RateLimited
        } else if status.is_client_error() {
            ProviderErrorKind::InvalidInput
        } else if status.is_server_error() {
            ProviderErrorKind::ServiceUnavailable
        } else {
            ProviderErrorKind::Unknown
        };
        Self {
            kind,
            message: format!("api error ({status}): {body}"),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return Self::new(
                ProviderErrorKind::ServiceUnavailable,
                format!("http error: {err}"),
            );
        }
        if err.is_decode() {
            return Self::new(
                ProviderErrorKind::Unknown,
                format!("invalid response: {err}"),
            );
        }
        Self::new(ProviderErrorKind::Unknown, format!("http error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_normalized_kinds() {
        let too_many = ProviderError::from_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
        );
        assert_eq!(too_many.kind, ProviderErrorKind::RateLimited);

        let bad_request =
            ProviderError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY, String::new());
        assert_eq!(bad_request.kind, ProviderErrorKind::InvalidInput);

        let unavailable =
            ProviderError::from_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert_eq!(unavailable.kind, ProviderErrorKind::ServiceUnavailable);
    }
}

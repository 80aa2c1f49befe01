use thiserror::Error;

/// 规则拉取错误
#[derive(Debug, Error)]
pub enum RuleSourceError {
    #[error("Invalid rules location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Rules API returned status '{status}': {error_type}: {error}")]
    Api {
        status: String,
        error_type: String,
        error: String,
    },
}

impl RuleSourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RuleSourceError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, RuleSourceError>;

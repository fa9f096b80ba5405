use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReliefApiError>;

#[derive(Debug, Error)]
pub enum ReliefApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The service answered but reported `success: false`.
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ReliefApiError {
    fn from(err: reqwest::Error) -> Self {
        ReliefApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ReliefApiError {
    fn from(err: serde_json::Error) -> Self {
        ReliefApiError::Parse(err.to_string())
    }
}

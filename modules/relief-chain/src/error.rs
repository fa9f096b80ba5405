use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid disaster_hash: {0}")]
    InvalidHash(String),

    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Disaster not found in contract")]
    NotFound,

    #[error("Disaster is not active in contract")]
    Inactive,
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::Network(err.to_string())
    }
}

impl From<hex::FromHexError> for ChainError {
    fn from(err: hex::FromHexError) -> Self {
        ChainError::Decode(err.to_string())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReliefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    DisasterNotFound(String),

    #[error("{0}")]
    DisasterInactive(String),

    #[error("Invalid vote result '{0}'. Must be: approve, reject, higher, or lower.")]
    InvalidVote(String),

    #[error("Missing {0}")]
    MissingField(String),

    #[error("Agent reply has no usable amount: {0}")]
    UnusableReply(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty response from model {0}")]
    EmptyResponse(String),
}

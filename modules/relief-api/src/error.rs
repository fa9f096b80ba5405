use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relief_common::ReliefError;
use relief_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Errors returned to HTTP callers as `{"error": kind, "message": text}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// A dependency could not supply what the request needs.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Upstream(_) => "upstream",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Upstream(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Malformed or incomplete request bodies get the same envelope as every
/// other error instead of axum's plain-text rejection.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ReliefError> for ApiError {
    fn from(err: ReliefError) -> Self {
        match err {
            ReliefError::InvalidVote(_) | ReliefError::MissingField(_) => {
                Self::BadRequest(err.to_string())
            }
            ReliefError::DisasterNotFound(_)
            | ReliefError::DisasterInactive(_)
            | ReliefError::Upstream(_) => Self::Upstream(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ClaimNotFound(_) => Self::NotFound(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

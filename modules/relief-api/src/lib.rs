pub mod error;
pub mod routes;
pub mod traits;

use std::sync::Arc;

use ai_client::ChatAgent;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use relief_store::ClaimStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use traits::{FundingSource, FundsUnlocker};

/// Everything a request needs. Built once at startup and never mutated.
pub struct AppState {
    pub funding: Arc<dyn FundingSource>,
    pub unlocker: Arc<dyn FundsUnlocker>,
    pub claims: Arc<dyn ClaimStore>,
    /// Answers fact-check prompts.
    pub verify_agent: Arc<dyn ChatAgent>,
    /// Proposes revised claim amounts.
    pub vote_agent: Arc<dyn ChatAgent>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/fact-check", post(routes::fact_check))
        .route("/process-vote/", post(routes::process_vote))
        .route("/process-vote", post(routes::process_vote))
        .route("/health", get(routes::health))
        .route("/test-parser", get(routes::test_parser))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // method + path only; bodies carry claim details
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use relief_common::{normalize_disaster_hash, parse_agent_response, DisasterFunding};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FactCheckInput {
    pub statement: String,
    pub disaster_hash: String,
}

#[derive(Debug, Serialize)]
pub struct FactCheckResponse {
    pub amount: Option<f64>,
    pub comment: String,
    pub sources: Vec<String>,
    pub disaster_title: String,
    pub disaster_description: String,
    pub target_amount_usdc: f64,
    pub total_donated_usdc: f64,
    pub funding_progress: f64,
    pub donation_count: String,
    pub creator: String,
    pub created_timestamp: String,
    pub raw_agent_response: String,
}

pub fn fact_check_prompt(statement: &str, funding: &DisasterFunding) -> String {
    format!(
        "Petition: {statement}\n\
         Disaster: {title}\n\
         Disaster Description: {description}\n\
         Target Amount: ${target:.2}\n\
         Total Donated: ${donated:.2}\n\
         Funding Progress: {progress:.1}%\n\
         Donation Count: {count}\n\
         Creator: {creator}\n\
         Created: {timestamp}\n\
         Based on the petition and the current disaster funding status, decide how much should be allocated from the donated funds. \
         Consider the disaster details, funding progress, and the petition request. \
         Respond with the amount to allocate, a brief reasoning, and a single source which shows that the NGO performed the work.",
        title = funding.title,
        description = funding.description,
        target = funding.target_amount,
        donated = funding.total_donated,
        progress = funding.funding_progress,
        count = funding.donation_count,
        creator = funding.creator,
        timestamp = funding.timestamp,
    )
}

/// POST /fact-check
pub async fn fact_check(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FactCheckInput>, JsonRejection>,
) -> Result<Json<FactCheckResponse>, ApiError> {
    let Json(input) = payload?;
    let disaster_hash = normalize_disaster_hash(&input.disaster_hash);
    info!(%disaster_hash, statement = %input.statement, "Fact-check requested");

    let funding = state
        .funding
        .disaster_funding(&disaster_hash)
        .await
        .inspect_err(|e| error!(%disaster_hash, error = %e, "Disaster funding unavailable"))?;

    let prompt = fact_check_prompt(&input.statement, &funding);
    let raw = state
        .verify_agent
        .reply(&prompt)
        .await
        .map_err(|e| {
            error!(error = %e, "Verify agent failed");
            ApiError::Internal(format!("Verify agent failed: {e}"))
        })?;
    let raw = raw.trim().to_string();

    let parsed = parse_agent_response(&raw);
    info!(strategy = %parsed.strategy, "Parsed verify agent reply");

    Ok(Json(FactCheckResponse {
        amount: parsed.amount(),
        comment: parsed.comment(),
        sources: parsed.sources(),
        disaster_title: funding.title,
        disaster_description: funding.description,
        target_amount_usdc: funding.target_amount,
        total_donated_usdc: funding.total_donated,
        funding_progress: funding.funding_progress,
        donation_count: funding.donation_count,
        creator: funding.creator,
        created_timestamp: funding.timestamp,
        raw_agent_response: raw,
    }))
}

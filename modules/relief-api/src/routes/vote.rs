use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use relief_api_client::UnlockRequest;
use relief_common::{
    adjustment_prompt, revised_amount, transition, AmountDirection, ClaimRecord, ClaimUpdate,
    ReliefError, SettlementAction, VoteResult,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::AppState;

pub const APPROVED_STATUS: &str = "✅ Claim approved & funds unlocked successfully.";
pub const REJECTED_STATUS: &str = "❌ Claim rejected.";
pub const REVOTE_STATUS: &str = "🔁 Claim sent back for re-voting with updated amount.";
const REVOTE_REASONING: &str = "AI analyzed the request and suggested adjustment based on context";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    pub vote_result: String,
    pub uuid: String,
    #[serde(default)]
    pub disaster_hash: String,
}

/// POST /process-vote/
///
/// The vote is validated before the claim is read, so an unknown vote never
/// touches storage. Each call performs exactly one transition.
pub async fn process_vote(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VoteInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let vote: VoteResult = input.vote_result.parse()?;

    let claim = state
        .claims
        .get_claim(&input.uuid)
        .await?
        .ok_or_else(|| ApiError::NotFound("UUID not found in DB.".to_string()))?;

    let step = transition(claim.claim_state, vote);
    info!(
        claim_id = %claim.id,
        from = %step.from,
        to = %step.next,
        "Settling vote"
    );

    let body = match step.action {
        SettlementAction::UnlockFunds => approve(&state, &claim, &input.disaster_hash).await?,
        SettlementAction::MarkRejected => {
            state
                .claims
                .apply_claim_update(&claim.id, &ClaimUpdate::rejected())
                .await?;
            json!({ "status": REJECTED_STATUS })
        }
        SettlementAction::ReviseAmount(direction) => revise(&state, &claim, direction).await?,
    };
    Ok(Json(body))
}

async fn approve(
    state: &AppState,
    claim: &ClaimRecord,
    disaster_hash: &str,
) -> Result<Value, ApiError> {
    let recipient = claim
        .organization_address
        .clone()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ReliefError::MissingField("organization_address in DB.".to_string()))?;
    let amount = claim
        .claimed_amount
        .ok_or_else(|| ReliefError::MissingField("claimed_amount in DB.".to_string()))?;
    if disaster_hash.trim().is_empty() {
        return Err(ReliefError::MissingField("disasterHash in request.".to_string()).into());
    }

    let request = UnlockRequest {
        disaster_hash: disaster_hash.to_string(),
        amount: amount.to_string(),
        recipient: recipient.clone(),
    };
    info!(claim_id = %claim.id, amount, %recipient, "Approving claim");

    let receipt = state.unlocker.unlock(&request).await.map_err(|e| {
        error!(claim_id = %claim.id, error = %e, "Fund unlock failed");
        ApiError::Internal(format!("Approval failed: {e}"))
    })?;

    state
        .claims
        .apply_claim_update(&claim.id, &ClaimUpdate::approved(receipt.transaction_hash))
        .await?;

    Ok(json!({
        "status": APPROVED_STATUS,
        "unlockResponse": receipt.raw,
        "claimed_amount_usdc": request.amount,
        "recipient": recipient,
        "disasterHash": request.disaster_hash,
    }))
}

async fn revise(
    state: &AppState,
    claim: &ClaimRecord,
    direction: AmountDirection,
) -> Result<Value, ApiError> {
    let previous = claim.claimed_amount.unwrap_or(0.0);
    let prompt = adjustment_prompt(previous, &claim.reason, direction);

    let reply = state.vote_agent.reply(&prompt).await.map_err(|e| {
        error!(claim_id = %claim.id, error = %e, "Adjustment agent failed");
        ApiError::Internal(format!("AI adjustment failed: {e}"))
    })?;
    let new_amount = revised_amount(&reply)
        .inspect_err(|e| warn!(claim_id = %claim.id, error = %e, "Discarding adjustment"))?;
    info!(claim_id = %claim.id, previous, new_amount, %direction, "Claim amount revised");

    state
        .claims
        .apply_claim_update(&claim.id, &ClaimUpdate::revote(new_amount))
        .await?;

    Ok(json!({
        "status": REVOTE_STATUS,
        "newAmount": new_amount,
        "previousAmount": previous,
        "aiReasoning": REVOTE_REASONING,
    }))
}

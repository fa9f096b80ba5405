//! Claim settlement rules.
//!
//! The next claim state depends on the vote alone. `transition` decides it
//! and names the side effect; callers perform the I/O and then persist the
//! matching `ClaimUpdate`.

use std::fmt;
use std::str::FromStr;

use crate::amount::first_digit_run;
use crate::error::ReliefError;
use crate::types::ClaimState;

/// Recorded as the claim hash when the unlock API returns no transaction hash.
pub const UNLOCK_COMPLETED: &str = "unlock_completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResult {
    Approve,
    Reject,
    Higher,
    Lower,
}

impl FromStr for VoteResult {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "higher" => Ok(Self::Higher),
            "lower" => Ok(Self::Lower),
            _ => Err(ReliefError::InvalidVote(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountDirection {
    Higher,
    Lower,
}

impl fmt::Display for AmountDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Higher => "higher",
            Self::Lower => "lower",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementAction {
    /// Release escrowed funds to the claimant, then mark approved.
    UnlockFunds,
    MarkRejected,
    /// Ask the adjustment agent for a new amount and reopen voting.
    ReviseAmount(AmountDirection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ClaimState,
    pub next: ClaimState,
    pub action: SettlementAction,
}

pub fn transition(current: ClaimState, vote: VoteResult) -> Transition {
    let (next, action) = match vote {
        VoteResult::Approve => (ClaimState::Approved, SettlementAction::UnlockFunds),
        VoteResult::Reject => (ClaimState::Rejected, SettlementAction::MarkRejected),
        VoteResult::Higher => (
            ClaimState::Voting,
            SettlementAction::ReviseAmount(AmountDirection::Higher),
        ),
        VoteResult::Lower => (
            ClaimState::Voting,
            SettlementAction::ReviseAmount(AmountDirection::Lower),
        ),
    };
    Transition {
        from: current,
        next,
        action,
    }
}

/// Fields written back to a claim after a vote. `None` leaves a column as is.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimUpdate {
    pub claim_state: ClaimState,
    pub claims_hash: Option<String>,
    pub claimed_amount: Option<f64>,
}

impl ClaimUpdate {
    pub fn approved(transaction_hash: Option<String>) -> Self {
        Self {
            claim_state: ClaimState::Approved,
            claims_hash: Some(transaction_hash.unwrap_or_else(|| UNLOCK_COMPLETED.to_string())),
            claimed_amount: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            claim_state: ClaimState::Rejected,
            claims_hash: None,
            claimed_amount: None,
        }
    }

    pub fn revote(amount: u64) -> Self {
        Self {
            claim_state: ClaimState::Voting,
            claims_hash: None,
            claimed_amount: Some(amount as f64),
        }
    }
}

/// Prompt sent to the adjustment agent for a contested amount.
pub fn adjustment_prompt(claimed_amount: f64, reason: &str, direction: AmountDirection) -> String {
    format!(
        "The organization has requested {claimed_amount} USDC as relief funds. \
         The reason they provided is: '{reason}'. \
         Voters believe the amount should be '{direction}'. \
         Please analyze the request and suggest a revised amount in USDC. \
         Consider the reason provided and whether the amount should be increased or decreased. \
         Respond with just the new amount as a number."
    )
}

/// New claim amount from the adjustment agent's reply, never below 1.
pub fn revised_amount(reply: &str) -> Result<u64, ReliefError> {
    first_digit_run(reply)
        .map(|n| n.max(1))
        .ok_or_else(|| ReliefError::UnusableReply(reply.trim().to_string()))
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ReliefError;

// --- Disaster record ---

/// USD funding estimate produced by the assessment agent.
///
/// `Unknown` is the sentinel recorded when no `AMOUNT:` marker was found; it
/// disables registration for that run but the record is still persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum UsdEstimate {
    Amount(u64),
    Unknown,
}

impl UsdEstimate {
    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::Amount(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for UsdEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(n) => write!(f, "{n}"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for UsdEstimate {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unknown") {
            return Ok(Self::Unknown);
        }
        s.parse::<u64>()
            .map(Self::Amount)
            .map_err(|_| ReliefError::Storage(format!("invalid USD estimate: {s}")))
    }
}

impl From<UsdEstimate> for String {
    fn from(value: UsdEstimate) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UsdEstimate {
    type Error = ReliefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The canonical entry written once per ingestion run. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Read-more URL returned by discovery.
    pub source: String,
    pub disaster_location: String,
    pub estimated_amount_required: UsdEstimate,
    pub disaster_hash: String,
    pub created_at: DateTime<Utc>,
}

impl DisasterRecord {
    /// Millisecond-precision UTC timestamp, e.g. `2025-07-03T10:15:30.123Z`.
    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Deterministic identifier used when registration did not return a hash.
pub fn fallback_disaster_hash(title: &str, location: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(location.as_bytes());
    hex::encode(hasher.finalize())
}

/// Disaster hashes are bytes32 values; the read API expects a `0x` prefix.
pub fn normalize_disaster_hash(hash: &str) -> String {
    let hash = hash.trim();
    if hash.starts_with("0x") {
        hash.to_string()
    } else {
        format!("0x{hash}")
    }
}

// --- Claim record ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    WaitingForAi,
    Voting,
    Approved,
    Rejected,
    Claimed,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForAi => "waiting_for_ai",
            Self::Voting => "voting",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Claimed => "claimed",
        }
    }
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimState {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_for_ai" => Ok(Self::WaitingForAi),
            "voting" => Ok(Self::Voting),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "claimed" => Ok(Self::Claimed),
            other => Err(ReliefError::Storage(format!("unknown claim_state: {other}"))),
        }
    }
}

/// A relief organization's request to withdraw funds, created outside this
/// system and settled by votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    pub event_id: Option<String>,
    pub organization_name: Option<String>,
    pub organization_address: Option<String>,
    pub claimed_amount: Option<f64>,
    pub reason: String,
    pub claim_state: ClaimState,
    /// Unlock transaction hash, set on approval.
    pub claims_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Funding context ---

/// Funding state of a registered disaster, as read from the disaster API or
/// the contract. Amounts are in whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterFunding {
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub total_donated: f64,
    pub funding_progress: f64,
    pub is_active: bool,
    pub creator: String,
    pub timestamp: String,
    pub donation_count: String,
}

impl DisasterFunding {
    /// Only active disasters with a title can back a claim.
    pub fn require_active(self) -> Result<Self, ReliefError> {
        if self.title.is_empty() {
            return Err(ReliefError::DisasterNotFound("Disaster not found".to_string()));
        }
        if !self.is_active {
            return Err(ReliefError::DisasterInactive(
                "Disaster is not active".to_string(),
            ));
        }
        Ok(self)
    }
}

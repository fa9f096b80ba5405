use relief_common::DisasterFunding;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Disaster registration ---

#[derive(Debug, Clone, Serialize)]
pub struct RegisterDisasterRequest {
    pub title: String,
    pub metadata: DisasterMetadata,
    #[serde(rename = "targetAmountVET")]
    pub target_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisasterMetadata {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RegisterDisasterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "disasterHash")]
    pub disaster_hash: Option<String>,
    pub error: Option<String>,
}

// --- Disaster read ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DisasterEnvelope {
    #[serde(default)]
    pub success: bool,
    pub disaster: Option<DisasterDetails>,
    pub error: Option<String>,
}

/// Disaster as served by the read API. Numeric fields arrive as numbers or
/// strings depending on the deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub total_donated: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub funding_progress_percentage: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, deserialize_with = "flexible_string")]
    pub creator: String,
    #[serde(default, deserialize_with = "flexible_string")]
    pub timestamp: String,
    #[serde(default = "zero", deserialize_with = "flexible_string")]
    pub donation_count: String,
}

fn zero() -> String {
    "0".to_string()
}

impl DisasterDetails {
    /// Registration stores `{description}`; older records carry a bare string.
    pub fn description(&self) -> String {
        match &self.metadata {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.metadata.to_string()),
            Value::Null => "No description available".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DisasterDetails> for DisasterFunding {
    fn from(details: DisasterDetails) -> Self {
        DisasterFunding {
            description: details.description(),
            title: details.title,
            target_amount: details.target_amount,
            total_donated: details.total_donated,
            funding_progress: details.funding_progress_percentage,
            is_active: details.is_active,
            creator: details.creator,
            timestamp: details.timestamp,
            donation_count: details.donation_count,
        }
    }
}

fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s}"))),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!("not a number: {other}"))),
    }
}

fn flexible_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

// --- Fund unlock ---

#[derive(Debug, Clone, Serialize)]
pub struct UnlockRequest {
    #[serde(rename = "disasterHash")]
    pub disaster_hash: String,
    /// Sent as text, the unlock service parses it.
    pub amount: String,
    pub recipient: String,
}

/// Successful unlock. `raw` is the service's full reply.
#[derive(Debug, Clone)]
pub struct UnlockReceipt {
    pub transaction_hash: Option<String>,
    pub raw: Value,
}

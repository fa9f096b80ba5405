pub mod abi;
pub mod error;

pub use abi::DisasterDetails;
pub use error::{ChainError, Result};

use relief_common::DisasterFunding;
use serde_json::{json, Value};

/// Token amounts on the contract carry six decimals.
pub const TOKEN_DECIMALS: u32 = 6;

const GET_DISASTER_DETAILS: &str = "getDisasterDetails(bytes32)";
const GET_FUNDING_PROGRESS: &str = "getFundingProgress(bytes32)";

pub fn from_base_units(amount: u128) -> f64 {
    amount as f64 / 10f64.powi(TOKEN_DECIMALS as i32)
}

/// Calls view functions on the relief contract through a node's JSON-RPC
/// `eth_call`.
pub struct ContractReader {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
}

impl ContractReader {
    pub fn new(rpc_url: impl Into<String>, contract_address: &str) -> Result<Self> {
        let address = contract_address.trim();
        let hex_part = address.trim_start_matches("0x");
        if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
            return Err(ChainError::InvalidAddress(address.to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            contract_address: format!("0x{hex_part}"),
        })
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    async fn eth_call(&self, data: String) -> Result<Vec<u8>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": self.contract_address, "data": data}, "latest"],
        });

        let resp = self.client.post(&self.rpc_url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainError::Rpc {
                code: i64::from(status.as_u16()),
                message: body,
            });
        }
        let body: Value = resp.json().await?;

        if let Some(error) = body.get("error") {
            return Err(ChainError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown RPC error")
                    .to_string(),
            });
        }
        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ChainError::Decode("eth_call returned no result".to_string()))?;
        Ok(hex::decode(result.trim_start_matches("0x"))?)
    }

    pub async fn disaster_details(&self, disaster_hash: &str) -> Result<DisasterDetails> {
        let hash = abi::parse_bytes32(disaster_hash)?;
        let data = abi::encode_call(abi::selector(GET_DISASTER_DETAILS), &[hash]);
        let raw = self.eth_call(data).await?;
        abi::decode_disaster_details(&raw)
    }

    /// The contract's own progress figure for a disaster.
    pub async fn funding_progress(&self, disaster_hash: &str) -> Result<u128> {
        let hash = abi::parse_bytes32(disaster_hash)?;
        let data = abi::encode_call(abi::selector(GET_FUNDING_PROGRESS), &[hash]);
        let raw = self.eth_call(data).await?;
        abi::Words::new(&raw).uint(0)
    }

    /// Funding state of an active disaster, amounts in whole tokens.
    pub async fn disaster_funding(&self, disaster_hash: &str) -> Result<DisasterFunding> {
        tracing::info!(disaster_hash, "Reading disaster from contract");
        let details = self.disaster_details(disaster_hash).await?;
        if details.title.is_empty() {
            return Err(ChainError::NotFound);
        }
        if !details.is_active {
            return Err(ChainError::Inactive);
        }

        let target_amount = from_base_units(details.target_amount);
        let total_donated = from_base_units(details.total_donated);
        let funding_progress = if target_amount > 0.0 {
            total_donated / target_amount * 100.0
        } else {
            0.0
        };
        tracing::info!(
            title = %details.title,
            target_amount,
            total_donated,
            "Read disaster from contract"
        );

        Ok(DisasterFunding {
            title: details.title,
            description: details.metadata,
            target_amount,
            total_donated,
            funding_progress,
            is_active: details.is_active,
            creator: details.creator,
            timestamp: details.timestamp.to_string(),
            // Donation counts are not exposed by the contract views.
            donation_count: "0".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::tests::{encode_details, sample_details, uint_word};
    use axum::{routing::post, Json, Router};

    /// A node that answers every `eth_call` with `reply(data)`.
    async fn serve_node(reply: fn(&str) -> Value) -> String {
        let router = Router::new().route(
            "/",
            post(move |Json(body): Json<Value>| async move {
                assert_eq!(body["method"], "eth_call");
                let data = body["params"][0]["data"].as_str().unwrap_or_default().to_string();
                Json(reply(&data))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn result(bytes: Vec<u8>) -> Value {
        json!({"jsonrpc": "2.0", "id": 1, "result": format!("0x{}", hex::encode(bytes))})
    }

    fn reader(url: String) -> ContractReader {
        ContractReader::new(url, &format!("0x{}", "07".repeat(20))).unwrap()
    }

    fn hash() -> String {
        format!("0x{}", "42".repeat(32))
    }

    #[tokio::test]
    async fn reads_active_disaster_funding() {
        let url = serve_node(|data| {
            let expected = hex::encode(abi::selector(GET_DISASTER_DETAILS));
            assert!(data.starts_with(&format!("0x{expected}")));
            result(encode_details(&sample_details()))
        })
        .await;

        let funding = reader(url).disaster_funding(&hash()).await.unwrap();
        assert_eq!(funding.title, "Valencia floods");
        assert_eq!(funding.target_amount, 1500.0);
        assert_eq!(funding.total_donated, 375.0);
        assert_eq!(funding.funding_progress, 25.0);
        assert_eq!(funding.timestamp, "1720000000");
    }

    #[tokio::test]
    async fn inactive_disaster_is_rejected() {
        let url = serve_node(|_| {
            let mut details = sample_details();
            details.is_active = false;
            result(encode_details(&details))
        })
        .await;

        let err = reader(url).disaster_funding(&hash()).await.unwrap_err();
        assert!(matches!(err, ChainError::Inactive));
    }

    #[tokio::test]
    async fn untitled_disaster_is_not_found() {
        let url = serve_node(|_| {
            let mut details = sample_details();
            details.title.clear();
            result(encode_details(&details))
        })
        .await;

        let err = reader(url).disaster_funding(&hash()).await.unwrap_err();
        assert_eq!(err.to_string(), "Disaster not found in contract");
    }

    #[tokio::test]
    async fn rpc_error_is_surfaced() {
        let url = serve_node(|_| {
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "execution reverted"}})
        })
        .await;

        let err = reader(url).funding_progress(&hash()).await.unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn reads_funding_progress() {
        let url = serve_node(|_| result(uint_word(25))).await;
        assert_eq!(reader(url).funding_progress(&hash()).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn short_hash_fails_before_any_call() {
        let err = reader("http://127.0.0.1:1/".to_string())
            .disaster_funding("0xabc")
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidHash(_)));
    }

    #[test]
    fn base_units_have_six_decimals() {
        assert_eq!(from_base_units(1_500_000), 1.5);
        assert_eq!(from_base_units(0), 0.0);
    }

    #[test]
    fn contract_address_is_validated() {
        let address = format!("0x{}", "07".repeat(20));
        let reader = ContractReader::new("http://localhost:8545", &address).unwrap();
        assert_eq!(reader.contract_address(), address);
        assert!(matches!(
            ContractReader::new("http://localhost:8545", "0x1234"),
            Err(ChainError::InvalidAddress(_))
        ));
    }
}

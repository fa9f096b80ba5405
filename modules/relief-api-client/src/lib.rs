pub mod error;
pub mod types;

pub use error::{ReliefApiError, Result};
pub use types::{
    DisasterDetails, DisasterMetadata, RegisterDisasterRequest, UnlockReceipt, UnlockRequest,
};

use relief_common::{normalize_disaster_hash, DisasterFunding};
use serde_json::Value;
use types::{DisasterEnvelope, RegisterDisasterResponse};

/// Turn a non-2xx reply into `ReliefApiError::Api` with the body as message.
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ReliefApiError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

// --- Disaster registry ---

/// Registers disasters on the donation platform.
pub struct DisasterRegistryClient {
    client: reqwest::Client,
    url: String,
}

impl DisasterRegistryClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Register a disaster and return the hash the platform assigned to it.
    pub async fn register(&self, request: &RegisterDisasterRequest) -> Result<String> {
        tracing::info!(
            title = %request.title,
            target_amount = request.target_amount,
            "Registering disaster"
        );

        let resp = self.client.post(&self.url).json(request).send().await?;
        let resp = ensure_success(resp).await?;
        let body: RegisterDisasterResponse = resp.json().await?;

        if !body.success {
            return Err(ReliefApiError::Rejected(
                body.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        body.disaster_hash
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ReliefApiError::Parse("registration returned no disasterHash".into()))
    }
}

// --- Disaster read ---

/// Reads funding state of registered disasters.
pub struct DisasterFetchClient {
    client: reqwest::Client,
    base_url: String,
}

impl DisasterFetchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub async fn fetch(&self, disaster_hash: &str) -> Result<DisasterFunding> {
        let hash = normalize_disaster_hash(disaster_hash);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), hash);
        tracing::info!(%url, "Fetching disaster details");

        let resp = self.client.get(&url).send().await?;
        let resp = ensure_success(resp).await?;
        let body: DisasterEnvelope = resp.json().await?;

        if !body.success {
            return Err(ReliefApiError::Rejected(format!(
                "API returned error: {}",
                body.error.as_deref().unwrap_or("Unknown error")
            )));
        }
        let details = body.disaster.ok_or_else(|| {
            ReliefApiError::Rejected("No disaster data found in API response".to_string())
        })?;

        tracing::info!(
            title = %details.title,
            target_amount = details.target_amount,
            total_donated = details.total_donated,
            progress = details.funding_progress_percentage,
            "Fetched disaster"
        );
        Ok(details.into())
    }
}

// --- Fund unlock ---

/// Releases escrowed funds to a claimant.
pub struct UnlockClient {
    client: reqwest::Client,
    url: String,
}

impl UnlockClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub async fn unlock(&self, request: &UnlockRequest) -> Result<UnlockReceipt> {
        tracing::info!(
            disaster_hash = %request.disaster_hash,
            amount = %request.amount,
            recipient = %request.recipient,
            "Requesting fund unlock"
        );

        let resp = self.client.post(&self.url).json(request).send().await?;
        let resp = ensure_success(resp).await?;
        let raw: Value = resp.json().await?;

        if raw.get("success").and_then(Value::as_bool) != Some(true) {
            let reason = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(ReliefApiError::Rejected(format!("Unlock funds failed: {reason}")));
        }

        let transaction_hash = raw
            .pointer("/data/transactionHash")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(UnlockReceipt {
            transaction_hash,
            raw,
        })
    }
}

// --- Price quotes ---

/// USD quotes for the platform's donation currency.
pub struct PriceClient {
    client: reqwest::Client,
    url: String,
    symbol: String,
}

impl PriceClient {
    pub fn new(url: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            symbol: symbol.into(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Current USD price, or `None` when the quote has no entry for the symbol.
    pub async fn usd_price(&self) -> Result<Option<f64>> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("ids", self.symbol.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let body: Value = resp.json().await?;

        let price = body
            .get(&self.symbol)
            .and_then(|quote| quote.get("usd"))
            .and_then(Value::as_f64);
        tracing::info!(symbol = %self.symbol, ?price, "Fetched price quote");
        Ok(price)
    }
}

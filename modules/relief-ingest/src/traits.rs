// Seams between the ingestion pipeline and the outside world.
//
// PriceOracle and DisasterRegistry wrap the platform REST clients so the
// pipeline can be driven in tests without a network. Agents are plain
// `ChatAgent`s from ai-client.

use std::sync::Arc;

use ai_client::ChatAgent;
use anyhow::Result;
use async_trait::async_trait;
use relief_api_client::{DisasterRegistryClient, PriceClient, RegisterDisasterRequest};

#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD price of the donation currency, `None` when no quote is available.
    async fn usd_price(&self) -> Result<Option<f64>>;
}

#[async_trait]
impl PriceOracle for PriceClient {
    async fn usd_price(&self) -> Result<Option<f64>> {
        Ok(PriceClient::usd_price(self).await?)
    }
}

#[async_trait]
pub trait DisasterRegistry: Send + Sync {
    /// Register a disaster, returning its platform hash.
    async fn register(&self, request: &RegisterDisasterRequest) -> Result<String>;
}

#[async_trait]
impl DisasterRegistry for DisasterRegistryClient {
    async fn register(&self, request: &RegisterDisasterRequest) -> Result<String> {
        Ok(DisasterRegistryClient::register(self, request).await?)
    }
}

/// The five agents one run talks to.
#[derive(Clone)]
pub struct IngestAgents {
    pub discovery: Arc<dyn ChatAgent>,
    pub geolocation: Arc<dyn ChatAgent>,
    pub weather: Arc<dyn ChatAgent>,
    pub assessment: Arc<dyn ChatAgent>,
    pub announcement: Arc<dyn ChatAgent>,
}

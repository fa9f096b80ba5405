//! One ingestion run: discover, enrich, price, register, announce, persist.
//!
//! Stage failures are logged and skip only the stages that depend on them.
//! Announcement and persistence always run with whatever the run produced.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use relief_api_client::{DisasterMetadata, RegisterDisasterRequest};
use relief_common::{fallback_disaster_hash, DisasterRecord, UsdEstimate};
use relief_store::DisasterStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::discovery::{parse_discovery, DiscoveredDisaster, DISCOVERY_QUERY};
use crate::funding::{convert_usd_to_crypto, extract_usd_amount};
use crate::prompts;
use crate::traits::{DisasterRegistry, IngestAgents, PriceOracle};

/// What a single run got done.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub title: Option<String>,
    pub usd_estimate: Option<UsdEstimate>,
    pub crypto_target: Option<f64>,
    pub disaster_hash: Option<String>,
    pub registered: bool,
    pub announced: bool,
    pub persisted: bool,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usd = self
            .usd_estimate
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        let crypto = self
            .crypto_target
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "title={:?} usd={} crypto_target={} hash={} registered={} announced={} persisted={}",
            self.title.as_deref().unwrap_or("-"),
            usd,
            crypto,
            self.disaster_hash.as_deref().unwrap_or("-"),
            self.registered,
            self.announced,
            self.persisted,
        )
    }
}

pub struct IngestPipeline {
    agents: IngestAgents,
    prices: Arc<dyn PriceOracle>,
    registry: Arc<dyn DisasterRegistry>,
    store: Arc<dyn DisasterStore>,
}

impl IngestPipeline {
    pub fn new(
        agents: IngestAgents,
        prices: Arc<dyn PriceOracle>,
        registry: Arc<dyn DisasterRegistry>,
        store: Arc<dyn DisasterStore>,
    ) -> Self {
        Self {
            agents,
            prices,
            registry,
            store,
        }
    }

    /// Run every stage once. Only a failed write of the disaster record is an
    /// error; everything else degrades the run.
    pub async fn run_once(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        info!("Fetching recent disaster");
        let reply = match self.agents.discovery.reply(DISCOVERY_QUERY).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Discovery failed, ending run");
                return Ok(stats);
            }
        };
        let disaster = parse_discovery(&reply);
        info!(
            title = %disaster.title,
            location = %disaster.location,
            read_more = %disaster.read_more,
            "Discovered disaster"
        );
        stats.title = Some(disaster.title.clone());

        let usd = match self.assess(&disaster).await {
            Some(assessment) => extract_usd_amount(&assessment),
            None => UsdEstimate::Unknown,
        };
        info!(usd = %usd, "Funding estimate");
        stats.usd_estimate = Some(usd);

        let registered_hash = match usd.amount() {
            Some(amount) => self.register(&disaster, amount, &mut stats).await,
            None => {
                info!("No USD estimate, skipping registration");
                None
            }
        };
        stats.registered = registered_hash.is_some();
        let disaster_hash = registered_hash
            .unwrap_or_else(|| fallback_disaster_hash(&disaster.title, &disaster.location));
        stats.disaster_hash = Some(disaster_hash.clone());

        stats.announced = self.announce(&disaster, usd).await;

        let record = DisasterRecord {
            id: Uuid::new_v4(),
            title: disaster.title,
            description: disaster.description,
            source: disaster.read_more,
            disaster_location: disaster.location,
            estimated_amount_required: usd,
            disaster_hash,
            created_at: Utc::now(),
        };
        info!(
            id = %record.id,
            hash = %record.disaster_hash,
            created_at = %record.created_at_iso(),
            "Persisting disaster record"
        );
        self.store
            .put_disaster(&record)
            .await
            .context("persisting disaster record")?;
        stats.persisted = true;

        Ok(stats)
    }

    /// Geolocate, forecast and assess, trimming each reply before it feeds
    /// the next prompt. `None` when any step fails.
    async fn assess(&self, disaster: &DiscoveredDisaster) -> Option<String> {
        let bounding_box = self
            .agents
            .geolocation
            .reply(&prompts::geolocation_message(disaster))
            .await
            .map(|reply| reply.trim().to_string())
            .map_err(|e| warn!(error = %e, "Geolocation failed, skipping assessment"))
            .ok()?;

        let weather = self
            .agents
            .weather
            .reply(&prompts::weather_message(&bounding_box))
            .await
            .map(|reply| reply.trim().to_string())
            .map_err(|e| warn!(error = %e, "Weather lookup failed, skipping assessment"))
            .ok()?;

        self.agents
            .assessment
            .reply(&prompts::assessment_message(disaster, &weather))
            .await
            .map(|reply| reply.trim().to_string())
            .map_err(|e| warn!(error = %e, "Funding assessment failed"))
            .ok()
    }

    async fn register(
        &self,
        disaster: &DiscoveredDisaster,
        usd: u64,
        stats: &mut RunStats,
    ) -> Option<String> {
        let price = match self.prices.usd_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, "Price quote failed");
                None
            }
        };
        let Some(target) = convert_usd_to_crypto(usd, price) else {
            warn!(?price, "No usable price quote, skipping registration");
            return None;
        };
        info!(usd, target, "Converted funding target");
        stats.crypto_target = Some(target);

        let request = RegisterDisasterRequest {
            title: disaster.title.clone(),
            metadata: DisasterMetadata {
                description: disaster.description.clone(),
            },
            target_amount: target,
        };
        match self.registry.register(&request).await {
            Ok(hash) => {
                info!(%hash, "Disaster registered");
                Some(hash)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed, using fallback hash");
                None
            }
        }
    }

    async fn announce(&self, disaster: &DiscoveredDisaster, usd: UsdEstimate) -> bool {
        let tweet = prompts::tweet_text(disaster, usd);
        match self
            .agents
            .announcement
            .reply(&prompts::announcement_message(&tweet))
            .await
        {
            Ok(reply) => {
                info!(reply = %reply, "Announcement posted");
                true
            }
            Err(e) => {
                warn!(error = %e, "Announcement failed");
                false
            }
        }
    }
}

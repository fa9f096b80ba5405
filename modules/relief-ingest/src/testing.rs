// Test doubles for the ingestion pipeline.
//
// - FixedPrice (PriceOracle): a canned quote, or a failure
// - RecordingRegistry (DisasterRegistry): returns a fixed hash or error and
//   keeps every request it was sent
// - ScriptedAgents: one ScriptedAgent per pipeline role, convertible into IngestAgents

use std::sync::{Arc, Mutex};

use ai_client::testing::ScriptedAgent;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use relief_api_client::RegisterDisasterRequest;

use crate::traits::{DisasterRegistry, IngestAgents, PriceOracle};

pub enum FixedPrice {
    Quote(Option<f64>),
    Fail,
}

#[async_trait]
impl PriceOracle for FixedPrice {
    async fn usd_price(&self) -> Result<Option<f64>> {
        match self {
            Self::Quote(price) => Ok(*price),
            Self::Fail => Err(anyhow!("price service unavailable")),
        }
    }
}

pub struct RecordingRegistry {
    hash: Option<String>,
    requests: Mutex<Vec<RegisterDisasterRequest>>,
}

impl RecordingRegistry {
    pub fn returning(hash: impl Into<String>) -> Self {
        Self {
            hash: Some(hash.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hash: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RegisterDisasterRequest> {
        self.requests.lock().expect("registry lock poisoned").clone()
    }
}

#[async_trait]
impl DisasterRegistry for RecordingRegistry {
    async fn register(&self, request: &RegisterDisasterRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("registry lock poisoned")
            .push(request.clone());
        self.hash
            .clone()
            .ok_or_else(|| anyhow!("registration rejected"))
    }
}

/// Scripted agents for each pipeline role, kept so tests can inspect calls.
pub struct ScriptedAgents {
    pub discovery: Arc<ScriptedAgent>,
    pub geolocation: Arc<ScriptedAgent>,
    pub weather: Arc<ScriptedAgent>,
    pub assessment: Arc<ScriptedAgent>,
    pub announcement: Arc<ScriptedAgent>,
}

impl ScriptedAgents {
    pub fn new(
        discovery: ScriptedAgent,
        geolocation: ScriptedAgent,
        weather: ScriptedAgent,
        assessment: ScriptedAgent,
        announcement: ScriptedAgent,
    ) -> Self {
        Self {
            discovery: Arc::new(discovery),
            geolocation: Arc::new(geolocation),
            weather: Arc::new(weather),
            assessment: Arc::new(assessment),
            announcement: Arc::new(announcement),
        }
    }

    pub fn agents(&self) -> IngestAgents {
        IngestAgents {
            discovery: self.discovery.clone(),
            geolocation: self.geolocation.clone(),
            weather: self.weather.clone(),
            assessment: self.assessment.clone(),
            announcement: self.announcement.clone(),
        }
    }
}

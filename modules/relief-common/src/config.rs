use std::time::Duration;

use crate::error::ReliefError;

pub const DEFAULT_AGENT_BASE_URL: &str = "https://api.mosaia.ai/v1/agent";
pub const DEFAULT_DISCOVERY_MODEL: &str = "gpt-4o-search-preview";
pub const DEFAULT_DISASTER_API_URL: &str = "https://disastercreationserver.onrender.com/disasters";
pub const DEFAULT_DISASTER_FETCH_URL: &str = "https://disasterfetch.onrender.com/api/disasters";
pub const DEFAULT_UNLOCK_FUNDS_URL: &str = "https://unlockfunds.onrender.com/unlock-funds/";
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_PRICE_SYMBOL: &str = "vechain";

const DEFAULT_BBOX_AGENT_ID: &str = "6864d6cbca5744854d34c998";
const DEFAULT_WEATHER_AGENT_ID: &str = "6864dd95ade4d61675d45e4d";
const DEFAULT_ANALYSIS_AGENT_ID: &str = "6866162ee2d11c774d448a27";
const DEFAULT_TWEET_AGENT_ID: &str = "6864e70f77520411d032518a";
const DEFAULT_FACT_CHECK_AGENT_ID: &str = "686656aaf14ab5c885e431ce";
const DEFAULT_VOTE_AGENT_ID: &str = "6866646ff14ab5c885e4386d";

/// A hosted agent: its own key, addressed by id as the model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub api_key: String,
    pub agent_id: String,
}

/// Where fact-checks read disaster funding from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingSourceKind {
    Api,
    Chain {
        rpc_url: String,
        contract_address: String,
    },
}

/// Configuration for the hourly ingestion job.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database_url: String,
    pub openai_api_key: String,
    pub discovery_model: String,
    pub agent_base_url: String,
    pub bbox_agent: AgentConfig,
    pub weather_agent: AgentConfig,
    pub analysis_agent: AgentConfig,
    pub tweet_agent: AgentConfig,
    pub disaster_api_url: String,
    pub price_api_url: String,
    pub price_symbol: String,
    pub interval: Duration,
    pub http_timeout: Duration,
}

/// Configuration for the claim settlement service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub agent_base_url: String,
    pub verify_agent_key: String,
    pub fact_check_agent_id: String,
    pub vote_agent_id: String,
    pub disaster_fetch_url: String,
    pub unlock_funds_url: String,
    pub funding_source: FundingSourceKind,
    pub host: String,
    pub port: u16,
    pub http_timeout: Duration,
}

/// Variable lookup, so configs can be built from a map in tests.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ReliefError> {
        self.optional(key)
            .ok_or_else(|| ReliefError::Config(format!("{key} environment variable not set")))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ReliefError> {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ReliefError::Config(format!("{key} has invalid value '{raw}'"))),
            None => Ok(default),
        }
    }

    fn agent(&self, prefix: &str, default_id: &str) -> Result<AgentConfig, ReliefError> {
        Ok(AgentConfig {
            api_key: self.required(&format!("{prefix}_AGENT_KEY"))?,
            agent_id: self.or(&format!("{prefix}_AGENT_ID"), default_id),
        })
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ReliefError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(process_env)?;
        config.log_redacted();
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReliefError> {
        let env = Env(lookup);
        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            openai_api_key: env.required("OPENAI_API_KEY")?,
            discovery_model: env.or("DISCOVERY_MODEL", DEFAULT_DISCOVERY_MODEL),
            agent_base_url: env.or("AGENT_BASE_URL", DEFAULT_AGENT_BASE_URL),
            bbox_agent: env.agent("BBOX", DEFAULT_BBOX_AGENT_ID)?,
            weather_agent: env.agent("WEATHER", DEFAULT_WEATHER_AGENT_ID)?,
            analysis_agent: env.agent("ANALYSIS", DEFAULT_ANALYSIS_AGENT_ID)?,
            tweet_agent: env.agent("TWEET", DEFAULT_TWEET_AGENT_ID)?,
            disaster_api_url: env.or("DISASTER_API_URL", DEFAULT_DISASTER_API_URL),
            price_api_url: env.or("PRICE_API_URL", DEFAULT_PRICE_API_URL),
            price_symbol: env.or("PRICE_SYMBOL", DEFAULT_PRICE_SYMBOL),
            interval: Duration::from_secs(env.parsed("INGEST_INTERVAL_SECS", 3600)?),
            http_timeout: Duration::from_secs(env.parsed("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("Ingest config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  DISCOVERY_MODEL: {}", self.discovery_model);
        tracing::info!("  AGENT_BASE_URL: {}", self.agent_base_url);
        for (name, agent) in [
            ("BBOX", &self.bbox_agent),
            ("WEATHER", &self.weather_agent),
            ("ANALYSIS", &self.analysis_agent),
            ("TWEET", &self.tweet_agent),
        ] {
            tracing::info!(
                "  {name}_AGENT: {} key={}",
                agent.agent_id,
                preview(&agent.api_key)
            );
        }
        tracing::info!("  DISASTER_API_URL: {}", self.disaster_api_url);
        tracing::info!("  PRICE: {} via {}", self.price_symbol, self.price_api_url);
        tracing::info!("  INTERVAL: {}s", self.interval.as_secs());
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ReliefError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(process_env)?;
        config.log_redacted();
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReliefError> {
        let env = Env(lookup);
        let funding_source = match env.or("FUNDING_SOURCE", "api").to_ascii_lowercase().as_str() {
            "api" => FundingSourceKind::Api,
            "chain" => FundingSourceKind::Chain {
                rpc_url: env.required("CHAIN_RPC_URL")?,
                contract_address: env.required("CHAIN_CONTRACT_ADDRESS")?,
            },
            other => {
                return Err(ReliefError::Config(format!(
                    "FUNDING_SOURCE must be 'api' or 'chain', got '{other}'"
                )))
            }
        };

        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            agent_base_url: env.or("AGENT_BASE_URL", DEFAULT_AGENT_BASE_URL),
            verify_agent_key: env.required("VERIFY_AGENT_KEY")?,
            fact_check_agent_id: env.or("FACT_CHECK_AGENT_ID", DEFAULT_FACT_CHECK_AGENT_ID),
            vote_agent_id: env.or("VOTE_AGENT_ID", DEFAULT_VOTE_AGENT_ID),
            disaster_fetch_url: env.or("DISASTER_FETCH_URL", DEFAULT_DISASTER_FETCH_URL),
            unlock_funds_url: env.or("UNLOCK_FUNDS_URL", DEFAULT_UNLOCK_FUNDS_URL),
            funding_source,
            host: env.or("API_HOST", "0.0.0.0"),
            port: env.parsed("API_PORT", 8000)?,
            http_timeout: Duration::from_secs(env.parsed("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("Service config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  AGENT_BASE_URL: {}", self.agent_base_url);
        tracing::info!("  VERIFY_AGENT_KEY: {}", preview(&self.verify_agent_key));
        tracing::info!("  FACT_CHECK_AGENT_ID: {}", self.fact_check_agent_id);
        tracing::info!("  VOTE_AGENT_ID: {}", self.vote_agent_id);
        tracing::info!("  DISASTER_FETCH_URL: {}", self.disaster_fetch_url);
        tracing::info!("  UNLOCK_FUNDS_URL: {}", self.unlock_funds_url);
        match &self.funding_source {
            FundingSourceKind::Api => tracing::info!("  FUNDING_SOURCE: api"),
            FundingSourceKind::Chain {
                rpc_url,
                contract_address,
            } => tracing::info!(
                "  FUNDING_SOURCE: chain {} at {}",
                contract_address,
                preview(rpc_url)
            ),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn preview(val: &str) -> String {
    let shown: String = val.chars().take(5).collect();
    format!("{shown}...({} chars)", val.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const INGEST_VARS: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/relief"),
        ("OPENAI_API_KEY", "sk-test"),
        ("BBOX_AGENT_KEY", "bbox"),
        ("WEATHER_AGENT_KEY", "weather"),
        ("ANALYSIS_AGENT_KEY", "analysis"),
        ("TWEET_AGENT_KEY", "tweet"),
    ];

    #[test]
    fn ingest_defaults() {
        let config = IngestConfig::from_lookup(lookup(INGEST_VARS)).unwrap();
        assert_eq!(config.discovery_model, "gpt-4o-search-preview");
        assert_eq!(config.bbox_agent.agent_id, "6864d6cbca5744854d34c998");
        assert_eq!(config.analysis_agent.api_key, "analysis");
        assert_eq!(config.price_symbol, "vechain");
        assert_eq!(config.interval, Duration::from_secs(3600));
    }

    #[test]
    fn missing_agent_key_names_variable() {
        let vars: Vec<_> = INGEST_VARS
            .iter()
            .copied()
            .filter(|(k, _)| *k != "TWEET_AGENT_KEY")
            .collect();
        let err = IngestConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("TWEET_AGENT_KEY"), "got: {err}");
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let mut vars = INGEST_VARS.to_vec();
        vars.push(("INGEST_INTERVAL_SECS", "hourly"));
        assert!(IngestConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn service_defaults_to_api_funding() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/relief"),
            ("VERIFY_AGENT_KEY", "verify"),
        ]))
        .unwrap();
        assert_eq!(config.funding_source, FundingSourceKind::Api);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.vote_agent_id, "6866646ff14ab5c885e4386d");
    }

    #[test]
    fn chain_funding_requires_rpc() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/relief"),
            ("VERIFY_AGENT_KEY", "verify"),
            ("FUNDING_SOURCE", "chain"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CHAIN_RPC_URL"));
    }

    #[test]
    fn preview_is_char_safe() {
        assert_eq!(preview("sk-abcdefgh"), "sk-ab...(11 chars)");
        assert_eq!(preview("日本語"), "日本語...(3 chars)");
    }
}

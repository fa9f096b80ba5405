use std::sync::Arc;
use std::time::Duration;

use ai_client::OpenAi;
use anyhow::Result;
use clap::Parser;
use relief_api_client::{DisasterRegistryClient, PriceClient};
use relief_common::{AgentConfig, IngestConfig};
use relief_ingest::{discovery_agent, IngestAgents, IngestPipeline, Scheduler};
use relief_store::PgStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ingest", about = "Discover, assess and register disasters on a schedule")]
struct Cli {
    /// Run the pipeline once and exit
    #[arg(long)]
    once: bool,

    /// Seconds between runs (overrides INGEST_INTERVAL_SECS)
    #[arg(long)]
    interval_secs: Option<u64>,
}

fn hosted_agent(base_url: &str, agent: &AgentConfig, http: &reqwest::Client) -> Arc<OpenAi> {
    Arc::new(
        OpenAi::new(&agent.api_key, &agent.agent_id)
            .with_base_url(base_url)
            .with_http_client(http.clone()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("relief=info".parse()?)
        .add_directive("ai_client=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let cli = Cli::parse();
    info!("Relief ingest starting...");

    let config = IngestConfig::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let agents = IngestAgents {
        discovery: Arc::new(discovery_agent(
            &config.openai_api_key,
            &config.discovery_model,
            http.clone(),
        )),
        geolocation: hosted_agent(&config.agent_base_url, &config.bbox_agent, &http),
        weather: hosted_agent(&config.agent_base_url, &config.weather_agent, &http),
        assessment: hosted_agent(&config.agent_base_url, &config.analysis_agent, &http),
        announcement: hosted_agent(&config.agent_base_url, &config.tweet_agent, &http),
    };
    let prices = PriceClient::new(&config.price_api_url, &config.price_symbol)
        .with_http_client(http.clone());
    let registry = DisasterRegistryClient::new(&config.disaster_api_url).with_http_client(http);

    let pipeline = IngestPipeline::new(
        agents,
        Arc::new(prices),
        Arc::new(registry),
        Arc::new(store),
    );

    let interval = cli
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.interval);
    let mut scheduler = Scheduler::new(interval);
    if cli.once {
        scheduler = scheduler.with_max_runs(1);
    }

    let runs = scheduler.run(&pipeline).await;
    info!(runs, "Relief ingest finished");
    Ok(())
}

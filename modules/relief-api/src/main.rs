use std::sync::Arc;

use ai_client::OpenAi;
use anyhow::{Context, Result};
use relief_api::{build_router, AppState, FundingSource};
use relief_api_client::{DisasterFetchClient, UnlockClient};
use relief_chain::ContractReader;
use relief_common::{FundingSourceKind, ServiceConfig};
use relief_store::PgStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn funding_source(
    config: &ServiceConfig,
    http: &reqwest::Client,
) -> Result<Arc<dyn FundingSource>> {
    let source: Arc<dyn FundingSource> = match &config.funding_source {
        FundingSourceKind::Api => Arc::new(
            DisasterFetchClient::new(&config.disaster_fetch_url).with_http_client(http.clone()),
        ),
        FundingSourceKind::Chain {
            rpc_url,
            contract_address,
        } => Arc::new(
            ContractReader::new(rpc_url, contract_address)
                .context("invalid chain funding source")?
                .with_http_client(http.clone()),
        ),
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("relief=info".parse()?)
        .add_directive("ai_client=info".parse()?)
        .add_directive("tower_http=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ServiceConfig::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let agent = |id: &str| {
        Arc::new(
            OpenAi::new(&config.verify_agent_key, id)
                .with_base_url(&config.agent_base_url)
                .with_http_client(http.clone()),
        )
    };

    let state = Arc::new(AppState {
        funding: funding_source(&config, &http)?,
        unlocker: Arc::new(
            UnlockClient::new(&config.unlock_funds_url).with_http_client(http.clone()),
        ),
        claims: Arc::new(store),
        verify_agent: agent(&config.fact_check_agent_id),
        vote_agent: agent(&config.vote_agent_id),
    });
    let app = build_router(state);

    let addr = config.bind_addr();
    info!("Relief API starting on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use atfirst_server::telemetry::{self, TelemetryConfig};
use atfirst_server::{AppState, Config};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init(TelemetryConfig::from_env("atfirst"));

    let config = Config::parse();
    info!(
        appview = %config.appview_url,
        plc = %config.plc_url,
        record_limit = config.record_limit,
        cache_ttl_secs = config.cache_ttl_secs,
        "starting"
    );

    let state = AppState::from_config(&config)?;
    atfirst_server::run(state, config.listen_addr).await?;

    Ok(())
}

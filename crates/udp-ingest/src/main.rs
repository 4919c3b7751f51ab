use clap::Parser;
use keyed_dispatch::tracing::setup_tracing;
use tracing::{error, info};

use udp_ingest::system::{IngestConfig, IngestSystem};
use udp_ingest::telemetry::TelemetryProcessor;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    setup_tracing();

    let config = IngestConfig::parse();
    info!(bind = %config.bind, port = config.port, "starting udp ingest");

    let system = match IngestSystem::start(&config, TelemetryProcessor).await {
        Ok(system) => system,
        Err(e) => {
            error!(error = %e, "ingest system start failed");
            return Err(e);
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    system.shutdown().await;
    Ok(())
}

use anyhow::Context;
use fittrack_client::{ClientConfig, FitTrackClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fittrack_observability::init();

    let config = ClientConfig::from_env();
    tracing::info!(
        platform = %config.platform,
        host = %config.host,
        environment = ?config.environment,
        "starting fittrack sync"
    );

    let client = FitTrackClient::connect(config)
        .await
        .context("failed to initialize client")?;

    if !client.api().restore_session().await? {
        tracing::warn!("no stored session; protected requests will fail until login");
    }

    client.sync().start_sync();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    client.sync().stop_sync();

    Ok(())
}

use auction_ingest::{config::Config, ecs_service::EcsService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("auction_ingest=debug,aws_sdk=warn,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting auction ingestion");

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Running in {:?} mode", config.mode);

    let service = EcsService::new(config).await?;
    info!("ECS service initialized successfully");

    service.run().await?;
    Ok(())
}

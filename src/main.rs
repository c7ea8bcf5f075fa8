use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use food_roulette_rs::{
    create_app, init_observability,
    repositories::{DynamoDbCuisineRepository, TableManager},
    services::CuisineService,
    shutdown_observability, Config, Metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: cuisines={}, dishes={}",
        config.database.cuisines_table_name, config.database.dishes_table_name
    );

    let metrics = Arc::new(Metrics::new()?);

    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());

    if config.database.auto_create_tables {
        info!("Creating tables if missing");
        TableManager::new(dynamodb_client.clone())
            .create_all_tables(
                &config.database.cuisines_table_name,
                &config.database.dishes_table_name,
            )
            .await?;
    }

    let repository = Arc::new(
        DynamoDbCuisineRepository::new(
            dynamodb_client,
            config.database.cuisines_table_name.clone(),
            config.database.dishes_table_name.clone(),
            config.aws.region.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    let cuisine_service = Arc::new(CuisineService::new(repository).with_metrics(metrics.clone()));

    let app = create_app(cuisine_service, metrics, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

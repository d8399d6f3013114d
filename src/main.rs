use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shop_checkout::config::AppConfig;
use shop_checkout::messaging::{self, OrderEventsConsumer, RedpandaClient};
use shop_checkout::metrics::{self, HealthTargets, Metrics};
use shop_checkout::store::postgres;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shop_checkout=debug")),
        )
        .init();

    tracing::info!("Starting shop checkout service");

    let config = AppConfig::from_env()?;

    // === 1. Database ===
    tracing::info!(host = %config.database.host, db = %config.database.name, "Connecting to PostgreSQL");
    let pool = postgres::connect(&config.database).await?;
    postgres::migrate(&pool).await?;

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Broker (optional) ===
    let broker = match RedpandaClient::new(&config.kafka.bootstrap_servers()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Broker unavailable, running without order events");
            None
        }
    };

    // === 4. Metrics and health server on its own runtime ===
    let targets = HealthTargets {
        pool: pool.clone(),
        broker: broker.clone(),
    };
    let server_metrics = metrics.clone();
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start metrics runtime");
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(server_metrics, targets, metrics_port).await {
                tracing::error!(error = %e, "Metrics server error");
            }
        });
    });

    tracing::info!(
        broker = broker.is_some(),
        metrics_port,
        "Schema ready, serving metrics and health"
    );

    // === 5. order.created consumer (optional) ===
    let consumer = if config.kafka.consume_order_events && broker.is_some() {
        match OrderEventsConsumer::new(&config.kafka.bootstrap_servers(), &config.kafka.group_id) {
            Ok(consumer) => Some(tokio::spawn(
                consumer.run(messaging::shutdown_on(tokio::signal::ctrl_c())),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Order events consumer disabled");
                None
            }
        }
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    if let Some(handle) = consumer {
        messaging::join_consumer(handle).await;
    }
    pool.close().await;

    tracing::info!("Shop checkout service stopped");
    Ok(())
}

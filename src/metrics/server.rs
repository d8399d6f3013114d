use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use sqlx::PgPool;

use super::Metrics;
use crate::health::{broker_health, database_health, health_report, overall_status};
use crate::messaging::RedpandaClient;

/// What `/health` inspects on each request.
#[derive(Clone)]
pub struct HealthTargets {
    pub pool: PgPool,
    pub broker: Option<Arc<RedpandaClient>>,
}

/// Serve `/metrics` and `/health` until the server is stopped.
pub async fn start_metrics_server(
    metrics: Arc<Metrics>,
    targets: HealthTargets,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!(port, "Starting metrics server on http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(targets.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(
    metrics: web::Data<Arc<Metrics>>,
    targets: web::Data<HealthTargets>,
) -> impl Responder {
    if let Some(broker) = &targets.broker {
        metrics.set_broker_circuit_state(broker.circuit_state());
    }

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().body(e.to_string());
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(targets: web::Data<HealthTargets>) -> impl Responder {
    let ping = sqlx::query("SELECT 1")
        .execute(&targets.pool)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());

    let components = vec![
        database_health(ping),
        broker_health(targets.broker.as_ref().map(|b| b.circuit_state())),
    ];

    let report = health_report(&components);
    if overall_status(&components).is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(report)
    } else {
        HttpResponse::Ok().json(report)
    }
}

//! Readiness endpoint
//!
//! Liveness (`/health`) comes from `axum_helpers::health_router`; readiness
//! asks the product store itself so that `/ready` reflects query capability.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use domain_products::{ProductRepository, ProductService};
use serde_json::Value;

async fn ready<R: ProductRepository>(
    State(service): State<ProductService<R>>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async { service.health().await.map_err(|e| e.to_string()) }),
    )];
    run_health_checks(checks).await
}

pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/ready", get(ready::<R>))
        .with_state(service)
}

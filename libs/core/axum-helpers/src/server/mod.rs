//! Server infrastructure module.
//!
//! - Router bootstrap with OpenAPI documentation
//! - Liveness endpoint and concurrent readiness checks
//! - Graceful shutdown coordination
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router, health_router};
//! use core_config::{server::ServerConfig, app_info};
//!
//! let router = create_router::<ApiDoc>(api_routes).merge(health_router(app_info!()));
//! let (shutdown, _) = ShutdownCoordinator::new();
//! create_production_app(router, &ServerConfig::default(), shutdown, async {}).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::ShutdownCoordinator;

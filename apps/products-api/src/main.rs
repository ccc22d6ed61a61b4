//! Products API - REST server over MongoDB or an in-memory store

use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{InMemoryProductRepository, MongoProductRepository, ProductRepository, ProductService};
use observability::init_metrics;
use std::future::Future;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;

use config::{Config, StoreBackend};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    init_metrics()?;

    let (shutdown, _) = ShutdownCoordinator::new();

    match (config.store, &config.mongodb) {
        (StoreBackend::Mongodb, Some(mongo_config)) => {
            info!("Connecting to MongoDB at {}", mongo_config.redacted_url());
            let mongo_client =
                database::mongodb::connect_from_config_with_retry(mongo_config, None).await?;
            let db = mongo_client.database(mongo_config.database());
            info!(
                "Successfully connected to MongoDB database: {}",
                mongo_config.database()
            );

            let repository = MongoProductRepository::new(&db);
            api::products::init_indexes(&repository).await?;

            serve(&config, repository, shutdown, async move {
                info!("Shutting down: closing MongoDB connections");
                mongo_client.shutdown().await;
                info!("MongoDB connection closed");
            })
            .await?;
        }
        (StoreBackend::Mongodb, None) => {
            eyre::bail!("MongoDB store selected but no MongoDB configuration was loaded");
        }
        (StoreBackend::Memory, _) => {
            warn!("Using the in-memory product store; data is lost on exit");
            serve(&config, InMemoryProductRepository::new(), shutdown, async {}).await?;
        }
    }

    info!("Products API shutdown complete");
    Ok(())
}

async fn serve<R, F>(
    config: &Config,
    repository: R,
    shutdown: ShutdownCoordinator,
    cleanup: F,
) -> eyre::Result<()>
where
    R: ProductRepository + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let service = ProductService::new(repository)
        .with_deadline(config.query.timeout)
        .with_shutdown(shutdown.clone());

    let app = create_router::<openapi::ApiDoc>(api::routes(service))
        .merge(health_router(config.app));

    info!(
        store = %config.store,
        query_timeout_ms = config.query.timeout.as_millis() as u64,
        "Starting Products API on port {}",
        config.server.port
    );

    create_production_app(app, &config.server, shutdown, cleanup)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))
}

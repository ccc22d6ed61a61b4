//! Products API routes

use axum::Router;
use domain_products::{MongoProductRepository, ProductRepository, ProductService, handlers};

/// Create products router
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    handlers::router(service)
}

/// Initialize products indexes
pub async fn init_indexes(repository: &MongoProductRepository) -> eyre::Result<()> {
    repository.init_indexes().await?;
    Ok(())
}

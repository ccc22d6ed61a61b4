//! API routes module

pub mod health;
pub mod products;

use axum::{Router, middleware, routing::get};
use domain_products::{ProductRepository, ProductService};
use observability::{metrics_handler, metrics_middleware};

/// Greeting served at `/`.
pub const WELCOME: &str = "Welcome to Product API";

/// Create all API routes
pub fn routes<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/", get(|| async { WELCOME }))
        .nest("/products", products::router(service.clone()))
        .merge(health::router(service))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use domain_products::InMemoryProductRepository;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        routes(ProductService::new(InMemoryProductRepository::new()))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_returns_greeting() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WELCOME);
    }

    #[tokio::test]
    async fn test_products_are_nested() {
        let (status, body) = get("/products").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_responds() {
        let (status, _) = get("/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }
}

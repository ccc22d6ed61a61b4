use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::{cors::cors_layer_from_env, security::security_headers};
use axum::{Json, Router, middleware, routing::get};
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;

/// Path of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Wraps the application routes with documentation and cross-cutting middleware.
///
/// - OpenAPI JSON at [`OPENAPI_JSON_PATH`], viewers at `/redoc`, `/rapidoc`, `/scalar`
/// - `apis` merged at the root
/// - JSON 404 fallback
/// - Request tracing, security headers and response compression
/// - CORS only when `CORS_ALLOWED_ORIGIN` is set
///
/// Domain routers apply their own state before being passed in.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use utoipa::OpenApi;
/// use axum_helpers::server::create_router;
///
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new()
///     .nest("/products", products_router)
///     .with_state(state);
///
/// let router = create_router::<ApiDoc>(api_routes);
/// ```
pub fn create_router<T>(apis: Router) -> Router
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};

    let router = Router::new()
        .route(OPENAPI_JSON_PATH, get(|| async { Json(T::openapi()) }))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new(OPENAPI_JSON_PATH).path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .merge(apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers));

    let router = match cors_layer_from_env() {
        Some(cors) => {
            info!("CORS enabled");
            router.layer(cors)
        }
        None => router,
    };

    router.layer(CompressionLayer::new())
}

/// Serves `router` until `shutdown` fires, then runs `cleanup`.
///
/// SIGINT/SIGTERM trigger `shutdown`; anything holding a clone of the
/// coordinator observes the same event. In-flight requests drain first,
/// after which `cleanup` gets `server_config.shutdown_timeout` to finish.
///
/// # Example
/// ```ignore
/// let (shutdown, _) = ShutdownCoordinator::new();
/// let client = client.clone();
/// create_production_app(router, &config, shutdown, async move {
///     client.shutdown().await;
/// })
/// .await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown: ShutdownCoordinator,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let drain = shutdown.clone();
    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { drain.cancelled().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // Server error path: make sure subscribers still see shutdown
    shutdown.shutdown();
    signal_task.abort();

    let timeout = server_config.shutdown_timeout;
    info!("Starting cleanup tasks (timeout: {:?})", timeout);
    match tokio::time::timeout(timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => warn!("Cleanup exceeded timeout of {:?}, forcing shutdown", timeout),
    }

    serve_result
}

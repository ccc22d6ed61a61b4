use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Environment variable naming the single allowed browser origin.
pub const CORS_ORIGIN_ENV: &str = "CORS_ALLOWED_ORIGIN";

/// CORS layer for one allowed origin.
///
/// Allows the methods the products API serves plus `Content-Type`/`Accept`
/// headers, cached for one hour.
pub fn create_cors_layer(allowed_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Reads [`CORS_ORIGIN_ENV`]; `None` when unset or not a valid header value.
pub fn cors_layer_from_env() -> Option<CorsLayer> {
    let origin = std::env::var(CORS_ORIGIN_ENV).ok()?;
    match HeaderValue::from_str(&origin) {
        Ok(value) => Some(create_cors_layer(value)),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_unset() {
        temp_env::with_var_unset(CORS_ORIGIN_ENV, || {
            assert!(cors_layer_from_env().is_none());
        });
    }

    #[test]
    fn test_cors_set() {
        temp_env::with_var(CORS_ORIGIN_ENV, Some("http://localhost:3000"), || {
            assert!(cors_layer_from_env().is_some());
        });
    }

    #[test]
    fn test_cors_invalid_origin_is_ignored() {
        temp_env::with_var(CORS_ORIGIN_ENV, Some("bad\norigin"), || {
            assert!(cors_layer_from_env().is_none());
        });
    }
}

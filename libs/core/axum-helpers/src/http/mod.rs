//! HTTP middleware applied by [`create_router`](crate::server::create_router).
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(origin));
//! ```

pub mod cors;
pub mod security;

pub use cors::{create_cors_layer, cors_layer_from_env};
pub use security::security_headers;

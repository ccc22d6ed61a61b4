//! Custom extractors for Axum handlers.
//!
//! Both extractors reject with the same [`ErrorResponse`](crate::errors::ErrorResponse)
//! body the rest of the API uses.

pub mod uuid_path;
pub mod validated_json;

pub use uuid_path::UuidPath;
pub use validated_json::ValidatedJson;

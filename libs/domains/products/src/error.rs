use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::mongodb::{StoreFailure, classify};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::query::QueryError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Outcome label for query metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProductError::NotFound(_) => "not_found",
            ProductError::Validation(_) => "invalid_input",
            ProductError::InvalidQuery(_) => "invalid_query",
            ProductError::StoreUnavailable(_) => "unavailable",
            ProductError::Cancelled => "cancelled",
            ProductError::Timeout(_) => "timeout",
            ProductError::Database(_) | ProductError::Internal(_) => "error",
        }
    }
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            ProductError::Validation(errors) => AppError::ValidationError(errors),
            ProductError::InvalidQuery(err) => AppError::InvalidQuery(err.to_string()),
            ProductError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            ProductError::Cancelled => {
                AppError::Cancelled("Request cancelled by server shutdown".to_string())
            }
            ProductError::Timeout(deadline) => {
                AppError::GatewayTimeout(format!("Query exceeded {}ms", deadline.as_millis()))
            }
            ProductError::Database(msg) => AppError::Database(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        match classify(&err) {
            StoreFailure::Unavailable => ProductError::StoreUnavailable(err.to_string()),
            StoreFailure::InvalidRequest => ProductError::InvalidQuery(QueryError::InvalidValue {
                field: "filter".to_string(),
                reason: err.to_string(),
            }),
            StoreFailure::Other => ProductError::Database(err.to_string()),
        }
    }
}

impl From<mongodb::bson::de::Error> for ProductError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        ProductError::Internal(format!("stored product could not be decoded: {err}"))
    }
}

impl From<mongodb::bson::ser::Error> for ProductError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProductError::Internal(format!("product could not be encoded: {err}"))
    }
}

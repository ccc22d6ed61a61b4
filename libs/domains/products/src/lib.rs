//! Products Domain
//!
//! Product records stored in MongoDB, plus a query translator that turns
//! untrusted filter, sort and projection input into store queries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, deadlines, cancellation, metrics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │ Repository  │ ◄── │    Query    │  ← Filter/Sort/Projection AST
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//! };
//! use mongodb::Client;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//!
//! let repository = MongoProductRepository::new(&db);
//! repository.init_indexes().await?;
//! let service = ProductService::new(repository).with_deadline(Duration::from_secs(2));
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryProductRepository;
pub use models::{
    AdvancedResponse, CountResponse, CreateProduct, ListParams, MessageResponse, Product,
    ProductView, QueryRequest, UpdateProduct,
};
pub use mongodb::MongoProductRepository;
pub use query::{Filter, FindQuery, QueryError};
pub use repository::ProductRepository;
pub use service::{DEFAULT_QUERY_TIMEOUT, ProductService};

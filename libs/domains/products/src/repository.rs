use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductView, UpdateProduct};
use crate::query::{Filter, FindQuery};

/// Repository trait for Product persistence
///
/// Queries arrive already validated and translated into the [`crate::query`]
/// AST; implementations only decide how to execute them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a fully built product
    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Matching products, ordered, projected and paginated per `query`
    async fn find(&self, query: FindQuery) -> ProductResult<Vec<ProductView>>;

    /// Get a product by ID
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Apply a partial update atomically; `None` when no product has `id`
    async fn update_by_id(&self, id: Uuid, update: UpdateProduct)
    -> ProductResult<Option<Product>>;

    /// Delete a product by ID; `false` when nothing was removed
    async fn delete_by_id(&self, id: Uuid) -> ProductResult<bool>;

    /// Count products matching a filter
    async fn count(&self, filter: Filter) -> ProductResult<u64>;

    /// Check that the backing store answers
    async fn health(&self) -> ProductResult<()>;
}

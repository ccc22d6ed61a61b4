//! In-memory implementation of ProductRepository.
//!
//! Documents are kept in their stored BSON form so filters, sorts and
//! projections run through the same evaluator the query module tests.

use async_trait::async_trait;
use mongodb::bson::{self, Document};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductView, UpdateProduct};
use crate::query::{Filter, FindQuery, ProductField};
use crate::repository::ProductRepository;

#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with `products`, in order.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> ProductResult<Self> {
        let documents = products
            .into_iter()
            .map(|p| bson::to_document(&p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            documents: Arc::new(RwLock::new(documents)),
        })
    }

    fn position(documents: &[Document], id: Uuid) -> Option<usize> {
        let id = id.hyphenated().to_string();
        documents
            .iter()
            .position(|d| d.get_str(ProductField::Id.as_str()).ok() == Some(id.as_str()))
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        let document = bson::to_document(&product)?;
        self.documents.write().await.push(document);
        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, query))]
    async fn find(&self, query: FindQuery) -> ProductResult<Vec<ProductView>> {
        let documents = self.documents.read().await;

        let mut matched: Vec<&Document> = documents
            .iter()
            .filter(|d| query.filter.matches(d))
            .collect();
        matched.sort_by(|a, b| query.sort.compare(a, b));

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        matched
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|d| Ok(bson::from_document(query.projection.apply(d))?))
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let documents = self.documents.read().await;
        Self::position(&documents, id)
            .map(|i| Ok(bson::from_document(documents[i].clone())?))
            .transpose()
    }

    #[instrument(skip(self, update))]
    async fn update_by_id(
        &self,
        id: Uuid,
        update: UpdateProduct,
    ) -> ProductResult<Option<Product>> {
        let mut documents = self.documents.write().await;
        let Some(index) = Self::position(&documents, id) else {
            return Ok(None);
        };

        let mut product: Product = bson::from_document(documents[index].clone())?;
        product.apply_update(update);
        documents[index] = bson::to_document(&product)?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(Some(product))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> ProductResult<bool> {
        let mut documents = self.documents.write().await;
        match Self::position(&documents, id) {
            Some(index) => {
                documents.remove(index);
                tracing::info!(product_id = %id, "Product deleted successfully");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: Filter) -> ProductResult<u64> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn health(&self) -> ProductResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProduct;
    use crate::query::{Projection, SortSpec, presets};

    fn product(title: &str, price: f64) -> Product {
        Product::new(CreateProduct {
            title: title.to_string(),
            price,
            description: None,
        })
    }

    fn fixture() -> InMemoryProductRepository {
        InMemoryProductRepository::with_products([
            product("iPhone", 150.0),
            product("Laptop Pro", 800.0),
            product("Tablet X", 300.0),
        ])
        .unwrap()
    }

    fn titles(views: &[ProductView]) -> Vec<&str> {
        views.iter().filter_map(|v| v.title.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_insert_then_find_by_id() {
        let repo = InMemoryProductRepository::new();
        let created = repo.insert(product("iPhone", 150.0)).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(repo.find_by_id(Uuid::now_v7()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_default_find_is_insertion_order() {
        let views = fixture().find(FindQuery::default()).await.unwrap();
        assert_eq!(titles(&views), vec!["iPhone", "Laptop Pro", "Tablet X"]);
        assert!(views.iter().all(|v| v.id.is_some() && v.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_find_sorts_projects_and_paginates() {
        let query = FindQuery::default()
            .sort(SortSpec::parse("-price").unwrap())
            .projection(Projection::parse("title,price").unwrap())
            .skip(1)
            .limit(1)
            .unwrap();

        let views = fixture().find(query).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].title.as_deref(), Some("Tablet X"));
        assert_eq!(views[0].id, None);
        assert_eq!(views[0].created_at, None);
    }

    #[tokio::test]
    async fn test_presets() {
        let repo = fixture();
        let run = |filter: Filter| {
            let repo = repo.clone();
            async move { repo.find(FindQuery::new(filter)).await.unwrap() }
        };

        assert_eq!(titles(&run(presets::phones_over_100().unwrap()).await), vec!["iPhone"]);
        assert_eq!(
            titles(&run(presets::premium_or_laptop().unwrap()).await),
            vec!["Laptop Pro"]
        );
        assert_eq!(
            titles(&run(presets::not_premium()).await),
            vec!["iPhone", "Tablet X"]
        );
        assert_eq!(
            titles(&run(presets::neither_premium_nor_tablet().unwrap()).await),
            vec!["iPhone"]
        );
    }

    #[tokio::test]
    async fn test_count_matches_find() {
        let repo = fixture();
        let filter = presets::not_premium();
        let count = repo.count(filter.clone()).await.unwrap();
        let found = repo.find(FindQuery::new(filter)).await.unwrap();
        assert_eq!(count, found.len() as u64);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = fixture();
        let iphone = repo.find(FindQuery::default()).await.unwrap()[0].id.unwrap();

        let updated = repo
            .update_by_id(
                iphone,
                UpdateProduct {
                    description: Some(Some("refurbished".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("refurbished"));
        assert_eq!(updated.price, 150.0);

        assert!(repo.delete_by_id(iphone).await.unwrap());
        assert!(!repo.delete_by_id(iphone).await.unwrap());
        assert_eq!(repo.find_by_id(iphone).await.unwrap(), None);
        assert_eq!(
            repo.update_by_id(iphone, UpdateProduct::default()).await.unwrap(),
            None
        );
    }
}

//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use database::mongodb::ping;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductView, UpdateProduct};
use crate::query::{Filter, FindQuery, ProductField};
use crate::repository::ProductRepository;

pub const COLLECTION_NAME: &str = "products";

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    db: Database,
    collection: Collection<Product>,
    views: Collection<ProductView>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    /// Use a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        let views = collection.clone_with_type::<ProductView>();
        Self {
            db: db.clone(),
            collection,
            views,
        }
    }

    /// Create the indexes used by the sort and filter routes
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = [
            (ProductField::Price, "idx_price"),
            (ProductField::Title, "idx_title"),
            (ProductField::CreatedAt, "idx_created_at"),
        ]
        .into_iter()
        .map(|(field, name)| {
            IndexModel::builder()
                .keys(doc! { field.as_str(): 1 })
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build()
        });

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { ProductField::Id.as_str(): id.hyphenated().to_string() }
    }

    /// `$set` for present fields, `$unset` for an explicitly cleared description
    fn update_document(update: &UpdateProduct) -> Document {
        let mut set = Document::new();
        let mut unset = Document::new();

        if let Some(ref title) = update.title {
            set.insert(ProductField::Title.as_str(), title);
        }
        if let Some(price) = update.price {
            set.insert(ProductField::Price.as_str(), price);
        }
        match update.description {
            Some(Some(ref description)) => {
                set.insert(ProductField::Description.as_str(), description);
            }
            Some(None) => {
                unset.insert(ProductField::Description.as_str(), "");
            }
            None => {}
        }

        let mut doc = Document::new();
        if !set.is_empty() {
            doc.insert("$set", set);
        }
        if !unset.is_empty() {
            doc.insert("$unset", unset);
        }
        doc
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        self.collection.insert_one(&product).await?;
        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, query))]
    async fn find(&self, query: FindQuery) -> ProductResult<Vec<ProductView>> {
        let filter = query.filter.to_document();
        tracing::debug!(filter = %filter, "Executing product query");

        let mut find = self
            .views
            .find(filter)
            .sort(query.sort.to_document())
            .skip(query.skip);
        if let Some(projection) = query.projection.to_document() {
            find = find.projection(projection);
        }
        if let Some(limit) = query.limit {
            // MAX_LIMIT keeps this well inside i64
            find = find.limit(limit as i64);
        }

        let products: Vec<ProductView> = find.await?.try_collect().await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self, update))]
    async fn update_by_id(
        &self,
        id: Uuid,
        update: UpdateProduct,
    ) -> ProductResult<Option<Product>> {
        let changes = Self::update_document(&update);
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let product = self
            .collection
            .find_one_and_update(Self::id_filter(id), changes)
            .return_document(ReturnDocument::After)
            .await?;

        if product.is_some() {
            tracing::info!(product_id = %id, "Product updated successfully");
        }
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> ProductResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        let deleted = result.deleted_count > 0;
        if deleted {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(deleted)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: Filter) -> ProductResult<u64> {
        let count = self.collection.count_documents(filter.to_document()).await?;
        Ok(count)
    }

    async fn health(&self) -> ProductResult<()> {
        ping(&self.db)
            .await
            .map_err(|e| ProductError::StoreUnavailable(e.to_string()))
    }
}

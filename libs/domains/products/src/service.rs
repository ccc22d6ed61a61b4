//! Product Service - Business logic layer

use axum_helpers::ShutdownCoordinator;
use observability::{QueryMetrics, QueryTimer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    AdvancedResponse, CreateProduct, ListParams, Product, ProductView, QueryRequest, UpdateProduct,
};
use crate::query::{
    Field, Filter, FindQuery, ProductField, Projection, QueryResult, SortDirection, SortSpec,
    presets,
};
use crate::repository::ProductRepository;

/// Deadline applied to every store call unless overridden.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Product service providing business logic operations
///
/// Every repository call runs under a deadline and, when a
/// [`ShutdownCoordinator`] is attached, is abandoned as soon as shutdown
/// starts.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    deadline: Duration,
    shutdown: Option<ShutdownCoordinator>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            deadline: DEFAULT_QUERY_TIMEOUT,
            shutdown: None,
        }
    }

    /// Use `deadline` for every operation of the returned service.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Cancel in-flight operations when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: ShutdownCoordinator) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one store operation with deadline, cancellation and metrics.
    async fn run<T, F>(&self, operation: &'static str, future: F) -> ProductResult<T>
    where
        F: Future<Output = ProductResult<T>>,
    {
        let timer = QueryTimer::start(operation);
        let result = self.guarded(future).await;
        timer.finish(match &result {
            Ok(_) => "ok",
            Err(err) => err.outcome(),
        });
        if let Err(ref err) = result {
            if matches!(
                err,
                ProductError::StoreUnavailable(_) | ProductError::Timeout(_)
            ) {
                tracing::warn!(operation, error = %err, "Product store operation failed");
            }
        }
        result
    }

    async fn guarded<T, F>(&self, future: F) -> ProductResult<T>
    where
        F: Future<Output = ProductResult<T>>,
    {
        let shutdown = self.shutdown.as_ref();
        if shutdown.is_some_and(ShutdownCoordinator::is_shutting_down) {
            return Err(ProductError::Cancelled);
        }

        let cancelled = async {
            match shutdown {
                Some(shutdown) => shutdown.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = tokio::time::timeout(self.deadline, future) => {
                result.unwrap_or(Err(ProductError::Timeout(self.deadline)))
            }
            () = cancelled => Err(ProductError::Cancelled),
        }
    }

    /// Surface a translation failure, counting it by reason.
    fn translate<T>(&self, result: QueryResult<T>) -> ProductResult<T> {
        result.map_err(|err| {
            QueryMetrics::record_rejection(err.reason());
            tracing::info!(reason = err.reason(), error = %err, "Rejected product query");
            ProductError::InvalidQuery(err)
        })
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate()?;
        let product = Product::new(input);
        self.run("insert", self.repository.insert(product)).await
    }

    /// Execute an already-built query
    #[instrument(skip(self, query))]
    pub async fn find_products(&self, query: FindQuery) -> ProductResult<Vec<ProductView>> {
        let products = self.run("find", self.repository.find(query)).await?;
        QueryMetrics::record_result_size("find", products.len());
        Ok(products)
    }

    /// `GET /products` with string-encoded query parameters
    #[instrument(skip(self, params))]
    pub async fn list_products(&self, params: ListParams) -> ProductResult<Vec<ProductView>> {
        let query = self.translate(
            params
                .filter
                .as_deref()
                .map(Filter::parse_str)
                .transpose()
                .and_then(|filter| {
                    FindQuery::from_parts(
                        filter,
                        params.sort.as_deref(),
                        params.fields.as_deref(),
                        params.skip,
                        params.limit,
                    )
                }),
        )?;
        self.find_products(query).await
    }

    /// `POST /products/query` with the filter as a JSON object
    #[instrument(skip(self, request))]
    pub async fn query_products(&self, request: QueryRequest) -> ProductResult<Vec<ProductView>> {
        let query = self.translate(
            request
                .filter
                .as_ref()
                .map(Filter::from_json)
                .transpose()
                .and_then(|filter| {
                    FindQuery::from_parts(
                        filter,
                        request.sort.as_deref(),
                        request.fields.as_deref(),
                        request.skip,
                        request.limit,
                    )
                }),
        )?;
        self.find_products(query).await
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.run("find_by_id", self.repository.find_by_id(id))
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Zero or one projected product; a missing id is an empty result.
    #[instrument(skip(self, projection))]
    pub async fn find_many_by_id(
        &self,
        id: Uuid,
        projection: Projection,
    ) -> ProductResult<Vec<ProductView>> {
        let filter = Field::new(ProductField::Id)
            .eq(id.hyphenated().to_string())
            .into();
        self.find_products(FindQuery::new(filter).projection(projection))
            .await
    }

    /// Update an existing product
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        input.validate()?;
        self.run("update", self.repository.update_by_id(id, input))
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        if self.run("delete", self.repository.delete_by_id(id)).await? {
            Ok(())
        } else {
            Err(ProductError::NotFound(id))
        }
    }

    /// Count products matching a filter
    #[instrument(skip(self, filter))]
    pub async fn count_products(&self, filter: Filter) -> ProductResult<u64> {
        self.run("count", self.repository.count(filter)).await
    }

    /// Count with a string-encoded filter; `None` counts everything
    pub async fn count_matching(&self, filter: Option<&str>) -> ProductResult<u64> {
        let filter = self.translate(filter.map(Filter::parse_str).transpose())?;
        self.count_products(filter.unwrap_or_default()).await
    }

    /// All products by price; `order` defaults to ascending
    pub async fn sorted_by_price(&self, order: Option<&str>) -> ProductResult<Vec<ProductView>> {
        let sort = price_sort(order);
        self.find_products(FindQuery::default().sort(sort)).await
    }

    /// All products with only `title` and `price`
    pub async fn select_title_price(&self) -> ProductResult<Vec<ProductView>> {
        self.find_products(FindQuery::default().projection(title_price())).await
    }

    /// Total count plus the price-sorted `title`/`price` listing
    pub async fn advanced(&self, order: Option<&str>) -> ProductResult<AdvancedResponse> {
        let sort = price_sort(order);
        let query = FindQuery::default().sort(sort).projection(title_price());
        let (total, products) = tokio::try_join!(
            self.count_products(Filter::MatchAll),
            self.find_products(query)
        )?;
        Ok(AdvancedResponse { total, products })
    }

    pub async fn phones_over_100(&self) -> ProductResult<Vec<ProductView>> {
        let filter = self.translate(presets::phones_over_100())?;
        self.find_products(FindQuery::new(filter)).await
    }

    pub async fn premium_or_laptop(&self) -> ProductResult<Vec<ProductView>> {
        let filter = self.translate(presets::premium_or_laptop())?;
        self.find_products(FindQuery::new(filter)).await
    }

    pub async fn not_premium(&self) -> ProductResult<Vec<ProductView>> {
        self.find_products(FindQuery::new(presets::not_premium()))
            .await
    }

    pub async fn neither_premium_nor_tablet(&self) -> ProductResult<Vec<ProductView>> {
        let filter = self.translate(presets::neither_premium_nor_tablet())?;
        self.find_products(FindQuery::new(filter)).await
    }

    /// Readiness probe against the backing store
    pub async fn health(&self) -> ProductResult<()> {
        self.run("health", self.repository.health()).await
    }

}

/// Price ordering for the `order` parameter: descending only when it reads
/// as descending, ascending for anything else.
fn price_sort(order: Option<&str>) -> SortSpec {
    let direction = match order.map(str::parse::<SortDirection>) {
        Some(Ok(SortDirection::Descending)) => SortDirection::Descending,
        _ => SortDirection::Ascending,
    };
    SortSpec::by(ProductField::Price, direction)
}

fn title_price() -> Projection {
    Projection::include([ProductField::Title, ProductField::Price])
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            deadline: self.deadline,
            shutdown: self.shutdown.clone(),
        }
    }
}

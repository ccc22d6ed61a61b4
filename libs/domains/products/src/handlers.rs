//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestQueryResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        GatewayTimeoutResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    AdvancedResponse, CountResponse, CreateProduct, FilterParams, ListParams, MessageResponse,
    OrderParams, Product, ProductView, QueryRequest, UpdateProduct,
};
use crate::query::{ProductField, Projection};
use crate::repository::ProductRepository;
use crate::service::ProductService;

type SharedService<R> = State<Arc<ProductService<R>>>;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        query_products,
        count_products,
        sort_by_price,
        select_title_price,
        advanced,
        and_preset,
        or_preset,
        not_preset,
        nor_preset,
        get_product,
        get_product_summary,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            Product, ProductView, CreateProduct, UpdateProduct, ListParams, QueryRequest,
            CountResponse, AdvancedResponse, MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            BadRequestQueryResponse,
            ServiceUnavailableResponse,
            GatewayTimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product management and query endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/query", post(query_products))
        .route("/count", get(count_products))
        .route("/sort", get(sort_by_price))
        .route("/select", get(select_title_price))
        .route("/advanced", get(advanced))
        .route("/and", get(and_preset))
        .route("/or", get(or_preset))
        .route("/not", get(not_preset))
        .route("/nor", get(nor_preset))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/summary", get(get_product_summary))
        .with_state(shared_service)
}

/// List products, optionally filtered, sorted, projected and paginated
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListParams),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): SharedService<R>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let Query(params) = params?;
    let products = service.list_products(params).await?;
    Ok(Json(products))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): SharedService<R>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Run a structured query given as a JSON body
#[utoipa::path(
    post,
    path = "/query",
    tag = "Products",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn query_products<R: ProductRepository>(
    State(service): SharedService<R>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let Json(request) = request?;
    let products = service.query_products(request).await?;
    Ok(Json(products))
}

/// Count products, optionally filtered
#[utoipa::path(
    get,
    path = "/count",
    tag = "Products",
    params(FilterParams),
    responses(
        (status = 200, description = "Number of matching products", body = CountResponse),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_products<R: ProductRepository>(
    State(service): SharedService<R>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<CountResponse>, AppError> {
    let Query(params) = params?;
    let total_products = service.count_matching(params.filter.as_deref()).await?;
    Ok(Json(CountResponse { total_products }))
}

/// All products sorted by price
#[utoipa::path(
    get,
    path = "/sort",
    tag = "Products",
    params(OrderParams),
    responses(
        (status = 200, description = "Products sorted by price", body = Vec<ProductView>),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn sort_by_price<R: ProductRepository>(
    State(service): SharedService<R>,
    params: Result<Query<OrderParams>, QueryRejection>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let Query(params) = params?;
    let products = service.sorted_by_price(params.order.as_deref()).await?;
    Ok(Json(products))
}

/// Title and price of every product
#[utoipa::path(
    get,
    path = "/select",
    tag = "Products",
    responses(
        (status = 200, description = "Projected products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn select_title_price<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<ProductView>>> {
    let products = service.select_title_price().await?;
    Ok(Json(products))
}

/// Total count with the price-sorted title/price listing
#[utoipa::path(
    get,
    path = "/advanced",
    tag = "Products",
    params(OrderParams),
    responses(
        (status = 200, description = "Count and sorted projection", body = AdvancedResponse),
        (status = 400, response = BadRequestQueryResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn advanced<R: ProductRepository>(
    State(service): SharedService<R>,
    params: Result<Query<OrderParams>, QueryRejection>,
) -> Result<Json<AdvancedResponse>, AppError> {
    let Query(params) = params?;
    let response = service.advanced(params.order.as_deref()).await?;
    Ok(Json(response))
}

/// Products priced above 100 whose title contains "phone" (any case)
#[utoipa::path(
    get,
    path = "/and",
    tag = "Products",
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn and_preset<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.phones_over_100().await?))
}

/// Products priced above 500 or whose title contains "laptop" (any case)
#[utoipa::path(
    get,
    path = "/or",
    tag = "Products",
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn or_preset<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.premium_or_laptop().await?))
}

/// Products not priced above 500
#[utoipa::path(
    get,
    path = "/not",
    tag = "Products",
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn not_preset<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.not_premium().await?))
}

/// Products neither priced above 500 nor titled like "tablet"
#[utoipa::path(
    get,
    path = "/nor",
    tag = "Products",
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductView>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn nor_preset<R: ProductRepository>(
    State(service): SharedService<R>,
) -> ProductResult<Json<Vec<ProductView>>> {
    Ok(Json(service.neither_premium_nor_tablet().await?))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Product>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Title and price of one product as an array; empty when the id is unknown
#[utoipa::path(
    get,
    path = "/{id}/summary",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Zero or one projected product", body = Vec<ProductView>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product_summary<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Vec<ProductView>>> {
    let projection = Projection::include([ProductField::Title, ProductField::Price]);
    let products = service.find_many_by_id(id, projection).await?;
    Ok(Json(products))
}

/// Update an existing product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    let product = service.update_product(id, input).await?;
    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<MessageResponse>> {
    service.delete_product(id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

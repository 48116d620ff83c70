use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::PaginationParams;
use crate::services::products::{
    CreateProductRequest, PriceQuoteResponse, ProductListResponse, ProductResponse,
    UpdateProductRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/by-code/:code", get(get_product_by_code))
        .route("/:id/price-quote", get(quote_price))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductFilterQuery {
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    /// Term matched against name, code, and brand.
    pub search: Option<String>,
    /// Include deactivated products (back office only).
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PriceQuoteQuery {
    pub quantity: i32,
}

/// List catalog products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Paginated catalog listing with category, search, and active-state filters",
    params(PaginationParams, ProductFilterQuery),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<ProductListResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProductFilterQuery>,
) -> Result<Json<ApiResponse<ProductListResponse>>, ServiceError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let result = state
        .services
        .products
        .list_products(
            page,
            per_page,
            filter.category_id,
            filter.search,
            filter.include_inactive,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate product code", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    let product = state.services.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Get one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Get one product by its catalog code
#[utoipa::path(
    get,
    path = "/api/v1/products/by-code/{code}",
    summary = "Get product by code",
    params(("code" = String, Path, description = "Catalog code / SKU")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.get_product_by_code(&code).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    summary = "Update product",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate product code", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.update_product(id, request).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    summary = "Delete product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve the tier price for a quantity
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/price-quote",
    summary = "Quote a price",
    description = "Resolves retail vs wholesale pricing for the requested quantity",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        PriceQuoteQuery,
    ),
    responses(
        (status = 200, description = "Price resolved", body = ApiResponse<PriceQuoteResponse>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn quote_price(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PriceQuoteQuery>,
) -> Result<Json<ApiResponse<PriceQuoteResponse>>, ServiceError> {
    let quote = state
        .services
        .products
        .quote_price(id, query.quantity)
        .await?;
    Ok(Json(ApiResponse::success(quote)))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::services::carts::{
    AddCartItemRequest, CartResponse, CheckoutRequest, CreateCartRequest, UpdateCartItemRequest,
};
use crate::services::orders::OrderResponse;
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/:id", get(get_cart))
        .route("/by-session/:session_id", get(get_cart_by_session))
        .route("/:id/items", post(add_item))
        .route(
            "/:id/items/:item_id",
            put(update_item).delete(remove_item),
        )
        .route("/:id/clear", post(clear_cart))
        .route("/:id/checkout", post(checkout))
}

/// Open a new cart
#[utoipa::path(
    post,
    path = "/api/v1/carts",
    summary = "Create cart",
    request_body = CreateCartRequest,
    responses(
        (status = 201, description = "Cart created", body = ApiResponse<CartResponse>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_cart(
    State(state): State<AppState>,
    Json(request): Json<CreateCartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartResponse>>), ServiceError> {
    let cart = state.services.carts.create_cart(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(cart))))
}

/// Get a cart with its lines
#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    summary = "Get cart",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart retrieved", body = ApiResponse<CartResponse>),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.get_cart(id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Get the newest cart for a storefront session
#[utoipa::path(
    get,
    path = "/api/v1/carts/by-session/{session_id}",
    summary = "Get cart by session",
    params(("session_id" = String, Path, description = "Storefront session id")),
    responses(
        (status = 200, description = "Cart retrieved", body = ApiResponse<CartResponse>),
        (status = 404, description = "No cart for this session", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_cart_by_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.find_by_session(&session_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Add a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    summary = "Add cart item",
    description = "Adds a product, merging into an existing line; the merged quantity decides the price tier",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<CartResponse>),
        (status = 400, description = "Product unavailable or quantity invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart or product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCartItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.add_item(id, request).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Change a cart line's quantity
#[utoipa::path(
    put,
    path = "/api/v1/carts/{id}/items/{item_id}",
    summary = "Update cart item",
    description = "Sets the line quantity and re-resolves the tier price",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart line id"),
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<CartResponse>),
        (status = 400, description = "Quantity invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart or line not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.update_item(id, item_id, request).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Remove a cart line
#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}/items/{item_id}",
    summary = "Remove cart item",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart line id"),
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<CartResponse>),
        (status = 404, description = "Cart or line not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.remove_item(id, item_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Empty the cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/clear",
    summary = "Clear cart",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<CartResponse>),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let cart = state.services.carts.clear_cart(id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// Convert the cart into an order
#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/checkout",
    summary = "Checkout cart",
    description = "Creates a pending order from the cart's lines at their stored prices, then discards the cart",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Cart empty or buyer details invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order = state.services.carts.checkout(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::handlers::common::PaginationParams;
use crate::services::orders::{
    CancelOrderRequest, CreateOrderRequest, OrderListResponse, OrderResponse,
    ReplaceOrderItemsRequest,
};
use crate::services::whatsapp::WhatsAppLinkResponse;
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/items", put(replace_items))
        .route("/:id/advance", post(advance_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/whatsapp-link", get(whatsapp_link))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderFilterQuery {
    /// Raw status key; unknown legacy keys are valid filters.
    pub status: Option<String>,
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Paginated order listing, newest first, optionally filtered by status key",
    params(PaginationParams, OrderFilterQuery),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<OrderListResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<OrderFilterQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let result = state
        .services
        .orders
        .list_orders(page, per_page, filter.status)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create an order directly (back office)
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Creates a pending order from explicit line items; prices are stored as submitted snapshots",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Get one order with its items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Replace the order's line items
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/items",
    summary = "Replace order items",
    description = "Swaps the whole line set and recomputes the total; only pending or in-process orders accept edits",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ReplaceOrderItemsRequest,
    responses(
        (status = 200, description = "Items replaced", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order status does not allow edits", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn replace_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplaceOrderItemsRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.replace_items(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Advance the order to its next status
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/advance",
    summary = "Advance order status",
    description = "Moves one step along pendiente, enproceso, enviado, entregado_pp, entregado_pr",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order is terminal or its status is unrecognized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn advance_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.advance_status(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Cancel an order with a reason
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    summary = "Cancel order",
    description = "Allowed from pendiente or enproceso; records the reason and cancellation time, irreversibly",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order status does not allow cancellation", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.orders.cancel_order(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Permanently delete an order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    description = "Irreversible admin removal of the order and its items",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// WhatsApp link for the order summary
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/whatsapp-link",
    summary = "Build order WhatsApp link",
    description = "Prefilled chat link to the order's client with the order summary message",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Link built", body = ApiResponse<WhatsAppLinkResponse>),
        (status = 400, description = "Order has no client phone", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn whatsapp_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WhatsAppLinkResponse>>, ServiceError> {
    let link = state.services.orders.whatsapp_link(id).await?;
    Ok(Json(ApiResponse::success(link)))
}

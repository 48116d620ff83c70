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
use crate::services::orders::OrderResponse;
use crate::services::quotations::{
    CreateQuotationRequest, QuotationListResponse, QuotationResponse,
    ReplaceQuotationItemsRequest, ResolveQuotationRequest, UpdateQuotationRequest,
};
use crate::services::whatsapp::WhatsAppLinkResponse;
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotations).post(create_quotation))
        .route(
            "/:id",
            get(get_quotation)
                .put(update_quotation)
                .delete(delete_quotation),
        )
        .route("/:id/items", put(replace_items))
        .route("/:id/resolve", post(resolve_quotation))
        .route("/:id/convert", post(convert_to_order))
        .route("/:id/whatsapp-link", get(whatsapp_link))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct QuotationFilterQuery {
    /// Raw status key; unknown legacy keys are valid filters.
    pub status: Option<String>,
}

/// List quotations
#[utoipa::path(
    get,
    path = "/api/v1/quotations",
    summary = "List quotations",
    description = "Paginated quotation listing, newest first, optionally filtered by status key",
    params(PaginationParams, QuotationFilterQuery),
    responses(
        (status = 200, description = "Quotations retrieved", body = ApiResponse<QuotationListResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<QuotationFilterQuery>,
) -> Result<Json<ApiResponse<QuotationListResponse>>, ServiceError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let result = state
        .services
        .quotations
        .list_quotations(page, per_page, filter.status)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create a quotation
#[utoipa::path(
    post,
    path = "/api/v1/quotations",
    summary = "Create quotation",
    description = "Creates a pending quotation; each line's sale price is derived from its cost and margin",
    request_body = CreateQuotationRequest,
    responses(
        (status = 201, description = "Quotation created", body = ApiResponse<QuotationResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(request): Json<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<QuotationResponse>>), ServiceError> {
    let quotation = state.services.quotations.create_quotation(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(quotation))))
}

/// Get one quotation with its items
#[utoipa::path(
    get,
    path = "/api/v1/quotations/{id}",
    summary = "Get quotation",
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Quotation retrieved", body = ApiResponse<QuotationResponse>),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<QuotationResponse>>, ServiceError> {
    let quotation = state.services.quotations.get_quotation(id).await?;
    Ok(Json(ApiResponse::success(quotation)))
}

/// Update quotation header fields
#[utoipa::path(
    put,
    path = "/api/v1/quotations/{id}",
    summary = "Update quotation",
    description = "Edits client and validity fields; rejected once the quotation generated an order",
    params(("id" = Uuid, Path, description = "Quotation id")),
    request_body = UpdateQuotationRequest,
    responses(
        (status = 200, description = "Quotation updated", body = ApiResponse<QuotationResponse>),
        (status = 400, description = "Quotation is frozen", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQuotationRequest>,
) -> Result<Json<ApiResponse<QuotationResponse>>, ServiceError> {
    let quotation = state
        .services
        .quotations
        .update_details(id, request)
        .await?;
    Ok(Json(ApiResponse::success(quotation)))
}

/// Replace the quotation's line items
#[utoipa::path(
    put,
    path = "/api/v1/quotations/{id}/items",
    summary = "Replace quotation items",
    description = "Swaps the whole line set, re-deriving sale prices; rejected once the quotation generated an order",
    params(("id" = Uuid, Path, description = "Quotation id")),
    request_body = ReplaceQuotationItemsRequest,
    responses(
        (status = 200, description = "Items replaced", body = ApiResponse<QuotationResponse>),
        (status = 400, description = "Quotation is frozen", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn replace_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplaceQuotationItemsRequest>,
) -> Result<Json<ApiResponse<QuotationResponse>>, ServiceError> {
    let quotation = state.services.quotations.replace_items(id, request).await?;
    Ok(Json(ApiResponse::success(quotation)))
}

/// Resolve a pending quotation
#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/resolve",
    summary = "Resolve quotation",
    description = "Marks a pending quotation aceptada, rechazada, or anulada",
    params(("id" = Uuid, Path, description = "Quotation id")),
    request_body = ResolveQuotationRequest,
    responses(
        (status = 200, description = "Quotation resolved", body = ApiResponse<QuotationResponse>),
        (status = 400, description = "Outcome or current status invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn resolve_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveQuotationRequest>,
) -> Result<Json<ApiResponse<QuotationResponse>>, ServiceError> {
    let quotation = state.services.quotations.resolve(id, request).await?;
    Ok(Json(ApiResponse::success(quotation)))
}

/// Convert an accepted quotation into an order
#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/convert",
    summary = "Convert quotation to order",
    description = "One-way conversion; the quotation freezes as pedido_generado and the new pending order is returned",
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 201, description = "Order generated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Quotation is not accepted or was already converted", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn convert_to_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order = state.services.quotations.convert_to_order(id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Delete a quotation
#[utoipa::path(
    delete,
    path = "/api/v1/quotations/{id}",
    summary = "Delete quotation",
    description = "Removes the quotation and its lines; frozen quotations are kept for order traceability",
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 204, description = "Quotation deleted"),
        (status = 400, description = "Quotation is frozen", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.quotations.delete_quotation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// WhatsApp link for the quotation summary
#[utoipa::path(
    get,
    path = "/api/v1/quotations/{id}/whatsapp-link",
    summary = "Build quotation WhatsApp link",
    description = "Prefilled chat link to the quotation's client with the quotation summary message",
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Link built", body = ApiResponse<WhatsAppLinkResponse>),
        (status = 400, description = "Quotation has no client phone", body = crate::errors::ErrorResponse),
        (status = 404, description = "Quotation not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn whatsapp_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WhatsAppLinkResponse>>, ServiceError> {
    let link = state.services.quotations.whatsapp_link(id).await?;
    Ok(Json(ApiResponse::success(link)))
}

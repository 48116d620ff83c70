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
use crate::services::suppliers::{
    CreateSupplierRequest, SupplierListResponse, SupplierResponse, UpdateSupplierRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SupplierSearchQuery {
    /// Term matched against name and RUC.
    pub search: Option<String>,
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    summary = "List suppliers",
    params(PaginationParams, SupplierSearchQuery),
    responses(
        (status = 200, description = "Suppliers retrieved", body = ApiResponse<SupplierListResponse>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<SupplierSearchQuery>,
) -> Result<Json<ApiResponse<SupplierListResponse>>, ServiceError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let result = state
        .services
        .suppliers
        .list_suppliers(page, per_page, query.search)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    summary = "Create supplier",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<SupplierResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SupplierResponse>>), ServiceError> {
    let supplier = state.services.suppliers.create_supplier(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(supplier))))
}

/// Get one supplier
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    summary = "Get supplier",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier retrieved", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    summary = "Update supplier",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated", body = ApiResponse<SupplierResponse>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSupplierRequest>,
) -> Result<Json<ApiResponse<SupplierResponse>>, ServiceError> {
    let supplier = state
        .services
        .suppliers
        .update_supplier(id, request)
        .await?;
    Ok(Json(ApiResponse::success(supplier)))
}

/// Delete a supplier
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    summary = "Delete supplier",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

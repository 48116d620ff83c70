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
use crate::services::clients::{
    ClientListResponse, ClientResponse, CreateClientRequest, UpdateClientRequest,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClientSearchQuery {
    /// Term matched against name, razón social, and RUC.
    pub search: Option<String>,
}

/// List clients
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    summary = "List clients",
    params(PaginationParams, ClientSearchQuery),
    responses(
        (status = 200, description = "Clients retrieved", body = ApiResponse<ClientListResponse>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Json<ApiResponse<ClientListResponse>>, ServiceError> {
    let (page, per_page) = pagination.resolve(&state.config);
    let result = state
        .services
        .clients
        .list_clients(page, per_page, query.search)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    summary = "Create client",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<ClientResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ClientResponse>>), ServiceError> {
    let client = state.services.clients.create_client(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(client))))
}

/// Get one client
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    summary = "Get client",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client retrieved", body = ApiResponse<ClientResponse>),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ClientResponse>>, ServiceError> {
    let client = state.services.clients.get_client(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    summary = "Update client",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<ClientResponse>),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ApiResponse<ClientResponse>>, ServiceError> {
    let client = state.services.clients.update_client(id, request).await?;
    Ok(Json(ApiResponse::success(client)))
}

/// Delete a client
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    summary = "Delete client",
    description = "Removes the client; their orders, quotations, and carts are detached, not removed",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.clients.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::reports::{RevenueSeries, SalesFunnel};
use crate::services::analytics::DashboardReport;
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/revenue-series", get(revenue_series))
        .route("/funnel", get(funnel))
}

/// Reporting window bounds. Both optional; the default window is the
/// last 30 days ending now.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportWindowQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Dashboard KPIs
#[utoipa::path(
    get,
    path = "/api/v1/reports/dashboard",
    summary = "Dashboard report",
    description = "Sales summary, funnel, status distribution, customer metrics, and revenue series for the window",
    params(ReportWindowQuery),
    responses(
        (status = 200, description = "Report computed", body = ApiResponse<DashboardReport>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Window bounds invalid", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(window): Query<ReportWindowQuery>,
) -> Result<Json<ApiResponse<DashboardReport>>, ServiceError> {
    let report = state
        .services
        .analytics
        .dashboard(window.from, window.to)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Revenue over time
#[utoipa::path(
    get,
    path = "/api/v1/reports/revenue-series",
    summary = "Revenue series",
    description = "Revenue per day (windows up to 31 days) or per month (longer windows)",
    params(ReportWindowQuery),
    responses(
        (status = 200, description = "Series computed", body = ApiResponse<RevenueSeries>),
        (status = 400, description = "Window bounds invalid", body = crate::errors::ErrorResponse),
    )
)]
pub async fn revenue_series(
    State(state): State<AppState>,
    Query(window): Query<ReportWindowQuery>,
) -> Result<Json<ApiResponse<RevenueSeries>>, ServiceError> {
    let series = state
        .services
        .analytics
        .revenue_series(window.from, window.to)
        .await?;
    Ok(Json(ApiResponse::success(series)))
}

/// Conversion funnel
#[utoipa::path(
    get,
    path = "/api/v1/reports/funnel",
    summary = "Sales funnel",
    description = "Counts of quotations issued, orders placed, and completed sales in the window",
    params(ReportWindowQuery),
    responses(
        (status = 200, description = "Funnel computed", body = ApiResponse<SalesFunnel>),
        (status = 400, description = "Window bounds invalid", body = crate::errors::ErrorResponse),
    )
)]
pub async fn funnel(
    State(state): State<AppState>,
    Query(window): Query<ReportWindowQuery>,
) -> Result<Json<ApiResponse<SalesFunnel>>, ServiceError> {
    let funnel = state
        .services
        .analytics
        .funnel(window.from, window.to)
        .await?;
    Ok(Json(ApiResponse::success(funnel)))
}

use crate::{
    db::DbPool,
    domain::reports::{self, CustomerMetrics, RevenueSeries, SalesFunnel, SalesSummary,
        StatusSlice},
    entities::{order, quotation},
    errors::ServiceError,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Everything the back-office dashboard renders, computed in one pass
/// over the orders of the reporting window.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub summary: SalesSummary,
    pub funnel: SalesFunnel,
    pub status_distribution: Vec<StatusSlice>,
    pub customers: CustomerMetrics,
    pub revenue_series: RevenueSeries,
}

/// Read-only reporting over orders and quotations. All aggregation is
/// delegated to the pure functions in [`crate::domain::reports`]; this
/// service only resolves the window and fetches the rows.
#[derive(Clone)]
pub struct AnalyticsService {
    db_pool: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<DashboardReport, ServiceError> {
        let (from, to) = resolve_window(from, to)?;

        let orders = self.orders_in_window(from, to).await?;
        let quotation_count = self.quotation_count_in_window(from, to).await?;

        Ok(DashboardReport {
            from,
            to,
            summary: reports::sales_summary(&orders),
            funnel: reports::funnel(quotation_count, &orders),
            status_distribution: reports::status_distribution(&orders),
            customers: reports::customer_metrics(&orders),
            revenue_series: reports::revenue_series(&orders),
        })
    }

    #[instrument(skip(self))]
    pub async fn revenue_series(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<RevenueSeries, ServiceError> {
        let (from, to) = resolve_window(from, to)?;
        let orders = self.orders_in_window(from, to).await?;
        Ok(reports::revenue_series(&orders))
    }

    #[instrument(skip(self))]
    pub async fn funnel(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<SalesFunnel, ServiceError> {
        let (from, to) = resolve_window(from, to)?;
        let orders = self.orders_in_window(from, to).await?;
        let quotation_count = self.quotation_count_in_window(from, to).await?;
        Ok(reports::funnel(quotation_count, &orders))
    }

    async fn orders_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let db = &*self.db_pool;
        order::Entity::find()
            .filter(order::Column::CreatedAt.gte(from))
            .filter(order::Column::CreatedAt.lte(to))
            .order_by_asc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch orders for reporting window");
                ServiceError::DatabaseError(e)
            })
    }

    async fn quotation_count_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        let db = &*self.db_pool;
        let count = quotation::Entity::find()
            .filter(quotation::Column::CreatedAt.gte(from))
            .filter(quotation::Column::CreatedAt.lte(to))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count quotations for reporting window");
                ServiceError::DatabaseError(e)
            })?;
        Ok(count as i64)
    }
}

/// Missing bounds fall back to the last 30 days ending now.
fn resolve_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or_else(|| to - Duration::days(DEFAULT_WINDOW_DAYS));
    if from > to {
        return Err(ServiceError::ValidationError(
            "Report window start must be before its end".to_string(),
        ));
    }
    Ok((from, to))
}

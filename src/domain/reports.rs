use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::domain::status::{order_status_label, OrderStatus};
use crate::entities::order;

/// Revenue and ticket KPIs over one reporting window.
///
/// `avg_ticket` and `cancellation_rate` are computed over every order in the
/// window, cancelled ones included. `delivered_revenue` is the only
/// delivered-filtered figure and is reported alongside the unfiltered total.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub order_count: i64,
    pub total_revenue: Decimal,
    pub delivered_revenue: Decimal,
    pub avg_ticket: Decimal,
    pub cancelled_count: i64,
    pub cancellation_rate: f64,
}

/// Conversion funnel: quotations issued, orders placed, completed sales.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesFunnel {
    pub quotations: i64,
    pub orders: i64,
    pub completed: i64,
}

/// Bucket width of the revenue series, serialized with the labels the
/// storefront charts expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TimeGranularity {
    #[serde(rename = "día")]
    Daily,
    #[serde(rename = "mes")]
    Monthly,
}

/// One revenue bucket, keyed `YYYY-MM-DD` or `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RevenuePoint {
    pub period: String,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevenueSeries {
    pub granularity: TimeGranularity,
    pub points: Vec<RevenuePoint>,
}

/// One slice of the status breakdown. `percentage` is absent for status keys
/// outside the known workflow; they still appear with their raw counts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusSlice {
    pub status: String,
    pub label: String,
    pub count: i64,
    pub percentage: Option<f64>,
}

/// Distinct-customer KPIs derived from order contact data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerMetrics {
    pub unique_customers: i64,
    pub recurring_customers: i64,
    pub avg_value_per_customer: Decimal,
}

pub fn sales_summary(orders: &[order::Model]) -> SalesSummary {
    let order_count = orders.len() as i64;
    let total_revenue: Decimal = orders.iter().map(|o| o.total).sum();
    let delivered_revenue: Decimal = orders
        .iter()
        .filter(|o| {
            OrderStatus::from_key(&o.status).is_some_and(|s| s.is_delivered())
        })
        .map(|o| o.total)
        .sum();
    let cancelled_count = orders
        .iter()
        .filter(|o| OrderStatus::from_key(&o.status) == Some(OrderStatus::Cancelado))
        .count() as i64;

    let avg_ticket = if order_count > 0 {
        total_revenue / Decimal::from(order_count)
    } else {
        Decimal::ZERO
    };
    let cancellation_rate = if order_count > 0 {
        cancelled_count as f64 / order_count as f64 * 100.0
    } else {
        0.0
    };

    SalesSummary {
        order_count,
        total_revenue,
        delivered_revenue,
        avg_ticket,
        cancelled_count,
        cancellation_rate,
    }
}

pub fn funnel(quotation_count: i64, orders: &[order::Model]) -> SalesFunnel {
    let completed = orders
        .iter()
        .filter(|o| {
            OrderStatus::from_key(&o.status).is_some_and(|s| s.is_delivered())
        })
        .count() as i64;

    SalesFunnel {
        quotations: quotation_count,
        orders: orders.len() as i64,
        completed,
    }
}

/// Daily buckets while the window of actual data fits in a month, monthly
/// beyond that. Zero or one orders always report daily.
pub fn series_granularity(orders: &[order::Model]) -> TimeGranularity {
    let mut dates = orders.iter().map(|o| o.created_at);
    let Some(first) = dates.next() else {
        return TimeGranularity::Daily;
    };
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    if (max - min).num_days() <= 31 {
        TimeGranularity::Daily
    } else {
        TimeGranularity::Monthly
    }
}

/// Groups order totals into date buckets. Keys sort lexicographically, which
/// is chronological for both key formats.
pub fn revenue_series(orders: &[order::Model]) -> RevenueSeries {
    let granularity = series_granularity(orders);
    let key_format = match granularity {
        TimeGranularity::Daily => "%Y-%m-%d",
        TimeGranularity::Monthly => "%Y-%m",
    };

    let mut buckets: HashMap<String, (Decimal, i64)> = HashMap::new();
    for order in orders {
        let key = order.created_at.format(key_format).to_string();
        let entry = buckets.entry(key).or_insert((Decimal::ZERO, 0));
        entry.0 += order.total;
        entry.1 += 1;
    }

    let mut points: Vec<RevenuePoint> = buckets
        .into_iter()
        .map(|(period, (revenue, orders))| RevenuePoint {
            period,
            revenue,
            orders,
        })
        .collect();
    points.sort_by(|a, b| a.period.cmp(&b.period));

    RevenueSeries {
        granularity,
        points,
    }
}

/// Counts per status key. Known statuses come first in workflow order with a
/// percentage share; unknown keys follow sorted, count only, so dirty rows
/// stay visible without skewing the chart.
pub fn status_distribution(orders: &[order::Model]) -> Vec<StatusSlice> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for order in orders {
        *counts.entry(order.status.as_str()).or_insert(0) += 1;
    }

    let known_total: i64 = counts
        .iter()
        .filter(|(key, _)| OrderStatus::from_key(key).is_some())
        .map(|(_, n)| n)
        .sum();

    let mut slices = Vec::new();
    for status in OrderStatus::iter() {
        let key = status.to_string();
        if let Some(count) = counts.remove(key.as_str()) {
            let percentage = if known_total > 0 {
                Some(count as f64 / known_total as f64 * 100.0)
            } else {
                None
            };
            slices.push(StatusSlice {
                status: key,
                label: status.label().to_string(),
                count,
                percentage,
            });
        }
    }

    let mut unknown: Vec<(&str, i64)> = counts.into_iter().collect();
    unknown.sort_by(|a, b| a.0.cmp(b.0));
    for (key, count) in unknown {
        slices.push(StatusSlice {
            status: key.to_string(),
            label: order_status_label(key),
            count,
            percentage: None,
        });
    }

    slices
}

/// Customer identity is the first non-empty of email, phone, and name, in
/// that order. Orders with no usable identity are skipped.
fn customer_key(order: &order::Model) -> Option<&str> {
    [
        order.client_email.as_deref(),
        order.client_phone.as_deref(),
        Some(order.client_name.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|value| !value.is_empty())
}

pub fn customer_metrics(orders: &[order::Model]) -> CustomerMetrics {
    let mut per_customer: HashMap<&str, i64> = HashMap::new();
    for order in orders {
        if let Some(key) = customer_key(order) {
            *per_customer.entry(key).or_insert(0) += 1;
        }
    }

    let unique_customers = per_customer.len() as i64;
    let recurring_customers = per_customer.values().filter(|&&n| n > 1).count() as i64;
    let total_revenue: Decimal = orders.iter().map(|o| o.total).sum();
    let avg_value_per_customer = if unique_customers > 0 {
        total_revenue / Decimal::from(unique_customers)
    } else {
        Decimal::ZERO
    };

    CustomerMetrics {
        unique_customers,
        recurring_customers,
        avg_value_per_customer,
    }
}

use crate::{
    db::DbPool,
    domain::status::{order_status_label, OrderStatus},
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity,
        Model as OrderModel},
    entities::order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity,
        Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::whatsapp::{self, WhatsAppLinkResponse},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// One line of an order as submitted by staff. Prices are snapshots; later
/// catalog changes never touch stored lines.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    #[validate(length(min = 1, message = "Product code is required"))]
    pub product_code: String,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub unit_price: Decimal,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_contact_present"))]
pub struct CreateOrderRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

fn validate_contact_present(request: &CreateOrderRequest) -> Result<(), ValidationError> {
    let has_email = request
        .client_email
        .as_deref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    let has_phone = request
        .client_phone
        .as_deref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if has_email || has_phone {
        Ok(())
    } else {
        let mut err = ValidationError::new("contact_required");
        err.message = Some("At least one contact method (email or phone) is required".into());
        Err(err)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReplaceOrderItemsRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<OrderItemInput>,
}

/// Cancellation reason. An empty string is a valid reason (the "other"
/// path in the back office), but the field itself must be present.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub motivo: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub subtotal: Decimal,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    /// Raw status key. Unknown keys stored in the database are passed
    /// through untouched.
    pub status: String,
    /// Human-readable form of `status`; equals the raw key when unknown.
    pub status_label: String,
    pub total: Decimal,
    pub source_quotation_id: Option<Uuid>,
    pub notes: Option<String>,
    pub cancelado_en: Option<DateTime<Utc>>,
    pub motivo_cancelacion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub(crate) fn from_models(order: OrderModel, items: Vec<OrderItemModel>) -> Self {
        let status_label = order_status_label(&order.status);
        Self {
            id: order.id,
            order_number: order.order_number,
            client_id: order.client_id,
            client_name: order.client_name,
            client_email: order.client_email,
            client_phone: order.client_phone,
            status: order.status,
            status_label,
            total: order.total,
            source_quotation_id: order.source_quotation_id,
            notes: order.notes,
            cancelado_en: order.cancelado_en,
            motivo_cancelacion: order.motivo_cancelacion,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_code: item.product_code,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    cost_price: item.cost_price,
                    subtotal: item.subtotal,
                    position: item.position,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

pub(crate) fn format_order_number(seq: u64) -> String {
    format!("PED-{:04}", seq)
}

/// Next sequential order number. Runs inside the caller's transaction so
/// checkout and quotation conversion share the sequence.
pub(crate) async fn next_order_number<C: ConnectionTrait>(
    conn: &C,
) -> Result<String, ServiceError> {
    let count = OrderEntity::find()
        .count(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;
    Ok(format_order_number(count + 1))
}

/// Service for managing orders and their status workflow.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    whatsapp_country_code: String,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        whatsapp_country_code: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            whatsapp_country_code,
        }
    }

    /// Creates an order from the staff form. New orders always start in
    /// `pendiente`.
    #[instrument(skip(self, request), fields(client_name = %request.client_name))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_number = next_order_number(&txn).await?;

        let (item_models, total) = build_item_models(order_id, &request.items, now);

        let order_active_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            client_id: Set(request.client_id),
            client_name: Set(request.client_name),
            client_email: Set(request.client_email),
            client_phone: Set(request.client_phone),
            status: Set(OrderStatus::Pendiente.to_string()),
            total: Set(total),
            source_quotation_id: Set(None),
            notes: Set(request.notes),
            cancelado_en: Set(None),
            motivo_cancelacion: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        OrderItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to insert order items");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_number, "Order created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::OrderCreated(order_id)).await;
        }

        let (order, items) = self.load_order_with_items(order_id).await?;
        Ok(OrderResponse::from_models(order, items))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let (order, items) = self.load_order_with_items(order_id).await?;
        Ok(OrderResponse::from_models(order, items))
    }

    /// Lists orders newest first. `status` filters on the raw stored key,
    /// so unknown legacy statuses remain reachable.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<String>,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find();
        if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
            query = query.filter(order::Column::Status.eq(status.trim()));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch orders page");
            ServiceError::DatabaseError(e)
        })?;

        let mut items_by_order = self
            .load_items_for(orders.iter().map(|o| o.id).collect())
            .await?;

        let responses = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderResponse::from_models(order, items)
            })
            .collect();

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    /// Replaces the whole line set. Single-line edits do not exist; the
    /// client always submits the full set.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn replace_items(
        &self,
        order_id: Uuid,
        request: ReplaceOrderItemsRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for item replacement");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;

        let editable = OrderStatus::from_key(&order.status)
            .map(|s| s.allows_item_edit())
            .unwrap_or(false);
        if !editable {
            return Err(ServiceError::InvalidStatus(format!(
                "Order in status '{}' cannot have its items edited",
                order.status
            )));
        }

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete previous order items");
                ServiceError::DatabaseError(e)
            })?;

        let (item_models, total) = build_item_models(order_id, &request.items, now);
        OrderItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to insert replacement items");
                ServiceError::DatabaseError(e)
            })?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.total = Set(total);
        order_active_model.updated_at = Set(Some(now));
        order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order total");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit item replacement");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order items replaced");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::OrderItemsReplaced(order_id)).await;
        }

        let (order, items) = self.load_order_with_items(order_id).await?;
        Ok(OrderResponse::from_models(order, items))
    }

    /// Moves the order one step along the fixed chain
    /// pendiente → enproceso → enviado → entregado_pp → entregado_pr.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn advance_status(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for status advance");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;
        let old_status = order.status.clone();

        let current = OrderStatus::from_key(&order.status).ok_or_else(|| {
            ServiceError::InvalidStatus(format!(
                "Order has unrecognized status '{}'",
                order.status
            ))
        })?;
        let next = current.advance().ok_or_else(|| {
            ServiceError::InvalidStatus(format!(
                "Order in status '{}' cannot advance further",
                order.status
            ))
        })?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.status = Set(next.to_string());
        order_active_model.updated_at = Set(Some(now));
        order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to advance order status");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status advance");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %next, "Order status advanced");

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: next.to_string(),
                })
                .await;
        }

        let (order, items) = self.load_order_with_items(order_id).await?;
        Ok(OrderResponse::from_models(order, items))
    }

    /// Cancels an order from `pendiente` or `enproceso`. The reason is
    /// stored verbatim and the cancellation timestamp is set once.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        request: CancelOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for cancellation");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;
        let cancellable = OrderStatus::from_key(&order.status)
            .map(|s| s.can_cancel())
            .unwrap_or(false);
        if !cancellable {
            return Err(ServiceError::InvalidStatus(format!(
                "Order in status '{}' cannot be cancelled",
                order.status
            )));
        }

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.status = Set(OrderStatus::Cancelado.to_string());
        order_active_model.cancelado_en = Set(Some(now));
        order_active_model.motivo_cancelacion = Set(Some(request.motivo.clone()));
        order_active_model.updated_at = Set(Some(now));
        order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to cancel order");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit cancellation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order cancelled");

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::OrderCancelled {
                    order_id,
                    motivo: request.motivo,
                })
                .await;
        }

        let (order, items) = self.load_order_with_items(order_id).await?;
        Ok(OrderResponse::from_models(order, items))
    }

    /// Irreversible removal of the order and its lines.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for order deletion");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order items");
                ServiceError::DatabaseError(e)
            })?;
        OrderEntity::delete_by_id(order.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::OrderDeleted(order_id)).await;
        }

        Ok(())
    }

    /// Prefilled WhatsApp link with the order summary, addressed to the
    /// client's phone.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn whatsapp_link(
        &self,
        order_id: Uuid,
    ) -> Result<WhatsAppLinkResponse, ServiceError> {
        let (order, items) = self.load_order_with_items(order_id).await?;

        let phone = order.client_phone.as_deref().ok_or_else(|| {
            ServiceError::ValidationError("Order has no client phone number".to_string())
        })?;

        let message = whatsapp::order_message(&order, &items);
        whatsapp::build_link(phone, &self.whatsapp_country_code, &message)
    }

    async fn load_order_with_items(
        &self,
        order_id: Uuid,
    ) -> Result<(OrderModel, Vec<OrderItemModel>), ServiceError> {
        let db = &*self.db_pool;

        let order = find_order(db, order_id).await?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order items");
                ServiceError::DatabaseError(e)
            })?;

        Ok((order, items))
    }

    async fn load_items_for(
        &self,
        order_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<OrderItemModel>>, ServiceError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let db = &*self.db_pool;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_item::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch items for order list");
                ServiceError::DatabaseError(e)
            })?;

        let mut grouped: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }
}

async fn find_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<OrderModel, ServiceError> {
    OrderEntity::find_by_id(order_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to fetch order");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(order_id = %order_id, "Order not found");
            ServiceError::NotFound(format!("Order {} not found", order_id))
        })
}

/// Turns validated line inputs into active models with recomputed
/// subtotals, returning the order total alongside.
fn build_item_models(
    order_id: Uuid,
    items: &[OrderItemInput],
    now: DateTime<Utc>,
) -> (Vec<OrderItemActiveModel>, Decimal) {
    let mut total = Decimal::ZERO;
    let models = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let subtotal = item.unit_price * Decimal::from(item.quantity);
            total += subtotal;
            OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_code: Set(item.product_code.clone()),
                product_name: Set(item.product_name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                cost_price: Set(item.cost_price),
                subtotal: Set(subtotal),
                position: Set(position as i32),
                created_at: Set(now),
            }
        })
        .collect();
    (models, total)
}

use crate::{
    db::DbPool,
    domain::pricing,
    domain::status::{quotation_status_label, OrderStatus, QuotationStatus},
    entities::order::ActiveModel as OrderActiveModel,
    entities::order_item::ActiveModel as OrderItemActiveModel,
    entities::quotation::{self, ActiveModel as QuotationActiveModel, Entity as QuotationEntity,
        Model as QuotationModel},
    entities::quotation_item::{self, ActiveModel as QuotationItemActiveModel,
        Entity as QuotationItemEntity, Model as QuotationItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{next_order_number, OrderResponse},
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
use validator::Validate;

/// One quotation line as submitted by staff. The sale price is always
/// derived from the cost/margin pair, never taken from the client.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuotationItemInput {
    #[validate(length(min = 1, message = "Product code is required"))]
    pub product_code: String,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Absent cost and margin both mean zero; there is no other fallback.
    #[serde(default)]
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub precio_compra: Decimal,
    #[serde(default)]
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub margen: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateQuotationRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<QuotationItemInput>,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Header-only edits. Lines are replaced wholesale through
/// [`QuotationService::replace_items`].
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateQuotationRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Client name cannot be empty"))]
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReplaceQuotationItemsRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<QuotationItemInput>,
}

/// Manual resolution picked by staff: `aceptada`, `rechazada` or `anulada`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveQuotationRequest {
    pub outcome: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuotationItemResponse {
    pub id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub precio_compra: Decimal,
    pub margen: Decimal,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuotationResponse {
    pub id: Uuid,
    pub quotation_number: String,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    /// Raw status key, passed through verbatim when unknown.
    pub status: String,
    pub status_label: String,
    pub total: Decimal,
    pub generated_order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<QuotationItemResponse>,
}

impl QuotationResponse {
    fn from_models(quotation: QuotationModel, items: Vec<QuotationItemModel>) -> Self {
        let status_label = quotation_status_label(&quotation.status);
        Self {
            id: quotation.id,
            quotation_number: quotation.quotation_number,
            client_id: quotation.client_id,
            client_name: quotation.client_name,
            client_email: quotation.client_email,
            client_phone: quotation.client_phone,
            status: quotation.status,
            status_label,
            total: quotation.total,
            generated_order_id: quotation.generated_order_id,
            notes: quotation.notes,
            valid_until: quotation.valid_until,
            created_at: quotation.created_at,
            updated_at: quotation.updated_at,
            items: items
                .into_iter()
                .map(|item| QuotationItemResponse {
                    id: item.id,
                    product_code: item.product_code,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    precio_compra: item.precio_compra,
                    margen: item.margen,
                    precio_unitario: item.precio_unitario,
                    subtotal: item.subtotal,
                    position: item.position,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuotationListResponse {
    pub quotations: Vec<QuotationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

pub(crate) fn format_quotation_number(seq: u64) -> String {
    format!("COT-{:04}", seq)
}

async fn next_quotation_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let count = QuotationEntity::find()
        .count(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;
    Ok(format_quotation_number(count + 1))
}

/// Service for managing quotations and their conversion into orders.
#[derive(Clone)]
pub struct QuotationService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    whatsapp_country_code: String,
}

impl QuotationService {
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

    /// Creates a quotation in `pendiente`, deriving each line's sale
    /// price from its cost/margin pair.
    #[instrument(skip(self, request), fields(client_name = %request.client_name))]
    pub async fn create_quotation(
        &self,
        request: CreateQuotationRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let quotation_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for quotation creation");
            ServiceError::DatabaseError(e)
        })?;

        let quotation_number = next_quotation_number(&txn).await?;
        let (item_models, total) = build_item_models(quotation_id, &request.items, now);

        let quotation_active_model = QuotationActiveModel {
            id: Set(quotation_id),
            quotation_number: Set(quotation_number.clone()),
            client_id: Set(request.client_id),
            client_name: Set(request.client_name),
            client_email: Set(request.client_email),
            client_phone: Set(request.client_phone),
            status: Set(QuotationStatus::Pendiente.to_string()),
            total: Set(total),
            generated_order_id: Set(None),
            notes: Set(request.notes),
            valid_until: Set(request.valid_until),
            created_at: Set(now),
            updated_at: Set(None),
        };

        quotation_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to insert quotation");
            ServiceError::DatabaseError(e)
        })?;

        QuotationItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to insert quotation items");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to commit quotation creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(quotation_id = %quotation_id, quotation_number = %quotation_number, "Quotation created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::QuotationCreated(quotation_id)).await;
        }

        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;
        Ok(QuotationResponse::from_models(quotation, items))
    }

    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn get_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<QuotationResponse, ServiceError> {
        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;
        Ok(QuotationResponse::from_models(quotation, items))
    }

    #[instrument(skip(self))]
    pub async fn list_quotations(
        &self,
        page: u64,
        per_page: u64,
        status: Option<String>,
    ) -> Result<QuotationListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = QuotationEntity::find();
        if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
            query = query.filter(quotation::Column::Status.eq(status.trim()));
        }

        let paginator = query
            .order_by_desc(quotation::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count quotations");
            ServiceError::DatabaseError(e)
        })?;
        let quotations = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch quotations page");
            ServiceError::DatabaseError(e)
        })?;

        let ids: Vec<Uuid> = quotations.iter().map(|q| q.id).collect();
        let mut items_by_quotation: HashMap<Uuid, Vec<QuotationItemModel>> = HashMap::new();
        if !ids.is_empty() {
            let items = QuotationItemEntity::find()
                .filter(quotation_item::Column::QuotationId.is_in(ids))
                .order_by_asc(quotation_item::Column::Position)
                .all(db)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to fetch items for quotation list");
                    ServiceError::DatabaseError(e)
                })?;
            for item in items {
                items_by_quotation
                    .entry(item.quotation_id)
                    .or_default()
                    .push(item);
            }
        }

        let responses = quotations
            .into_iter()
            .map(|quotation| {
                let items = items_by_quotation.remove(&quotation.id).unwrap_or_default();
                QuotationResponse::from_models(quotation, items)
            })
            .collect();

        Ok(QuotationListResponse {
            quotations: responses,
            total,
            page,
            per_page,
        })
    }

    /// Header-only update, rejected once the quotation is frozen.
    #[instrument(skip(self, request), fields(quotation_id = %quotation_id))]
    pub async fn update_details(
        &self,
        quotation_id: Uuid,
        request: UpdateQuotationRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let quotation = find_quotation(db, quotation_id).await?;
        ensure_not_frozen(&quotation)?;

        let mut active_model: QuotationActiveModel = quotation.into();
        if let Some(client_id) = request.client_id {
            active_model.client_id = Set(Some(client_id));
        }
        if let Some(client_name) = request.client_name {
            active_model.client_name = Set(client_name);
        }
        if let Some(client_email) = request.client_email {
            active_model.client_email = Set(Some(client_email));
        }
        if let Some(client_phone) = request.client_phone {
            active_model.client_phone = Set(Some(client_phone));
        }
        if let Some(notes) = request.notes {
            active_model.notes = Set(Some(notes));
        }
        if let Some(valid_until) = request.valid_until {
            active_model.valid_until = Set(Some(valid_until));
        }
        active_model.updated_at = Set(Some(Utc::now()));

        active_model.update(db).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to update quotation");
            ServiceError::DatabaseError(e)
        })?;

        info!(quotation_id = %quotation_id, "Quotation updated");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::QuotationUpdated(quotation_id)).await;
        }

        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;
        Ok(QuotationResponse::from_models(quotation, items))
    }

    /// Replaces the whole line set, re-deriving prices. Rejected once
    /// frozen.
    #[instrument(skip(self, request), fields(quotation_id = %quotation_id))]
    pub async fn replace_items(
        &self,
        quotation_id: Uuid,
        request: ReplaceQuotationItemsRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to start transaction for item replacement");
            ServiceError::DatabaseError(e)
        })?;

        let quotation = find_quotation(&txn, quotation_id).await?;
        ensure_not_frozen(&quotation)?;

        QuotationItemEntity::delete_many()
            .filter(quotation_item::Column::QuotationId.eq(quotation_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to delete previous quotation items");
                ServiceError::DatabaseError(e)
            })?;

        let (item_models, total) = build_item_models(quotation_id, &request.items, now);
        QuotationItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to insert replacement items");
                ServiceError::DatabaseError(e)
            })?;

        let mut active_model: QuotationActiveModel = quotation.into();
        active_model.total = Set(total);
        active_model.updated_at = Set(Some(now));
        active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to update quotation total");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to commit item replacement");
            ServiceError::DatabaseError(e)
        })?;

        info!(quotation_id = %quotation_id, "Quotation items replaced");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::QuotationUpdated(quotation_id)).await;
        }

        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;
        Ok(QuotationResponse::from_models(quotation, items))
    }

    /// Applies a manual resolution. Only pending quotations can be
    /// resolved, and only to `aceptada`, `rechazada` or `anulada`.
    #[instrument(skip(self, request), fields(quotation_id = %quotation_id, outcome = %request.outcome))]
    pub async fn resolve(
        &self,
        quotation_id: Uuid,
        request: ResolveQuotationRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        let outcome = QuotationStatus::from_key(request.outcome.trim()).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unknown quotation outcome '{}'",
                request.outcome
            ))
        })?;
        if !outcome.is_resolution() {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not a manual resolution",
                outcome
            )));
        }

        let db = &*self.db_pool;
        let quotation = find_quotation(db, quotation_id).await?;

        let current = QuotationStatus::from_key(&quotation.status);
        let allowed = current
            .map(|c| c.can_resolve_to(outcome))
            .unwrap_or(false);
        if !allowed {
            return Err(ServiceError::InvalidStatus(format!(
                "Quotation in status '{}' cannot be resolved",
                quotation.status
            )));
        }

        let mut active_model: QuotationActiveModel = quotation.into();
        active_model.status = Set(outcome.to_string());
        active_model.updated_at = Set(Some(Utc::now()));
        active_model.update(db).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to resolve quotation");
            ServiceError::DatabaseError(e)
        })?;

        info!(quotation_id = %quotation_id, outcome = %outcome, "Quotation resolved");

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::QuotationResolved {
                    quotation_id,
                    outcome: outcome.to_string(),
                })
                .await;
        }

        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;
        Ok(QuotationResponse::from_models(quotation, items))
    }

    /// Materializes an accepted quotation into a new order. One
    /// transaction covers the new order, its lines, and the freeze of the
    /// quotation.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn convert_to_order(
        &self,
        quotation_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to start transaction for conversion");
            ServiceError::DatabaseError(e)
        })?;

        let quotation = find_quotation(&txn, quotation_id).await?;
        let current = QuotationStatus::from_key(&quotation.status);
        if current == Some(QuotationStatus::PedidoGenerado) {
            return Err(ServiceError::InvalidStatus(format!(
                "Quotation {} was already converted",
                quotation.quotation_number
            )));
        }
        if !current.map(QuotationStatus::can_convert).unwrap_or(false) {
            return Err(ServiceError::InvalidStatus(format!(
                "Only accepted quotations can be converted (current status '{}')",
                quotation.status
            )));
        }

        let items = QuotationItemEntity::find()
            .filter(quotation_item::Column::QuotationId.eq(quotation_id))
            .order_by_asc(quotation_item::Column::Position)
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to fetch quotation items for conversion");
                ServiceError::DatabaseError(e)
            })?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Quotation has no items to convert".to_string(),
            ));
        }

        let order_id = Uuid::new_v4();
        let order_number = next_order_number(&txn).await?;

        let order_active_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            client_id: Set(quotation.client_id),
            client_name: Set(quotation.client_name.clone()),
            client_email: Set(quotation.client_email.clone()),
            client_phone: Set(quotation.client_phone.clone()),
            status: Set(OrderStatus::Pendiente.to_string()),
            total: Set(quotation.total),
            source_quotation_id: Set(Some(quotation.id)),
            notes: Set(quotation.notes.clone()),
            cancelado_en: Set(None),
            motivo_cancelacion: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to insert converted order");
            ServiceError::DatabaseError(e)
        })?;

        let order_item_models: Vec<OrderItemActiveModel> = items
            .iter()
            .map(|item| OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_code: Set(item.product_code.clone()),
                product_name: Set(item.product_name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.precio_unitario),
                cost_price: Set(Some(item.precio_compra)),
                subtotal: Set(item.subtotal),
                position: Set(item.position),
                created_at: Set(now),
            })
            .collect();
        crate::entities::order_item::Entity::insert_many(order_item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to insert converted order items");
                ServiceError::DatabaseError(e)
            })?;

        let mut quotation_active_model: QuotationActiveModel = quotation.into();
        quotation_active_model.status = Set(QuotationStatus::PedidoGenerado.to_string());
        quotation_active_model.generated_order_id = Set(Some(order_id));
        quotation_active_model.updated_at = Set(Some(now));
        quotation_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to freeze converted quotation");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to commit conversion");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            quotation_id = %quotation_id,
            order_id = %order_id,
            order_number = %order_number,
            "Quotation converted to order"
        );

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::QuotationConverted {
                    quotation_id,
                    order_id,
                })
                .await;
            events.send_or_log(Event::OrderCreated(order_id)).await;
        }

        let order = crate::entities::order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError("Converted order vanished after commit".to_string())
            })?;
        let order_items = crate::entities::order_item::Entity::find()
            .filter(crate::entities::order_item::Column::OrderId.eq(order_id))
            .order_by_asc(crate::entities::order_item::Column::Position)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderResponse::from_models(order, order_items))
    }

    /// Deletes a quotation and its lines. Frozen quotations are kept for
    /// traceability of the generated order.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn delete_quotation(&self, quotation_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to start transaction for quotation deletion");
            ServiceError::DatabaseError(e)
        })?;

        let quotation = find_quotation(&txn, quotation_id).await?;
        ensure_not_frozen(&quotation)?;

        QuotationItemEntity::delete_many()
            .filter(quotation_item::Column::QuotationId.eq(quotation_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to delete quotation items");
                ServiceError::DatabaseError(e)
            })?;
        QuotationEntity::delete_by_id(quotation.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to delete quotation");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to commit quotation deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(quotation_id = %quotation_id, "Quotation deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::QuotationDeleted(quotation_id)).await;
        }

        Ok(())
    }

    /// Prefilled WhatsApp link with the quotation summary.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn whatsapp_link(
        &self,
        quotation_id: Uuid,
    ) -> Result<WhatsAppLinkResponse, ServiceError> {
        let (quotation, items) = self.load_quotation_with_items(quotation_id).await?;

        let phone = quotation.client_phone.as_deref().ok_or_else(|| {
            ServiceError::ValidationError("Quotation has no client phone number".to_string())
        })?;

        let message = whatsapp::quotation_message(&quotation, &items);
        whatsapp::build_link(phone, &self.whatsapp_country_code, &message)
    }

    async fn load_quotation_with_items(
        &self,
        quotation_id: Uuid,
    ) -> Result<(QuotationModel, Vec<QuotationItemModel>), ServiceError> {
        let db = &*self.db_pool;

        let quotation = find_quotation(db, quotation_id).await?;
        let items = QuotationItemEntity::find()
            .filter(quotation_item::Column::QuotationId.eq(quotation_id))
            .order_by_asc(quotation_item::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, quotation_id = %quotation_id, "Failed to fetch quotation items");
                ServiceError::DatabaseError(e)
            })?;

        Ok((quotation, items))
    }
}

async fn find_quotation<C: ConnectionTrait>(
    conn: &C,
    quotation_id: Uuid,
) -> Result<QuotationModel, ServiceError> {
    QuotationEntity::find_by_id(quotation_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, quotation_id = %quotation_id, "Failed to fetch quotation");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(quotation_id = %quotation_id, "Quotation not found");
            ServiceError::NotFound(format!("Quotation {} not found", quotation_id))
        })
}

fn ensure_not_frozen(quotation: &QuotationModel) -> Result<(), ServiceError> {
    let frozen = QuotationStatus::from_key(&quotation.status)
        .map(QuotationStatus::is_frozen)
        .unwrap_or(false);
    if frozen {
        Err(ServiceError::InvalidStatus(format!(
            "Quotation {} generated an order and can no longer be modified",
            quotation.quotation_number
        )))
    } else {
        Ok(())
    }
}

/// Derives sale prices and subtotals for a validated line set.
fn build_item_models(
    quotation_id: Uuid,
    items: &[QuotationItemInput],
    now: DateTime<Utc>,
) -> (Vec<QuotationItemActiveModel>, Decimal) {
    let mut total = Decimal::ZERO;
    let models = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let precio_unitario = pricing::sale_price_from_margin(item.precio_compra, item.margen);
            let subtotal = precio_unitario * Decimal::from(item.quantity);
            total += subtotal;
            QuotationItemActiveModel {
                id: Set(Uuid::new_v4()),
                quotation_id: Set(quotation_id),
                product_code: Set(item.product_code.clone()),
                product_name: Set(item.product_name.clone()),
                quantity: Set(item.quantity),
                precio_compra: Set(item.precio_compra),
                margen: Set(item.margen),
                precio_unitario: Set(precio_unitario),
                subtotal: Set(subtotal),
                position: Set(position as i32),
                created_at: Set(now),
            }
        })
        .collect();
    (models, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn line(cost: Decimal, margin: Decimal, quantity: i32) -> QuotationItemInput {
        QuotationItemInput {
            product_code: "TUB-110".to_string(),
            product_name: "Tubo PVC 110mm".to_string(),
            quantity,
            precio_compra: cost,
            margen: margin,
        }
    }

    #[test]
    fn quotation_numbers_are_zero_padded() {
        assert_eq!(format_quotation_number(3), "COT-0003");
        assert_eq!(format_quotation_number(9999), "COT-9999");
    }

    #[test]
    fn line_prices_derive_from_cost_and_margin() {
        let (models, total) =
            build_item_models(Uuid::new_v4(), &[line(dec!(50), dec!(20), 2)], Utc::now());
        assert_eq!(models[0].precio_unitario.clone().unwrap(), dec!(60.00));
        assert_eq!(models[0].subtotal.clone().unwrap(), dec!(120.00));
        assert_eq!(total, dec!(120.00));

        let (models, _) =
            build_item_models(Uuid::new_v4(), &[line(dec!(40), dec!(20), 1)], Utc::now());
        assert_eq!(models[0].precio_unitario.clone().unwrap(), dec!(48.00));
    }

    #[test]
    fn frozen_quotations_reject_edits() {
        let quotation = QuotationModel {
            id: Uuid::new_v4(),
            quotation_number: "COT-0001".to_string(),
            client_id: None,
            client_name: "Cliente".to_string(),
            client_email: None,
            client_phone: None,
            status: "pedido_generado".to_string(),
            total: dec!(0),
            generated_order_id: Some(Uuid::new_v4()),
            notes: None,
            valid_until: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        assert_matches!(
            ensure_not_frozen(&quotation),
            Err(ServiceError::InvalidStatus(_))
        );

        let pending = QuotationModel {
            status: "pendiente".to_string(),
            ..quotation
        };
        assert!(ensure_not_frozen(&pending).is_ok());
    }

    #[test]
    fn negative_margin_is_rejected() {
        let request = CreateQuotationRequest {
            client_id: None,
            client_name: "Cliente".to_string(),
            client_email: None,
            client_phone: None,
            items: vec![line(dec!(50), dec!(-10), 1)],
            notes: None,
            valid_until: None,
        };
        assert!(request.validate().is_err());
    }
}

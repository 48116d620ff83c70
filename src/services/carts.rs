use crate::{
    db::DbPool,
    domain::pricing,
    domain::status::OrderStatus,
    entities::cart::{self, ActiveModel as CartActiveModel, Entity as CartEntity,
        Model as CartModel},
    entities::cart_item::{self, ActiveModel as CartItemActiveModel, Entity as CartItemEntity,
        Model as CartItemModel},
    entities::order::ActiveModel as OrderActiveModel,
    entities::order_item::ActiveModel as OrderItemActiveModel,
    entities::product::{Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{next_order_number, OrderResponse},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCartRequest {
    pub session_id: Option<String>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Buyer details collected at checkout. Mirrors direct order creation:
/// a name plus at least one way to reach the client.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_checkout_contact"))]
pub struct CheckoutRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

fn validate_checkout_contact(request: &CheckoutRequest) -> Result<(), ValidationError> {
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

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub client_id: Option<Uuid>,
    pub total: Decimal,
    /// Sum of line quantities, for the storefront badge.
    pub item_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CartItemResponse>,
}

impl CartResponse {
    fn from_models(cart: CartModel, items: Vec<(CartItemModel, Option<ProductModel>)>) -> Self {
        let item_count = items.iter().map(|(item, _)| item.quantity).sum();
        Self {
            id: cart.id,
            session_id: cart.session_id,
            client_id: cart.client_id,
            total: cart.total,
            item_count,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
            items: items
                .into_iter()
                .map(|(item, product)| {
                    let (product_code, product_name) = product
                        .map(|p| (p.code, p.name))
                        .unwrap_or_default();
                    CartItemResponse {
                        id: item.id,
                        product_id: item.product_id,
                        product_code,
                        product_name,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        subtotal: item.subtotal,
                    }
                })
                .collect(),
        }
    }
}

/// Service for session carts and their conversion into orders at
/// checkout. Every mutation re-resolves tier prices and the cart total.
#[derive(Clone)]
pub struct CartService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CartService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_cart(
        &self,
        request: CreateCartRequest,
    ) -> Result<CartResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let cart_id = Uuid::new_v4();

        let cart_active_model = CartActiveModel {
            id: Set(cart_id),
            session_id: Set(request.session_id),
            client_id: Set(request.client_id),
            total: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let cart = cart_active_model.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create cart");
            ServiceError::DatabaseError(e)
        })?;

        info!(cart_id = %cart_id, "Cart created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::CartCreated(cart_id)).await;
        }

        Ok(CartResponse::from_models(cart, Vec::new()))
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartResponse, ServiceError> {
        let db = &*self.db_pool;
        let cart = find_cart(db, cart_id).await?;
        let items = self.load_items(cart_id).await?;
        Ok(CartResponse::from_models(cart, items))
    }

    /// Looks a cart up by the storefront session that created it. When a
    /// session has several carts the newest one wins.
    #[instrument(skip(self))]
    pub async fn find_by_session(&self, session_id: &str) -> Result<CartResponse, ServiceError> {
        let db = &*self.db_pool;
        let cart = CartEntity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .order_by_desc(cart::Column::CreatedAt)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, session_id = %session_id, "Failed to fetch cart by session");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart for session '{}' not found", session_id))
            })?;

        let items = self.load_items(cart.id).await?;
        Ok(CartResponse::from_models(cart, items))
    }

    /// Adds a product to the cart, merging into an existing line for the
    /// same product. The merged quantity decides the price tier.
    #[instrument(skip(self, request), fields(cart_id = %cart_id, product_id = %request.product_id))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        request: AddCartItemRequest,
    ) -> Result<CartResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to start transaction for cart add");
            ServiceError::DatabaseError(e)
        })?;

        let cart = find_cart(&txn, cart_id).await?;

        let product = ProductEntity::find_by_id(request.product_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %request.product_id, "Failed to fetch product for cart add");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(product_id = %request.product_id, "Product not found for cart add");
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;
        if !product.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Product '{}' is not available",
                product.code
            )));
        }

        let existing = CartItemEntity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(request.product_id))
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to look up existing cart line");
                ServiceError::DatabaseError(e)
            })?;

        match existing {
            Some(line) => {
                let quantity = line.quantity + request.quantity;
                let unit_price = pricing::resolve_unit_price(
                    product.unit_price,
                    product.wholesale_price,
                    product.min_wholesale_qty,
                    quantity,
                );
                let mut active_model: CartItemActiveModel = line.into();
                active_model.quantity = Set(quantity);
                active_model.unit_price = Set(unit_price);
                active_model.subtotal = Set(unit_price * Decimal::from(quantity));
                active_model.updated_at = Set(now);
                active_model.update(&txn).await.map_err(|e| {
                    error!(error = %e, cart_id = %cart_id, "Failed to merge cart line");
                    ServiceError::DatabaseError(e)
                })?;
            }
            None => {
                let unit_price = pricing::resolve_unit_price(
                    product.unit_price,
                    product.wholesale_price,
                    product.min_wholesale_qty,
                    request.quantity,
                );
                let item_active_model = CartItemActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart_id),
                    product_id: Set(request.product_id),
                    quantity: Set(request.quantity),
                    unit_price: Set(unit_price),
                    subtotal: Set(unit_price * Decimal::from(request.quantity)),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                item_active_model.insert(&txn).await.map_err(|e| {
                    error!(error = %e, cart_id = %cart_id, "Failed to insert cart line");
                    ServiceError::DatabaseError(e)
                })?;
            }
        }

        recompute_total(&txn, cart, now).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to commit cart add");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::CartItemAdded {
                    cart_id,
                    product_id: request.product_id,
                })
                .await;
        }

        self.get_cart(cart_id).await
    }

    /// Changes a line's quantity, re-resolving the tier price.
    #[instrument(skip(self, request), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn update_item(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        request: UpdateCartItemRequest,
    ) -> Result<CartResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to start transaction for cart update");
            ServiceError::DatabaseError(e)
        })?;

        let cart = find_cart(&txn, cart_id).await?;
        let line = find_cart_item(&txn, cart_id, item_id).await?;

        let product = ProductEntity::find_by_id(line.product_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %line.product_id, "Failed to fetch product for cart update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", line.product_id))
            })?;

        let unit_price = pricing::resolve_unit_price(
            product.unit_price,
            product.wholesale_price,
            product.min_wholesale_qty,
            request.quantity,
        );
        let mut active_model: CartItemActiveModel = line.into();
        active_model.quantity = Set(request.quantity);
        active_model.unit_price = Set(unit_price);
        active_model.subtotal = Set(unit_price * Decimal::from(request.quantity));
        active_model.updated_at = Set(now);
        active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to update cart line");
            ServiceError::DatabaseError(e)
        })?;

        recompute_total(&txn, cart, now).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to commit cart update");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::CartItemUpdated { cart_id, item_id })
                .await;
        }

        self.get_cart(cart_id).await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn remove_item(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to start transaction for cart removal");
            ServiceError::DatabaseError(e)
        })?;

        let cart = find_cart(&txn, cart_id).await?;
        let line = find_cart_item(&txn, cart_id, item_id).await?;

        CartItemEntity::delete_by_id(line.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = %item_id, "Failed to delete cart line");
                ServiceError::DatabaseError(e)
            })?;

        recompute_total(&txn, cart, now).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to commit cart removal");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::CartItemRemoved { cart_id, item_id })
                .await;
        }

        self.get_cart(cart_id).await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn clear_cart(&self, cart_id: Uuid) -> Result<CartResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to start transaction for cart clear");
            ServiceError::DatabaseError(e)
        })?;

        let cart = find_cart(&txn, cart_id).await?;

        CartItemEntity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to clear cart lines");
                ServiceError::DatabaseError(e)
            })?;

        let mut active_model: CartActiveModel = cart.into();
        active_model.total = Set(Decimal::ZERO);
        active_model.updated_at = Set(now);
        active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to reset cart total");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to commit cart clear");
            ServiceError::DatabaseError(e)
        })?;

        info!(cart_id = %cart_id, "Cart cleared");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::CartCleared(cart_id)).await;
        }

        self.get_cart(cart_id).await
    }

    /// Converts the cart into a pending order with the stored line
    /// prices, then discards the cart. One transaction covers both.
    #[instrument(skip(self, request), fields(cart_id = %cart_id))]
    pub async fn checkout(
        &self,
        cart_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to start transaction for checkout");
            ServiceError::DatabaseError(e)
        })?;

        let cart = find_cart(&txn, cart_id).await?;
        let lines = CartItemEntity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(ProductEntity)
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to fetch cart lines for checkout");
                ServiceError::DatabaseError(e)
            })?;
        if lines.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }

        let order_id = Uuid::new_v4();
        let order_number = next_order_number(&txn).await?;

        let order_active_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            client_id: Set(request.client_id.or(cart.client_id)),
            client_name: Set(request.client_name),
            client_email: Set(request.client_email),
            client_phone: Set(request.client_phone),
            status: Set(OrderStatus::Pendiente.to_string()),
            total: Set(cart.total),
            source_quotation_id: Set(None),
            notes: Set(request.notes),
            cancelado_en: Set(None),
            motivo_cancelacion: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to insert checkout order");
            ServiceError::DatabaseError(e)
        })?;

        let order_item_models: Vec<OrderItemActiveModel> = lines
            .iter()
            .enumerate()
            .map(|(position, (line, product))| {
                let (product_code, product_name) = product
                    .as_ref()
                    .map(|p| (p.code.clone(), p.name.clone()))
                    .unwrap_or_default();
                OrderItemActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    product_code: Set(product_code),
                    product_name: Set(product_name),
                    quantity: Set(line.quantity),
                    unit_price: Set(line.unit_price),
                    cost_price: Set(None),
                    subtotal: Set(line.subtotal),
                    position: Set(position as i32),
                    created_at: Set(now),
                }
            })
            .collect();
        crate::entities::order_item::Entity::insert_many(order_item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to insert checkout order items");
                ServiceError::DatabaseError(e)
            })?;

        CartItemEntity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to delete cart lines after checkout");
                ServiceError::DatabaseError(e)
            })?;
        CartEntity::delete_by_id(cart_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to delete cart after checkout");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to commit checkout");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            cart_id = %cart_id,
            order_id = %order_id,
            order_number = %order_number,
            "Cart checked out"
        );

        if let Some(events) = &self.event_sender {
            events
                .send_or_log(Event::CartCheckedOut { cart_id, order_id })
                .await;
            events.send_or_log(Event::OrderCreated(order_id)).await;
        }

        let order = crate::entities::order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError("Checkout order vanished after commit".to_string())
            })?;
        let order_items = crate::entities::order_item::Entity::find()
            .filter(crate::entities::order_item::Column::OrderId.eq(order_id))
            .order_by_asc(crate::entities::order_item::Column::Position)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderResponse::from_models(order, order_items))
    }

    async fn load_items(
        &self,
        cart_id: Uuid,
    ) -> Result<Vec<(CartItemModel, Option<ProductModel>)>, ServiceError> {
        let db = &*self.db_pool;
        CartItemEntity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(ProductEntity)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, cart_id = %cart_id, "Failed to fetch cart lines");
                ServiceError::DatabaseError(e)
            })
    }
}

async fn find_cart<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> Result<CartModel, ServiceError> {
    CartEntity::find_by_id(cart_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to fetch cart");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(cart_id = %cart_id, "Cart not found");
            ServiceError::NotFound(format!("Cart {} not found", cart_id))
        })
}

async fn find_cart_item<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    item_id: Uuid,
) -> Result<CartItemModel, ServiceError> {
    CartItemEntity::find_by_id(item_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to fetch cart line");
            ServiceError::DatabaseError(e)
        })?
        .filter(|line| line.cart_id == cart_id)
        .ok_or_else(|| {
            warn!(cart_id = %cart_id, item_id = %item_id, "Cart line not found");
            ServiceError::NotFound(format!("Cart item {} not found", item_id))
        })
}

/// Re-sums line subtotals into the cart header inside the caller's
/// transaction.
async fn recompute_total<C: ConnectionTrait>(
    conn: &C,
    cart: CartModel,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let cart_id = cart.id;
    let lines = CartItemEntity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, cart_id = %cart_id, "Failed to fetch lines for total recompute");
            ServiceError::DatabaseError(e)
        })?;
    let total: Decimal = lines.iter().map(|line| line.subtotal).sum();

    let mut active_model: CartActiveModel = cart.into();
    active_model.total = Set(total);
    active_model.updated_at = Set(now);
    active_model.update(conn).await.map_err(|e| {
        error!(error = %e, cart_id = %cart_id, "Failed to update cart total");
        ServiceError::DatabaseError(e)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_requires_a_contact_method() {
        let request = CheckoutRequest {
            client_id: None,
            client_name: "Constructora Andina".to_string(),
            client_email: None,
            client_phone: None,
            notes: None,
        };
        assert!(request.validate().is_err());

        let request = CheckoutRequest {
            client_phone: Some("987654321".to_string()),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let request = AddCartItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(request.validate().is_err());

        let request = UpdateCartItemRequest { quantity: 0 };
        assert!(request.validate().is_err());
    }
}

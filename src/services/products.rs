use crate::{
    db::DbPool,
    domain::pricing,
    entities::product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity,
        Model as ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<String>,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub unit_price: Decimal,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub wholesale_price: Decimal,
    #[validate(range(min = 1, message = "Wholesale threshold must be at least 1"))]
    pub min_wholesale_qty: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Product code cannot be empty"))]
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<String>,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub unit_price: Option<Decimal>,
    #[validate(custom = "crate::services::validate_non_negative_price")]
    pub wholesale_price: Option<Decimal>,
    #[validate(range(min = 1, message = "Wholesale threshold must be at least 1"))]
    pub min_wholesale_qty: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<String>,
    pub unit_price: Decimal,
    pub wholesale_price: Decimal,
    pub min_wholesale_qty: Option<i32>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ProductResponse {
    pub(crate) fn from_model(model: ProductModel) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            brand: model.brand,
            description: model.description,
            image_url: model.image_url,
            category_id: model.category_id,
            tags: model.tags,
            unit_price: model.unit_price,
            wholesale_price: model.wholesale_price,
            min_wholesale_qty: model.min_wholesale_qty,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Price quote for a product at a given quantity, after tier resolution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PriceQuoteResponse {
    pub product_id: Uuid,
    pub code: String,
    pub quantity: i32,
    /// Unit price actually charged at this quantity.
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    /// Whether the wholesale tier applied.
    pub wholesale_applied: bool,
    /// The threshold the quote was evaluated against.
    pub min_wholesale_qty: i32,
}

/// Service for managing the product catalog.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product. Codes are unique across the catalog.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let existing = ProductEntity::find()
            .filter(product::Column::Code.eq(request.code.as_str()))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, code = %request.code, "Failed to check for existing product code");
                ServiceError::DatabaseError(e)
            })?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with code '{}' already exists",
                request.code
            )));
        }

        let now = Utc::now();
        let product_id = Uuid::new_v4();
        let active_model = ProductActiveModel {
            id: Set(product_id),
            code: Set(request.code.clone()),
            name: Set(request.name),
            brand: Set(request.brand),
            description: Set(request.description),
            image_url: Set(request.image_url),
            category_id: Set(request.category_id),
            tags: Set(request.tags),
            unit_price: Set(request.unit_price),
            wholesale_price: Set(request.wholesale_price),
            min_wholesale_qty: Set(request.min_wholesale_qty),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, product_id = %product_id, "Failed to insert product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %product_id, code = %model.code, "Product created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ProductCreated(product_id)).await;
        }

        Ok(ProductResponse::from_model(model))
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let model = self.find_product(product_id).await?;
        Ok(ProductResponse::from_model(model))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_code(&self, code: &str) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = ProductEntity::find()
            .filter(product::Column::Code.eq(code))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, code = %code, "Failed to fetch product by code");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with code '{}' not found", code))
            })?;
        Ok(ProductResponse::from_model(model))
    }

    /// Lists products, most recent first. Inactive products are hidden
    /// unless explicitly requested.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
        category_id: Option<Uuid>,
        search: Option<String>,
        include_inactive: bool,
    ) -> Result<ProductListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ProductEntity::find();
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if !include_inactive {
            query = query.filter(product::Column::IsActive.eq(true));
        }
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let term = term.trim().to_string();
            query = query.filter(
                product::Column::Name
                    .contains(&term)
                    .or(product::Column::Code.contains(&term))
                    .or(product::Column::Brand.contains(&term)),
            );
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count products");
            ServiceError::DatabaseError(e)
        })?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch products page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ProductListResponse {
            products: models.into_iter().map(ProductResponse::from_model).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = self.find_product(product_id).await?;

        if let Some(code) = &request.code {
            if code != &model.code {
                let taken = ProductEntity::find()
                    .filter(product::Column::Code.eq(code.as_str()))
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                if taken.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Product with code '{}' already exists",
                        code
                    )));
                }
            }
        }

        let mut active_model: ProductActiveModel = model.into();
        if let Some(code) = request.code {
            active_model.code = Set(code);
        }
        if let Some(name) = request.name {
            active_model.name = Set(name);
        }
        if let Some(brand) = request.brand {
            active_model.brand = Set(Some(brand));
        }
        if let Some(description) = request.description {
            active_model.description = Set(Some(description));
        }
        if let Some(image_url) = request.image_url {
            active_model.image_url = Set(Some(image_url));
        }
        if let Some(category_id) = request.category_id {
            active_model.category_id = Set(Some(category_id));
        }
        if let Some(tags) = request.tags {
            active_model.tags = Set(Some(tags));
        }
        if let Some(unit_price) = request.unit_price {
            active_model.unit_price = Set(unit_price);
        }
        if let Some(wholesale_price) = request.wholesale_price {
            active_model.wholesale_price = Set(wholesale_price);
        }
        if let Some(min_wholesale_qty) = request.min_wholesale_qty {
            active_model.min_wholesale_qty = Set(Some(min_wholesale_qty));
        }
        if let Some(is_active) = request.is_active {
            active_model.is_active = Set(is_active);
        }
        active_model.updated_at = Set(Utc::now());

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, product_id = %product_id, "Failed to update product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %product_id, "Product updated");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ProductUpdated(product_id)).await;
        }

        Ok(ProductResponse::from_model(updated))
    }

    /// Hard delete. Cart lines referencing the product are removed by the
    /// schema's cascade rule.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let model = self.find_product(product_id).await?;

        ProductEntity::delete_by_id(model.id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to delete product");
                ServiceError::DatabaseError(e)
            })?;

        info!(product_id = %product_id, "Product deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ProductDeleted(product_id)).await;
        }

        Ok(())
    }

    /// Quotes the unit price and subtotal for a quantity, applying the
    /// wholesale tier when the threshold is met.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub async fn quote_price(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<PriceQuoteResponse, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let model = self.find_product(product_id).await?;
        let threshold = model
            .min_wholesale_qty
            .unwrap_or(pricing::DEFAULT_MIN_WHOLESALE_QTY);
        let unit_price = pricing::resolve_unit_price(
            model.unit_price,
            model.wholesale_price,
            model.min_wholesale_qty,
            quantity,
        );
        let subtotal = pricing::line_subtotal(
            model.unit_price,
            model.wholesale_price,
            model.min_wholesale_qty,
            quantity,
        );

        Ok(PriceQuoteResponse {
            product_id: model.id,
            code: model.code,
            quantity,
            unit_price,
            subtotal,
            wholesale_applied: quantity >= threshold,
            min_wholesale_qty: threshold,
        })
    }

    async fn find_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;
        ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to fetch product");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(product_id = %product_id, "Product not found");
                ServiceError::NotFound(format!("Product {} not found", product_id))
            })
    }
}

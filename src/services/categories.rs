use crate::{
    db::DbPool,
    entities::category::{self, ActiveModel as CategoryActiveModel, Entity as CategoryEntity,
        Model as CategoryModel},
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, message = "Category name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CategoryResponse {
    fn from_model(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at,
        }
    }
}

/// Service for managing product categories.
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a category. Names are unique.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let existing = CategoryEntity::find()
            .filter(category::Column::Name.eq(request.name.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                request.name
            )));
        }

        let category_id = Uuid::new_v4();
        let active_model = CategoryActiveModel {
            id: Set(category_id),
            name: Set(request.name),
            description: Set(request.description),
            image_url: Set(request.image_url),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, category_id = %category_id, "Failed to insert category");
            ServiceError::DatabaseError(e)
        })?;

        info!(category_id = %category_id, name = %model.name, "Category created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::CategoryCreated(category_id)).await;
        }

        Ok(CategoryResponse::from_model(model))
    }

    /// Lists all categories sorted by name.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let db = &*self.db_pool;
        let models = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list categories");
                ServiceError::DatabaseError(e)
            })?;

        Ok(models.into_iter().map(CategoryResponse::from_model).collect())
    }

    #[instrument(skip(self, request), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = self.find_category(category_id).await?;

        if let Some(name) = &request.name {
            if name != &model.name {
                let taken = CategoryEntity::find()
                    .filter(category::Column::Name.eq(name.as_str()))
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                if taken.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Category '{}' already exists",
                        name
                    )));
                }
            }
        }

        let mut active_model: CategoryActiveModel = model.into();
        if let Some(name) = request.name {
            active_model.name = Set(name);
        }
        if let Some(description) = request.description {
            active_model.description = Set(Some(description));
        }
        if let Some(image_url) = request.image_url {
            active_model.image_url = Set(Some(image_url));
        }

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, category_id = %category_id, "Failed to update category");
            ServiceError::DatabaseError(e)
        })?;

        info!(category_id = %category_id, "Category updated");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::CategoryUpdated(category_id)).await;
        }

        Ok(CategoryResponse::from_model(updated))
    }

    /// Deletes a category and detaches its products; the products
    /// themselves are kept.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let model = self.find_category(category_id).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for category deletion");
            ServiceError::DatabaseError(e)
        })?;

        ProductEntity::update_many()
            .col_expr(product::Column::CategoryId, Expr::value(Option::<Uuid>::None))
            .filter(product::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to detach products from category");
                ServiceError::DatabaseError(e)
            })?;

        CategoryEntity::delete_by_id(model.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to delete category");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, category_id = %category_id, "Failed to commit category deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(category_id = %category_id, "Category deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::CategoryDeleted(category_id)).await;
        }

        Ok(())
    }

    async fn find_category(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        let db = &*self.db_pool;
        CategoryEntity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to fetch category");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(category_id = %category_id, "Category not found");
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_name() {
        let request = CreateCategoryRequest {
            name: String::new(),
            description: None,
            image_url: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn response_mirrors_model() {
        let model = CategoryModel {
            id: Uuid::new_v4(),
            name: "Baldes".to_string(),
            description: Some("Baldes y recipientes".to_string()),
            image_url: None,
            created_at: Utc::now(),
        };
        let id = model.id;
        let response = CategoryResponse::from_model(model);
        assert_eq!(response.id, id);
        assert_eq!(response.name, "Baldes");
    }
}

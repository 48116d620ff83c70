use crate::{
    db::DbPool,
    entities::supplier::{self, ActiveModel as SupplierActiveModel, Entity as SupplierEntity,
        Model as SupplierModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name is required"))]
    pub name: String,
    pub ruc: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name cannot be empty"))]
    pub name: Option<String>,
    pub ruc: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierResponse {
    pub id: Uuid,
    pub name: String,
    pub ruc: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierResponse {
    fn from_model(supplier: SupplierModel) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name,
            ruc: supplier.ruc,
            contact_name: supplier.contact_name,
            email: supplier.email,
            phone: supplier.phone,
            address: supplier.address,
            notes: supplier.notes,
            created_at: supplier.created_at,
            updated_at: supplier.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierListResponse {
    pub suppliers: Vec<SupplierResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for supplier reference records.
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let supplier_id = Uuid::new_v4();

        let supplier_active_model = SupplierActiveModel {
            id: Set(supplier_id),
            name: Set(request.name),
            ruc: Set(request.ruc),
            contact_name: Set(request.contact_name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let supplier = supplier_active_model.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create supplier");
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_id = %supplier_id, "Supplier created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::SupplierCreated(supplier_id)).await;
        }

        Ok(SupplierResponse::from_model(supplier))
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<SupplierResponse, ServiceError> {
        let db = &*self.db_pool;
        let supplier = find_supplier(db, supplier_id).await?;
        Ok(SupplierResponse::from_model(supplier))
    }

    /// Lists suppliers, optionally filtered by a term matched against
    /// name and RUC.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<SupplierListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = SupplierEntity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(supplier::Column::Name.contains(term))
                    .add(supplier::Column::Ruc.contains(term)),
            );
        }

        let paginator = query
            .order_by_asc(supplier::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count suppliers");
            ServiceError::DatabaseError(e)
        })?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch suppliers page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(SupplierListResponse {
            suppliers: suppliers
                .into_iter()
                .map(SupplierResponse::from_model)
                .collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(supplier_id = %supplier_id))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        request: UpdateSupplierRequest,
    ) -> Result<SupplierResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let supplier = find_supplier(db, supplier_id).await?;

        let mut active_model: SupplierActiveModel = supplier.into();
        if let Some(name) = request.name {
            active_model.name = Set(name);
        }
        if let Some(ruc) = request.ruc {
            active_model.ruc = Set(Some(ruc));
        }
        if let Some(contact_name) = request.contact_name {
            active_model.contact_name = Set(Some(contact_name));
        }
        if let Some(email) = request.email {
            active_model.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            active_model.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active_model.address = Set(Some(address));
        }
        if let Some(notes) = request.notes {
            active_model.notes = Set(Some(notes));
        }
        active_model.updated_at = Set(Utc::now());

        let supplier = active_model.update(db).await.map_err(|e| {
            error!(error = %e, supplier_id = %supplier_id, "Failed to update supplier");
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_id = %supplier_id, "Supplier updated");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::SupplierUpdated(supplier_id)).await;
        }

        Ok(SupplierResponse::from_model(supplier))
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let supplier = find_supplier(db, supplier_id).await?;

        SupplierEntity::delete_by_id(supplier.id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, supplier_id = %supplier_id, "Failed to delete supplier");
                ServiceError::DatabaseError(e)
            })?;

        info!(supplier_id = %supplier_id, "Supplier deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::SupplierDeleted(supplier_id)).await;
        }

        Ok(())
    }
}

async fn find_supplier<C: sea_orm::ConnectionTrait>(
    conn: &C,
    supplier_id: Uuid,
) -> Result<SupplierModel, ServiceError> {
    SupplierEntity::find_by_id(supplier_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, supplier_id = %supplier_id, "Failed to fetch supplier");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(supplier_id = %supplier_id, "Supplier not found");
            ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_name_is_required() {
        let request = CreateSupplierRequest {
            name: "".to_string(),
            ruc: None,
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }
}

use crate::{
    db::DbPool,
    entities::cart,
    entities::client::{self, ActiveModel as ClientActiveModel, Entity as ClientEntity,
        Model as ClientModel},
    entities::order,
    entities::quotation,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_false() -> bool {
    false
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    /// Marks a company client; companies carry razón social and RUC.
    #[serde(default = "default_false")]
    pub es_empresa: bool,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub name: String,
    pub razon_social: Option<String>,
    pub ruc: Option<String>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    pub es_empresa: Option<bool>,
    #[validate(length(min = 1, message = "Client name cannot be empty"))]
    pub name: Option<String>,
    pub razon_social: Option<String>,
    pub ruc: Option<String>,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

// Rules that span fields: a company record is useless without its razón
// social, and every client must be reachable somehow.
fn ensure_client_shape(
    es_empresa: bool,
    razon_social: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), ServiceError> {
    let has_razon_social = razon_social.map(str::trim).filter(|s| !s.is_empty()).is_some();
    if es_empresa && !has_razon_social {
        return Err(ServiceError::ValidationError(
            "Companies require a razón social".to_string(),
        ));
    }
    let has_email = email.map(str::trim).filter(|s| !s.is_empty()).is_some();
    let has_phone = phone.map(str::trim).filter(|s| !s.is_empty()).is_some();
    if !has_email && !has_phone {
        return Err(ServiceError::ValidationError(
            "At least one contact method (email or phone) is required".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub id: Uuid,
    pub es_empresa: bool,
    pub name: String,
    pub razon_social: Option<String>,
    pub ruc: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Razón social for companies, contact name otherwise.
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientResponse {
    fn from_model(client: ClientModel) -> Self {
        let display_name = client.display_name().to_string();
        Self {
            id: client.id,
            es_empresa: client.es_empresa,
            name: client.name,
            razon_social: client.razon_social,
            ruc: client.ruc,
            email: client.email,
            phone: client.phone,
            address: client.address,
            notes: client.notes,
            display_name,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientListResponse {
    pub clients: Vec<ClientResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for customer records.
#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_client(
        &self,
        request: CreateClientRequest,
    ) -> Result<ClientResponse, ServiceError> {
        request.validate()?;
        ensure_client_shape(
            request.es_empresa,
            request.razon_social.as_deref(),
            request.email.as_deref(),
            request.phone.as_deref(),
        )?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let client_id = Uuid::new_v4();

        let client_active_model = ClientActiveModel {
            id: Set(client_id),
            es_empresa: Set(request.es_empresa),
            name: Set(request.name),
            razon_social: Set(request.razon_social),
            ruc: Set(request.ruc),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let client = client_active_model.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create client");
            ServiceError::DatabaseError(e)
        })?;

        info!(client_id = %client_id, "Client created");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ClientCreated(client_id)).await;
        }

        Ok(ClientResponse::from_model(client))
    }

    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn get_client(&self, client_id: Uuid) -> Result<ClientResponse, ServiceError> {
        let db = &*self.db_pool;
        let client = find_client(db, client_id).await?;
        Ok(ClientResponse::from_model(client))
    }

    /// Lists clients, optionally filtered by a term matched against
    /// name, razón social and RUC.
    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<ClientListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ClientEntity::find();
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(client::Column::Name.contains(term))
                    .add(client::Column::RazonSocial.contains(term))
                    .add(client::Column::Ruc.contains(term)),
            );
        }

        let paginator = query
            .order_by_asc(client::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count clients");
            ServiceError::DatabaseError(e)
        })?;
        let clients = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch clients page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ClientListResponse {
            clients: clients.into_iter().map(ClientResponse::from_model).collect(),
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, request), fields(client_id = %client_id))]
    pub async fn update_client(
        &self,
        client_id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<ClientResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let client = find_client(db, client_id).await?;

        // Fields absent from the request keep their stored value, so the
        // shape rules run against the merged record.
        ensure_client_shape(
            request.es_empresa.unwrap_or(client.es_empresa),
            request
                .razon_social
                .as_deref()
                .or(client.razon_social.as_deref()),
            request.email.as_deref().or(client.email.as_deref()),
            request.phone.as_deref().or(client.phone.as_deref()),
        )?;

        let mut active_model: ClientActiveModel = client.into();
        if let Some(es_empresa) = request.es_empresa {
            active_model.es_empresa = Set(es_empresa);
        }
        if let Some(name) = request.name {
            active_model.name = Set(name);
        }
        if let Some(razon_social) = request.razon_social {
            active_model.razon_social = Set(Some(razon_social));
        }
        if let Some(ruc) = request.ruc {
            active_model.ruc = Set(Some(ruc));
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

        let client = active_model.update(db).await.map_err(|e| {
            error!(error = %e, client_id = %client_id, "Failed to update client");
            ServiceError::DatabaseError(e)
        })?;

        info!(client_id = %client_id, "Client updated");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ClientUpdated(client_id)).await;
        }

        Ok(ClientResponse::from_model(client))
    }

    /// Deletes a client. Orders, quotations and carts keep their
    /// snapshot fields and are detached, not removed.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn delete_client(&self, client_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, client_id = %client_id, "Failed to start transaction for client deletion");
            ServiceError::DatabaseError(e)
        })?;

        let client = find_client(&txn, client_id).await?;

        order::Entity::update_many()
            .col_expr(order::Column::ClientId, Expr::value(Option::<Uuid>::None))
            .filter(order::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, client_id = %client_id, "Failed to detach orders from client");
                ServiceError::DatabaseError(e)
            })?;
        quotation::Entity::update_many()
            .col_expr(
                quotation::Column::ClientId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(quotation::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, client_id = %client_id, "Failed to detach quotations from client");
                ServiceError::DatabaseError(e)
            })?;
        cart::Entity::update_many()
            .col_expr(cart::Column::ClientId, Expr::value(Option::<Uuid>::None))
            .filter(cart::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, client_id = %client_id, "Failed to detach carts from client");
                ServiceError::DatabaseError(e)
            })?;

        ClientEntity::delete_by_id(client.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, client_id = %client_id, "Failed to delete client");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, client_id = %client_id, "Failed to commit client deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(client_id = %client_id, "Client deleted");

        if let Some(events) = &self.event_sender {
            events.send_or_log(Event::ClientDeleted(client_id)).await;
        }

        Ok(())
    }
}

async fn find_client<C: sea_orm::ConnectionTrait>(
    conn: &C,
    client_id: Uuid,
) -> Result<ClientModel, ServiceError> {
    ClientEntity::find_by_id(client_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, client_id = %client_id, "Failed to fetch client");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(client_id = %client_id, "Client not found");
            ServiceError::NotFound(format!("Client {} not found", client_id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_responses_surface_razon_social() {
        let client = ClientModel {
            id: Uuid::new_v4(),
            es_empresa: true,
            name: "María Torres".to_string(),
            razon_social: Some("Distribuciones Torres EIRL".to_string()),
            ruc: Some("20512345678".to_string()),
            email: None,
            phone: None,
            address: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = ClientResponse::from_model(client);
        assert_eq!(response.display_name, "Distribuciones Torres EIRL");
        assert_eq!(response.name, "María Torres");
    }

    #[test]
    fn invalid_email_is_rejected() {
        let request = CreateClientRequest {
            es_empresa: false,
            name: "Cliente".to_string(),
            razon_social: None,
            ruc: None,
            email: Some("not-an-email".to_string()),
            phone: None,
            address: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }
}

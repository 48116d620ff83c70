#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use distriplast_api::{
    config::AppConfig,
    db,
    entities::{order, quotation},
    events::{self, EventSender},
    handlers::AppServices,
    request_id::request_id_middleware,
    services::products::{CreateProductRequest, ProductResponse},
    AppState,
};

/// Harness that runs the full router against a fresh in-memory SQLite
/// database. The pool is pinned to a single connection so the in-memory
/// schema survives for the lifetime of the app, and every `TestApp` gets
/// its own database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080, "test");
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::from_config(db_arc.clone(), Some(event_sender.clone()), &cfg);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", distriplast_api::api_v1_routes())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends a request against the router. A JSON body implies the
    /// content-type header.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body alongside the status
    /// code. Bodiless responses (204) decode to `Value::Null`.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not valid json")
        };
        (status, json)
    }

    /// Creates an active catalog product through the service layer.
    pub async fn seed_product(
        &self,
        code: &str,
        unit_price: Decimal,
        wholesale_price: Decimal,
        min_wholesale_qty: Option<i32>,
    ) -> ProductResponse {
        self.state
            .services
            .products
            .create_product(CreateProductRequest {
                code: code.to_string(),
                name: format!("Producto {}", code),
                brand: Some("Rey".to_string()),
                description: None,
                image_url: None,
                category_id: None,
                tags: None,
                unit_price,
                wholesale_price,
                min_wholesale_qty,
                is_active: true,
            })
            .await
            .expect("seed product for tests")
    }

    /// Inserts an order row directly, bypassing the service layer, so tests
    /// can stage backdated and legacy-status data.
    pub async fn insert_order_row(
        &self,
        order_number: &str,
        status: &str,
        total: Decimal,
        client_email: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let row = order::ActiveModel {
            id: Set(id),
            order_number: Set(order_number.to_string()),
            client_id: Set(None),
            client_name: Set("Cliente Histórico".to_string()),
            client_email: Set(client_email.map(|s| s.to_string())),
            client_phone: Set(None),
            status: Set(status.to_string()),
            total: Set(total),
            source_quotation_id: Set(None),
            notes: Set(None),
            cancelado_en: Set(None),
            motivo_cancelacion: Set(None),
            created_at: Set(created_at),
            updated_at: Set(None),
        };
        row.insert(&*self.state.db)
            .await
            .expect("insert order row for tests");
        id
    }

    /// Inserts a quotation row directly with a chosen creation date.
    pub async fn insert_quotation_row(
        &self,
        quotation_number: &str,
        status: &str,
        total: Decimal,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let row = quotation::ActiveModel {
            id: Set(id),
            quotation_number: Set(quotation_number.to_string()),
            client_id: Set(None),
            client_name: Set("Cliente Histórico".to_string()),
            client_email: Set(None),
            client_phone: Set(None),
            status: Set(status.to_string()),
            total: Set(total),
            generated_order_id: Set(None),
            notes: Set(None),
            valid_until: Set(None),
            created_at: Set(created_at),
            updated_at: Set(None),
        };
        row.insert(&*self.state.db)
            .await
            .expect("insert quotation row for tests");
        id
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Parses a decimal field that the API serializes as a string. Comparing
/// the parsed value keeps assertions independent of the scale SQLite
/// hands back.
pub fn decimal_field(value: &Value, field: &str) -> Decimal {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("field '{}' is not a decimal string in {}", field, value))
        .parse()
        .expect("invalid decimal in response")
}

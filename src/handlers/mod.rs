pub mod analytics;
pub mod carts;
pub mod categories;
pub mod clients;
pub mod common;
pub mod orders;
pub mod products;
pub mod quotations;
pub mod suppliers;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    analytics::AnalyticsService, carts::CartService, categories::CategoryService,
    clients::ClientService, orders::OrderService, products::ProductService,
    quotations::QuotationService, suppliers::SupplierService,
};

// Handler modules take their state as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
    pub clients: Arc<ClientService>,
    pub suppliers: Arc<SupplierService>,
    pub orders: Arc<OrderService>,
    pub quotations: Arc<QuotationService>,
    pub carts: Arc<CartService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        whatsapp_country_code: String,
    ) -> Self {
        let products = Arc::new(ProductService::new(db_pool.clone(), event_sender.clone()));
        let categories = Arc::new(CategoryService::new(db_pool.clone(), event_sender.clone()));
        let clients = Arc::new(ClientService::new(db_pool.clone(), event_sender.clone()));
        let suppliers = Arc::new(SupplierService::new(db_pool.clone(), event_sender.clone()));
        let orders = Arc::new(OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            whatsapp_country_code.clone(),
        ));
        let quotations = Arc::new(QuotationService::new(
            db_pool.clone(),
            event_sender.clone(),
            whatsapp_country_code,
        ));
        let carts = Arc::new(CartService::new(db_pool.clone(), event_sender));
        let analytics = Arc::new(AnalyticsService::new(db_pool));

        Self {
            products,
            categories,
            clients,
            suppliers,
            orders,
            quotations,
            carts,
            analytics,
        }
    }

    /// Wiring used by `main` and the integration tests: one container
    /// with the country code taken from config.
    pub fn from_config(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        config: &AppConfig,
    ) -> Self {
        Self::new(db_pool, event_sender, config.whatsapp_country_code.clone())
    }
}

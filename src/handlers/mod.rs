pub mod health;
pub mod movements;
pub mod orders;
pub mod products;
pub mod warehouses;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub movements: Arc<crate::services::movements::MovementService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub warehouses: Arc<crate::services::warehouses::WarehouseService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            orders: Arc::new(crate::services::orders::OrderService::new(
                db_pool.clone(),
                Some(event_sender),
            )),
            movements: Arc::new(crate::services::movements::MovementService::new(
                db_pool.clone(),
            )),
            products: Arc::new(crate::services::products::ProductService::new(
                db_pool.clone(),
            )),
            warehouses: Arc::new(crate::services::warehouses::WarehouseService::new(db_pool)),
        }
    }
}

pub mod dashboard;
pub mod invoices;
pub mod items;

use std::sync::Arc;

use crate::db::DbPool;
use crate::services::{
    dashboard::DashboardService, invoices::InvoiceService, items::ItemService,
};

/// Aggregated services used by the HTTP handlers. Each service receives the
/// shared connection pool at construction; nothing reaches for global state.
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub invoices: Arc<InvoiceService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            items: Arc::new(ItemService::new(db_pool.clone())),
            invoices: Arc::new(InvoiceService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool)),
        }
    }
}

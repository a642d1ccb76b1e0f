pub mod dashboard;
pub mod inventory;
pub mod purchase_orders;
pub mod settings;
pub mod sync;
pub mod vendors;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    cache::CacheHandle,
    config::AppConfig,
    events::{EventSender, RecentEvents},
    services::{
        DashboardService, InventoryService, PurchaseOrderService, SettingsService, VendorService,
    },
    sync::SyncService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: InventoryService,
    pub vendors: VendorService,
    pub purchase_orders: PurchaseOrderService,
    pub settings: SettingsService,
    pub dashboard: DashboardService,
    pub sync: SyncService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: CacheHandle,
        event_sender: EventSender,
        recent_events: RecentEvents,
        config: AppConfig,
    ) -> Self {
        let inventory = InventoryService::new(db.clone(), cache.clone(), event_sender.clone());
        let vendors = VendorService::new(db.clone(), cache.clone());
        let settings = SettingsService::new(db.clone(), config.clone());
        let purchase_orders = PurchaseOrderService::new(
            db.clone(),
            event_sender.clone(),
            settings.clone(),
            config.clone(),
        );
        let dashboard = DashboardService::new(db.clone(), cache.clone(), recent_events);
        let sync = SyncService::new(
            db,
            inventory.clone(),
            vendors.clone(),
            settings.clone(),
            event_sender,
            config,
        );
        Self {
            inventory,
            vendors,
            purchase_orders,
            settings,
            dashboard,
            sync,
        }
    }
}

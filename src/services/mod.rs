pub mod dashboard;
pub mod inventory;
pub mod purchase_orders;
pub mod settings;
pub mod vendors;

pub use dashboard::DashboardService;
pub use inventory::InventoryService;
pub use purchase_orders::PurchaseOrderService;
pub use settings::SettingsService;
pub use vendors::VendorService;

pub mod audit_log;
pub mod inventory_item;
pub mod purchase_order;
pub mod setting;
pub mod sync_log;
pub mod vendor;

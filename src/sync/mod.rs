//! Sync pipeline: fetch from Finale, detect changes, upsert, refresh caches,
//! and keep the `sync_logs` audit trail.

pub mod change_detection;
pub mod service;

pub use service::{SyncRunReport, SyncService, SyncStatus, SyncType};

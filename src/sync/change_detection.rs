//! Hash-based change detection for smart sync.
//!
//! This is a cost-reduction heuristic: unchanged rows are skipped, changed
//! rows are written in priority order. It is not a consistency mechanism.

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

use crate::finale::FinaleProductRow;

/// What we remember about an already-synced row.
#[derive(Clone, Debug)]
pub struct ExistingItemState {
    pub content_hash: Option<String>,
    pub last_synced: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPriority {
    Normal,
    Stale,
    Critical,
}

#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Changed or new rows, highest priority first.
    pub to_sync: Vec<FinaleProductRow>,
    pub unchanged_count: usize,
}

/// Hours after which an unchanged-looking row is still considered stale
/// enough to bump in priority once it does change.
const STALE_AFTER_HOURS: i64 = 24;

/// Stable content hash over the fields the sync writes. Field order matters;
/// changing it invalidates every stored hash.
pub fn content_hash(row: &FinaleProductRow) -> String {
    let mut hasher = Sha256::new();
    hasher.update(row.sku.as_bytes());
    hasher.update(b"|");
    hasher.update(row.product_name.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(row.quantity_on_hand.unwrap_or(0).to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(
        row.unit_cost
            .map(|c| c.normalize().to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    hasher.update(b"|");
    hasher.update(row.reorder_point.unwrap_or(0).to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(row.supplier.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(row.location.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(
        row.sales_velocity
            .map(|v| v.normalize().to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

fn priority_of(row: &FinaleProductRow, existing: Option<&ExistingItemState>) -> SyncPriority {
    if row.quantity_on_hand.unwrap_or(0) <= 0 {
        return SyncPriority::Critical;
    }
    let stale = existing
        .and_then(|state| state.last_synced)
        .map(|t| Utc::now().naive_utc() - t > chrono::Duration::hours(STALE_AFTER_HOURS))
        .unwrap_or(true);
    if stale {
        SyncPriority::Stale
    } else {
        SyncPriority::Normal
    }
}

/// Partitions incoming rows into changed (ordered by priority) and unchanged.
pub fn partition(
    incoming: Vec<FinaleProductRow>,
    existing: &HashMap<String, ExistingItemState>,
) -> ChangeSet {
    let mut changed: Vec<(SyncPriority, FinaleProductRow)> = Vec::new();
    let mut unchanged_count = 0usize;

    for row in incoming {
        let state = existing.get(&row.sku);
        let hash = content_hash(&row);
        let is_unchanged = state
            .and_then(|s| s.content_hash.as_deref())
            .map(|stored| stored == hash)
            .unwrap_or(false);

        if is_unchanged {
            unchanged_count += 1;
        } else {
            changed.push((priority_of(&row, state), row));
        }
    }

    changed.sort_by(|a, b| b.0.cmp(&a.0));

    ChangeSet {
        to_sync: changed.into_iter().map(|(_, row)| row).collect(),
        unchanged_count,
    }
}

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Events emitted by the sync and purchase-order flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SyncStarted {
        sync_type: String,
        sync_id: Uuid,
    },
    SyncCompleted {
        sync_type: String,
        sync_id: Uuid,
        status: String,
        items_processed: i32,
        items_updated: i32,
    },
    InventoryItemUpserted {
        sku: String,
    },
    PurchaseOrderCreated {
        id: Uuid,
        order_number: String,
    },
    PurchaseOrderStatusChanged {
        id: Uuid,
        old_status: String,
        new_status: String,
    },
}

impl Event {
    fn summary(&self) -> String {
        match self {
            Event::SyncStarted { sync_type, .. } => format!("{} sync started", sync_type),
            Event::SyncCompleted {
                sync_type, status, ..
            } => format!("{} sync finished: {}", sync_type, status),
            Event::InventoryItemUpserted { sku } => format!("inventory item {} updated", sku),
            Event::PurchaseOrderCreated { order_number, .. } => {
                format!("purchase order {} created", order_number)
            }
            Event::PurchaseOrderStatusChanged {
                old_status,
                new_status,
                ..
            } => format!("purchase order {} -> {}", old_status, new_status),
        }
    }
}

/// An event as surfaced on the live-updates feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub at: DateTime<Utc>,
    pub summary: String,
    #[serde(flatten)]
    pub event: Event,
}

const RECENT_EVENTS_CAPACITY: usize = 100;

/// Bounded buffer of recent events backing `/dashboard/live-updates`.
#[derive(Clone, Default)]
pub struct RecentEvents {
    inner: Arc<RwLock<VecDeque<EventRecord>>>,
}

impl RecentEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        let record = EventRecord {
            at: Utc::now(),
            summary: event.summary(),
            event,
        };
        let mut buf = self.inner.write().unwrap();
        if buf.len() == RECENT_EVENTS_CAPACITY {
            buf.pop_front();
        }
        buf.push_back(record);
    }

    /// Most recent first.
    pub fn snapshot(&self, limit: usize) -> Vec<EventRecord> {
        let buf = self.inner.read().unwrap();
        buf.iter().rev().take(limit).cloned().collect()
    }
}

#[derive(Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Event processing loop: logs each event and records it on the live feed.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, recent: RecentEvents) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(?event, "Received event");
        recent.push(event);
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_events_are_bounded_and_newest_first() {
        let recent = RecentEvents::new();
        for i in 0..150 {
            recent.push(Event::InventoryItemUpserted {
                sku: format!("SKU-{}", i),
            });
        }
        let snapshot = recent.snapshot(200);
        assert_eq!(snapshot.len(), RECENT_EVENTS_CAPACITY);
        assert!(snapshot[0].summary.contains("SKU-149"));
    }

    #[tokio::test]
    async fn processor_records_sent_events() {
        let (tx, rx) = mpsc::channel(16);
        let sender = EventSender::new(tx);
        let recent = RecentEvents::new();
        let task = tokio::spawn(process_events(rx, recent.clone()));

        sender
            .send(Event::SyncStarted {
                sync_type: "inventory".into(),
                sync_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        drop(sender);
        task.await.unwrap();

        let snapshot = recent.snapshot(10);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].summary, "inventory sync started");
    }
}

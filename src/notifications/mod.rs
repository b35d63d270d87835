//! Push notifications for catalog changes
//!
//! Every successful create, update and delete produces one [`CatalogEvent`],
//! fanned out by the [`NotificationHub`] to the observers connected at that
//! moment. Delivery is best-effort: there is no acknowledgement, retry, or
//! queueing for observers that are not connected.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::Entry;

pub mod observer;

pub use observer::{ObserverClient, ReconnectPolicy};

/// Events buffered per observer before a slow one starts skipping
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

pub type EventReceiver = broadcast::Receiver<CatalogEvent>;

/// Change event pushed to observers, encoded as `{"type": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum CatalogEvent {
    EntryAdded(Entry),
    EntryUpdated(Entry),
    /// Carries the identifier of the removed entry
    EntryDeleted(u64),
}

impl CatalogEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogEvent::EntryAdded(_) => "entryAdded",
            CatalogEvent::EntryUpdated(_) => "entryUpdated",
            CatalogEvent::EntryDeleted(_) => "entryDeleted",
        }
    }
}

/// Fan-out broadcaster shared by the service layer and the push endpoint
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<CatalogEvent>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new observer. Only events broadcast after this call are seen.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send `event` to every connected observer and return how many there were.
    /// With nobody connected this is a silent no-op.
    pub fn broadcast(&self, event: CatalogEvent) -> usize {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(observers) => {
                debug!(event = kind, observers, "Catalog event broadcast");
                observers
            }
            Err(_) => {
                debug!(event = kind, "No observers connected, event dropped");
                0
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

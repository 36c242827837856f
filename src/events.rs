//! Data-change and sync-status notifications.
//!
//! The storage service publishes a [`DataChange`] for every mutation and the
//! sync service drives the [`SyncStatus`]. Consumers subscribe through the
//! store without knowing which side produced an event.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Capacity of the data-change channel before slow receivers lag.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A synced collection (one local table, one remote endpoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Schools,
    Users,
    Students,
    Attendance,
    Performance,
    Terms,
    Messages,
    Schedule,
    Exams,
}

impl Collection {
    /// Every collection, in the order a refresh applies them.
    pub const ALL: [Collection; 9] = [
        Collection::Schools,
        Collection::Users,
        Collection::Students,
        Collection::Attendance,
        Collection::Performance,
        Collection::Terms,
        Collection::Messages,
        Collection::Schedule,
        Collection::Exams,
    ];

    /// Path segment used by the remote backend.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Schools => "schools",
            Collection::Users => "users",
            Collection::Students => "students",
            Collection::Attendance => "attendance",
            Collection::Performance => "performance",
            Collection::Terms => "terms",
            Collection::Messages => "messages",
            Collection::Schedule => "schedule",
            Collection::Exams => "exams",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What happened to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Upserted(String),
    Deleted(String),
    /// Whole collection replaced by a refresh.
    Reloaded,
}

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub origin: ChangeOrigin,
}

impl DataChange {
    pub fn upserted(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            kind: ChangeKind::Upserted(id.into()),
            origin: ChangeOrigin::Local,
        }
    }

    pub fn deleted(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            kind: ChangeKind::Deleted(id.into()),
            origin: ChangeOrigin::Local,
        }
    }

    pub fn reloaded(collection: Collection) -> Self {
        Self {
            collection,
            kind: ChangeKind::Reloaded,
            origin: ChangeOrigin::Remote,
        }
    }
}

/// Sync state as shown in the status line.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced {
        at: DateTime<Utc>,
        records: usize,
    },
    Error(String),
}

impl SyncStatus {
    /// Short status text.
    pub fn label(&self) -> String {
        match self {
            SyncStatus::Idle => "idle".to_string(),
            SyncStatus::Syncing => "syncing".to_string(),
            SyncStatus::Synced { at, records } => {
                format!("synced {records} records at {}", at.format("%Y-%m-%d %H:%M:%S"))
            }
            SyncStatus::Error(e) => format!("error: {e}"),
        }
    }
}

/// Shared publish/subscribe channels.
#[derive(Clone)]
pub struct EventBus {
    changes: broadcast::Sender<DataChange>,
    status: Arc<watch::Sender<SyncStatus>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            changes,
            status: Arc::new(status),
        }
    }

    /// Publish a change; having no subscribers is not an error.
    pub fn publish(&self, change: DataChange) {
        let _ = self.changes.send(change);
    }

    pub fn subscribe_to_data_changes(&self) -> broadcast::Receiver<DataChange> {
        self.changes.subscribe()
    }

    pub fn subscribe_to_sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn set_status(&self, status: SyncStatus) {
        self.status.send_replace(status);
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

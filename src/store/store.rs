use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::notification::{NotificationId, NotificationRecord};

use super::{reducer, Action, Dispatch};

/// Snapshot of the active notification list
pub type Notifications = Arc<Vec<NotificationRecord>>;

/// Counters of actions dispatched to the store
#[derive(Debug, Default)]
pub struct StoreStats {
    pub added: AtomicU64,
    pub updated: AtomicU64,
    pub removed: AtomicU64,
    pub cleared: AtomicU64,
}

impl StoreStats {
    fn record(&self, action: &Action) {
        let counter = match action {
            Action::AddNotification(_) => &self.added,
            Action::UpdateNotification(_) => &self.updated,
            Action::RemoveNotification(_) => &self.removed,
            Action::RemoveNotifications => &self.cleared,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StoreStatsSnapshot {
        StoreStatsSnapshot {
            added: self.added.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            cleared: self.cleared.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatsSnapshot {
    pub added: u64,
    pub updated: u64,
    pub removed: u64,
    pub cleared: u64,
}

/// Shared ordered list of active notifications.
///
/// `dispatch` is the only way to change the list. Readers take a
/// snapshot or subscribe to change notifications.
pub struct NotificationStore {
    state: watch::Sender<Notifications>,
    next_id: AtomicU64,
    stats: StoreStats,
}

impl NotificationStore {
    /// Create a store with an empty active list
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            state,
            next_id: AtomicU64::new(1),
            stats: StoreStats::default(),
        }
    }

    /// Current active list
    pub fn snapshot(&self) -> Notifications {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the active list changes
    pub fn subscribe(&self) -> watch::Receiver<Notifications> {
        self.state.subscribe()
    }

    /// Current record for `id`, if active
    pub fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.state.borrow().iter().find(|n| n.id == id).cloned()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.state.borrow().iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Allocate an id not used by any active notification
    pub fn next_id(&self) -> NotificationId {
        loop {
            let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed));
            if !self.contains(id) {
                return id;
            }
        }
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for NotificationStore {
    fn dispatch(&self, action: Action) {
        self.stats.record(&action);
        let kind = action.kind();

        let changed = self
            .state
            .send_if_modified(|list| reducer::reduce(Arc::make_mut(list), action));

        tracing::debug!(action = kind, changed = changed, "Action dispatched");
    }
}

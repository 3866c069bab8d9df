//! Notification store: the ordered list of active notifications and the
//! actions that mutate it.
//!
//! - `NotificationStore`: reducer-driven store, observable through `watch`
//! - `ActionRecorder`: records dispatched actions without applying them

mod action;
mod recorder;
mod reducer;
#[allow(clippy::module_inception)]
mod store;

pub use action::{
    add_notification, remove_notification, remove_notifications, types, update_notification,
    Action,
};
pub use recorder::ActionRecorder;
pub use reducer::reduce;
pub use store::{NotificationStore, Notifications, StoreStats, StoreStatsSnapshot};

/// Sink for store actions
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, action: Action);
}

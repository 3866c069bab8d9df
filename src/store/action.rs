use serde::{Deserialize, Serialize};

use crate::notification::{NotificationId, NotificationRecord};

/// Wire names of the store actions
pub mod types {
    pub const ADD_NOTIFICATION: &str = "ADD_NOTIFICATION";
    pub const UPDATE_NOTIFICATION: &str = "UPDATE_NOTIFICATION";
    pub const REMOVE_NOTIFICATION: &str = "REMOVE_NOTIFICATION";
    pub const REMOVE_NOTIFICATIONS: &str = "REMOVE_NOTIFICATIONS";
}

/// Commands accepted by the notification store.
///
/// Serialized as `{"type": "<NAME>", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddNotification(NotificationRecord),
    UpdateNotification(NotificationRecord),
    RemoveNotification(NotificationId),
    RemoveNotifications,
}

impl Action {
    /// Wire name of the action
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddNotification(_) => types::ADD_NOTIFICATION,
            Action::UpdateNotification(_) => types::UPDATE_NOTIFICATION,
            Action::RemoveNotification(_) => types::REMOVE_NOTIFICATION,
            Action::RemoveNotifications => types::REMOVE_NOTIFICATIONS,
        }
    }
}

pub fn add_notification(record: NotificationRecord) -> Action {
    Action::AddNotification(record)
}

pub fn update_notification(record: NotificationRecord) -> Action {
    Action::UpdateNotification(record)
}

pub fn remove_notification(id: NotificationId) -> Action {
    Action::RemoveNotification(id)
}

pub fn remove_notifications() -> Action {
    Action::RemoveNotifications
}

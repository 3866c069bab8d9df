//! Notification records and the mounted units that display them.

mod render;
mod types;
mod unit;

pub use render::{RenderedNotification, TextElement};
pub use types::{
    Callback, NotificationBuilder, NotificationDraft, NotificationId, NotificationRecord, Status,
};
pub use unit::MountedNotification;

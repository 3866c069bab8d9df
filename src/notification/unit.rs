use std::fmt;
use std::sync::Arc;

use crate::config::ThemeConfig;
use crate::error::{LifecycleHook, Result, ToastError};
use crate::store::Dispatch;
use crate::tasks::{DismissReason, DismissTimer, Dismisser};

use super::{NotificationId, NotificationRecord, RenderedNotification};

/// A mounted notification.
///
/// Mounting wires the dismiss timer and click handler and runs `on_add`.
/// Unmounting (explicitly or on drop) cancels the timer and runs
/// `on_remove`. Each callback runs at most once per unit.
pub struct MountedNotification {
    record: NotificationRecord,
    dismisser: Arc<Dismisser>,
    timer: Option<DismissTimer>,
    mounted: bool,
}

impl MountedNotification {
    /// Mount a unit for `record`, dispatching its remove command to `dispatcher`.
    ///
    /// An auto-dismiss delay needs a running tokio runtime. An error from
    /// `on_add` is returned unchanged and the unit is torn down without
    /// running `on_remove`.
    #[tracing::instrument(
        name = "notification.mount",
        skip_all,
        fields(notification_id = %record.id, status = %record.status)
    )]
    pub fn mount(record: NotificationRecord, dispatcher: Arc<dyn Dispatch>) -> Result<Self> {
        let dismisser = Arc::new(Dismisser::new(record.id, dispatcher));
        let timer = match record.dismiss_delay() {
            Some(delay) => Some(DismissTimer::start(delay, dismisser.clone())?),
            None => None,
        };

        let mut unit = Self {
            record,
            dismisser,
            timer,
            mounted: false,
        };

        if let Some(on_add) = unit.record.on_add.clone() {
            on_add
                .call()
                .map_err(|e| ToastError::callback(LifecycleHook::OnAdd, e))?;
        }
        unit.mounted = true;

        tracing::debug!(
            dismissible = unit.record.dismissible,
            auto_dismiss = unit.timer.is_some(),
            "Notification mounted"
        );

        Ok(unit)
    }

    pub fn id(&self) -> NotificationId {
        self.record.id
    }

    pub fn record(&self) -> &NotificationRecord {
        &self.record
    }

    pub fn is_dismissible(&self) -> bool {
        self.record.dismissible
    }

    /// Whether this unit already issued its remove command
    pub fn is_dismissed(&self) -> bool {
        self.dismisser.has_fired()
    }

    /// Handle a user click. Returns whether a remove command was dispatched.
    pub fn click(&self) -> bool {
        match self.click_handler() {
            Some(dismisser) => dismisser.fire(DismissReason::Click),
            None => false,
        }
    }

    /// The dismisser a click fires, or `None` when the unit is not dismissible.
    ///
    /// Callers holding a lock on the unit fire it after releasing the lock,
    /// since the remove command can unmount the unit before returning.
    pub fn click_handler(&self) -> Option<Arc<Dismisser>> {
        if !self.record.dismissible {
            tracing::trace!(notification_id = %self.record.id, "Click ignored, not dismissible");
            return None;
        }
        Some(self.dismisser.clone())
    }

    /// Replace the displayed record in place.
    ///
    /// Only valid for a record with the same lifecycle (see
    /// [`NotificationRecord::same_lifecycle`]); the running timer is kept.
    pub fn update(&mut self, record: NotificationRecord) {
        debug_assert!(self.record.same_lifecycle(&record));
        self.record = record;
    }

    pub fn render(&self, theme: &ThemeConfig) -> RenderedNotification {
        RenderedNotification::new(&self.record, theme)
    }

    /// Unmount the unit, returning any `on_remove` error unchanged
    pub fn unmount(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        if !std::mem::replace(&mut self.mounted, false) {
            return Ok(());
        }

        tracing::debug!(notification_id = %self.record.id, "Notification unmounting");

        if let Some(on_remove) = &self.record.on_remove {
            on_remove
                .call()
                .map_err(|e| ToastError::callback(LifecycleHook::OnRemove, e))?;
        }
        Ok(())
    }
}

impl fmt::Debug for MountedNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedNotification")
            .field("id", &self.record.id)
            .field("dismissible", &self.record.dismissible)
            .field("auto_dismiss", &self.timer.as_ref().map(|t| t.delay()))
            .field("dismissed", &self.dismisser.has_fired())
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl Drop for MountedNotification {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::error!(
                notification_id = %self.record.id,
                error = %e,
                "Notification dropped with failing on_remove callback"
            );
        }
    }
}

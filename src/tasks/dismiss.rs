use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{Result, ToastError};
use crate::notification::NotificationId;
use crate::store::{remove_notification, Dispatch};

/// What caused a notification to dismiss itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Click,
    Timeout,
}

impl fmt::Display for DismissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DismissReason::Click => f.write_str("click"),
            DismissReason::Timeout => f.write_str("timeout"),
        }
    }
}

/// Issues the remove command for one notification, at most once
pub struct Dismisser {
    id: NotificationId,
    dispatcher: Arc<dyn Dispatch>,
    fired: AtomicBool,
}

impl Dismisser {
    pub fn new(id: NotificationId, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            id,
            dispatcher,
            fired: AtomicBool::new(false),
        }
    }

    /// Dispatch the remove command. Returns false if it was already sent.
    pub fn fire(&self, reason: DismissReason) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                notification_id = %self.id,
                reason = %reason,
                "Remove command already sent, ignoring"
            );
            return false;
        }

        tracing::info!(notification_id = %self.id, reason = %reason, "Dismissing notification");
        self.dispatcher.dispatch(remove_notification(self.id));
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// One-shot auto-dismiss timer owned by a mounted notification.
///
/// The pending task is aborted on `cancel` or drop, so a timer never
/// outlives the notification that started it.
pub struct DismissTimer {
    handle: JoinHandle<()>,
    delay: Duration,
}

impl DismissTimer {
    /// Start the timer on the current tokio runtime
    pub fn start(delay: Duration, dismisser: Arc<Dismisser>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| ToastError::Timer(e.to_string()))?;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            dismisser.fire(DismissReason::Timeout);
        });

        tracing::debug!(delay_ms = delay.as_millis() as u64, "Dismiss timer started");

        Ok(Self { handle, delay })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            tracing::debug!(delay_ms = self.delay.as_millis() as u64, "Dismiss timer cancelled");
        }
    }
}

impl Drop for DismissTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

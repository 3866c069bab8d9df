use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DefaultsConfig;
use crate::error::CallbackError;

/// Identifier of a notification, unique among active records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl From<u64> for NotificationId {
    fn from(id: u64) -> Self {
        NotificationId(id)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a notification, also used to pick its status class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Info => "info",
            Status::Success => "success",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-argument lifecycle callback supplied by the caller.
///
/// Errors returned by the callback are never swallowed: they come back
/// out of the mount or unmount call that ran it.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() -> Result<(), CallbackError> + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Callback(Arc::new(f))
    }

    pub fn call(&self) -> Result<(), CallbackError> {
        (self.0)()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Data describing one notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    pub status: Status,
    pub dismissible: bool,
    /// Auto-dismiss delay in milliseconds; absent or `<= 0` never dismisses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_after: Option<i64>,
    #[serde(skip)]
    pub on_add: Option<Callback>,
    #[serde(skip)]
    pub on_remove: Option<Callback>,
}

impl NotificationRecord {
    /// Create a builder for a record with the given id and message
    pub fn builder(id: NotificationId, message: impl Into<String>) -> NotificationBuilder {
        NotificationBuilder::new(id, message)
    }

    /// Delay before the record dismisses itself, if it ever does
    pub fn dismiss_delay(&self) -> Option<Duration> {
        match self.dismiss_after {
            Some(ms) if ms > 0 => Some(Duration::from_millis(ms as u64)),
            _ => None,
        }
    }

    /// Whether `other` keeps this record's auto-dismiss delay and callbacks.
    ///
    /// A mounted unit can only take over a new record in place when this
    /// holds; otherwise it has to be remounted.
    pub fn same_lifecycle(&self, other: &Self) -> bool {
        self.id == other.id
            && self.dismiss_delay() == other.dismiss_delay()
            && self.on_add == other.on_add
            && self.on_remove == other.on_remove
    }

    /// Title to render, treating an empty title as absent
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// Partially specified notification, as received from callers or JSON input.
///
/// Missing fields are filled from [`DefaultsConfig`] when converted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(default)]
    pub id: Option<NotificationId>,
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub dismissible: Option<bool>,
    #[serde(default)]
    pub dismiss_after: Option<i64>,
}

impl NotificationDraft {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Fill unset fields from `defaults`, using `fallback_id` when no id was given
    pub fn into_record(self, defaults: &DefaultsConfig, fallback_id: NotificationId) -> NotificationRecord {
        let mut builder =
            NotificationRecord::builder(self.id.unwrap_or(fallback_id), self.message).defaults(defaults);
        if let Some(title) = self.title {
            builder = builder.title(title);
        }
        if let Some(status) = self.status {
            builder = builder.status(status);
        }
        if let Some(dismissible) = self.dismissible {
            builder = builder.dismissible(dismissible);
        }
        if let Some(ms) = self.dismiss_after {
            builder = builder.dismiss_after(ms);
        }
        builder.build()
    }
}

/// Builder for notification records
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    id: NotificationId,
    title: Option<String>,
    message: String,
    status: Status,
    dismissible: bool,
    dismiss_after: Option<i64>,
    on_add: Option<Callback>,
    on_remove: Option<Callback>,
}

impl NotificationBuilder {
    /// Create a builder: info status, dismissible, no auto-dismiss
    pub fn new(id: NotificationId, message: impl Into<String>) -> Self {
        Self {
            id,
            title: None,
            message: message.into(),
            status: Status::default(),
            dismissible: true,
            dismiss_after: None,
            on_add: None,
            on_remove: None,
        }
    }

    /// Apply configured defaults for status, dismissible and auto-dismiss
    pub fn defaults(mut self, defaults: &DefaultsConfig) -> Self {
        self.status = defaults.status;
        self.dismissible = defaults.dismissible;
        self.dismiss_after = Some(defaults.dismiss_after_ms);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    /// Set the auto-dismiss delay in milliseconds
    pub fn dismiss_after(mut self, ms: i64) -> Self {
        self.dismiss_after = Some(ms);
        self
    }

    pub fn on_add<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.on_add = Some(Callback::new(f));
        self
    }

    pub fn on_remove<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.on_remove = Some(Callback::new(f));
        self
    }

    pub fn build(self) -> NotificationRecord {
        NotificationRecord {
            id: self.id,
            title: self.title,
            message: self.message,
            status: self.status,
            dismissible: self.dismissible,
            dismiss_after: self.dismiss_after,
            on_add: self.on_add,
            on_remove: self.on_remove,
        }
    }
}

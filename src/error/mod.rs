use std::fmt;

use thiserror::Error;

/// Error type returned by user-supplied lifecycle callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle hook a callback error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    /// Ran while mounting a notification unit
    OnAdd,
    /// Ran while unmounting a notification unit
    OnRemove,
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleHook::OnAdd => f.write_str("on_add"),
            LifecycleHook::OnRemove => f.write_str("on_remove"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ToastError {
    #[error("{hook} callback failed: {source}")]
    Callback {
        hook: LifecycleHook,
        source: CallbackError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid notification record: {0}")]
    InvalidRecord(String),

    #[error("Dismiss timer unavailable: {0}")]
    Timer(String),
}

impl ToastError {
    pub(crate) fn callback(hook: LifecycleHook, source: CallbackError) -> Self {
        ToastError::Callback { hook, source }
    }

    /// Hook that raised the error, if it came from a user callback
    pub fn hook(&self) -> Option<LifecycleHook> {
        match self {
            ToastError::Callback { hook, .. } => Some(*hook),
            _ => None,
        }
    }

    /// Unwrap the callback's own error, unchanged
    pub fn into_callback_error(self) -> Option<CallbackError> {
        match self {
            ToastError::Callback { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ToastError {
    fn from(e: serde_json::Error) -> Self {
        ToastError::InvalidRecord(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ToastError>;

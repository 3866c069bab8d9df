use std::sync::Mutex;

use super::{Action, Dispatch};

/// Dispatcher that records actions without applying them.
///
/// Stands in for the store when only the emitted commands matter.
#[derive(Debug, Default)]
pub struct ActionRecorder {
    actions: Mutex<Vec<Action>>,
}

impl ActionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions dispatched so far, in order
    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Dispatch for ActionRecorder {
    fn dispatch(&self, action: Action) {
        tracing::trace!(action = action.kind(), "Action recorded");
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(action);
    }
}

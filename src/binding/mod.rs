//! Binding between the notification store and mounted notification units.
//!
//! The binding keeps exactly one [`MountedNotification`] per record in the
//! store's active list. Actions dispatched through the binding, including
//! the remove commands of its own units, are applied to the store and
//! reconciled before `dispatch` returns, so `on_remove` has run by the time
//! a removal is visible.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use tokio::sync::{broadcast, watch};

use crate::config::{DefaultsConfig, Settings, ThemeConfig};
use crate::error::{Result, ToastError};
use crate::notification::{
    MountedNotification, NotificationDraft, NotificationId, NotificationRecord,
    RenderedNotification,
};
use crate::store::{self, Action, Dispatch, NotificationStore};
use crate::tasks::DismissReason;

pub struct NotificationBinding {
    store: Arc<NotificationStore>,
    defaults: DefaultsConfig,
    theme: ThemeConfig,
    /// Dispatcher handed to units, routes their commands back through `self`
    unit_dispatcher: Arc<dyn Dispatch>,
    /// notification_id -> mounted unit
    units: DashMap<NotificationId, MountedNotification>,
    /// Ids whose `on_add` is running
    mounting: DashSet<NotificationId>,
    /// Records whose mount failed; not retried while active and unchanged
    failed: DashMap<NotificationId, NotificationRecord>,
    rendered: watch::Sender<Vec<RenderedNotification>>,
}

/// Weak route from a unit back to its binding.
///
/// Units live inside the binding, so a strong reference would keep the
/// binding alive forever.
struct UnitDispatcher {
    binding: Weak<NotificationBinding>,
    store: Arc<NotificationStore>,
}

impl Dispatch for UnitDispatcher {
    fn dispatch(&self, action: Action) {
        match self.binding.upgrade() {
            Some(binding) => binding.dispatch(action),
            None => self.store.dispatch(action),
        }
    }
}

impl NotificationBinding {
    pub fn new(store: Arc<NotificationStore>, settings: &Settings) -> Arc<Self> {
        let (rendered, _) = watch::channel(Vec::new());
        Arc::new_cyclic(|binding| Self {
            unit_dispatcher: Arc::new(UnitDispatcher {
                binding: binding.clone(),
                store: store.clone(),
            }),
            store,
            defaults: settings.defaults.clone(),
            theme: settings.theme.clone(),
            units: DashMap::new(),
            mounting: DashSet::new(),
            failed: DashMap::new(),
            rendered,
        })
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Dispatch the remove command for `id`.
    ///
    /// The unit is unmounted before this returns; an `on_remove` error is
    /// returned unchanged.
    pub fn remove_notification(&self, id: NotificationId) -> Result<()> {
        self.apply(store::remove_notification(id))
    }

    /// Add a notification built from `draft` and the configured defaults
    pub fn add_notification(&self, draft: NotificationDraft) -> Result<NotificationId> {
        let fallback_id = match draft.id {
            Some(id) => id,
            None => self.store.next_id(),
        };
        let record = draft.into_record(&self.defaults, fallback_id);
        self.add_record(record)
    }

    /// Add a fully specified record and mount it
    pub fn add_record(&self, record: NotificationRecord) -> Result<NotificationId> {
        let id = record.id;
        self.apply(store::add_notification(record))?;
        Ok(id)
    }

    /// Replace an active record; a no-op when `record.id` is not active
    pub fn update_record(&self, record: NotificationRecord) -> Result<()> {
        self.apply(store::update_notification(record))
    }

    /// Parse a JSON record and add it
    pub fn add_json(&self, json: &str) -> Result<NotificationId> {
        let draft: NotificationDraft = serde_json::from_str(json)?;
        if draft.message.is_empty() {
            return Err(ToastError::InvalidRecord("message must not be empty".to_string()));
        }
        self.add_notification(draft)
    }

    pub fn clear(&self) -> Result<()> {
        self.apply(store::remove_notifications())
    }

    /// Forward a click to the mounted unit for `id`
    pub fn click(&self, id: NotificationId) -> bool {
        // Release the map guard first, the remove command unmounts this unit
        let handler = self.units.get(&id).and_then(|unit| unit.click_handler());
        match handler {
            Some(dismisser) => dismisser.fire(DismissReason::Click),
            None => false,
        }
    }

    pub fn is_mounted(&self, id: NotificationId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn mounted_count(&self) -> usize {
        self.units.len()
    }

    /// Reconcile mounted units against the store's active list.
    ///
    /// Units whose record left the list are unmounted first. Then, in list
    /// order, units are mounted for new records, and a unit whose record
    /// changed is either updated in place or, when its timer or callbacks
    /// changed, unmounted and mounted again. Every change is applied even
    /// when a callback fails; the first callback error is returned.
    ///
    /// Callbacks may dispatch through the binding, which syncs again
    /// before the outer sync continues.
    #[tracing::instrument(name = "binding.sync", skip(self))]
    pub fn sync(&self) -> Result<()> {
        let snapshot = self.store.snapshot();
        let active: HashSet<NotificationId> = snapshot.iter().map(|n| n.id).collect();
        let mut first_error: Option<ToastError> = None;

        self.failed.retain(|id, _| active.contains(id));

        let stale: Vec<NotificationId> = self
            .units
            .iter()
            .map(|entry| *entry.key())
            .filter(|id| !active.contains(id))
            .collect();

        for id in stale {
            // Re-added by a callback since the snapshot
            if self.store.contains(id) {
                continue;
            }
            if let Err(e) = self.unmount(id) {
                first_error.get_or_insert(e);
            }
        }

        for id in snapshot.iter().map(|n| n.id) {
            // Callbacks may have changed the list since the snapshot
            let Some(record) = self.store.get(id) else {
                continue;
            };

            let remount = match self.units.get_mut(&id) {
                Some(unit) if *unit.record() == record => continue,
                Some(mut unit) if unit.record().same_lifecycle(&record) => {
                    unit.update(record);
                    continue;
                }
                Some(_) => true,
                None => false,
            };

            if remount {
                tracing::debug!(notification_id = %id, "Record replaced, remounting");
                if let Err(e) = self.unmount(id) {
                    first_error.get_or_insert(e);
                }
            }
            if self
                .failed
                .get(&id)
                .is_some_and(|failed| failed.same_lifecycle(&record))
            {
                continue;
            }
            if let Err(e) = self.mount(&record) {
                first_error.get_or_insert(e);
            }
        }

        self.publish();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Render all mounted units in store order
    pub fn render(&self) -> Vec<RenderedNotification> {
        self.store
            .snapshot()
            .iter()
            .filter_map(|record| self.units.get(&record.id).map(|unit| unit.render(&self.theme)))
            .collect()
    }

    /// Receiver notified with the rendered list after every sync
    pub fn subscribe_rendered(&self) -> watch::Receiver<Vec<RenderedNotification>> {
        self.rendered.subscribe()
    }

    /// Unmount every unit, returning the first callback error
    pub fn unmount_all(&self) -> Result<()> {
        let ids: Vec<NotificationId> = self.units.iter().map(|entry| *entry.key()).collect();
        let mut first_error = None;

        for id in ids {
            if let Err(e) = self.unmount(id) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Keep units in sync with the store until shutdown, then unmount them.
    ///
    /// Needed only for actions dispatched to the store directly; actions
    /// dispatched through the binding are reconciled immediately.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut changes = self.store.subscribe();
        self.sync_logged();

        tracing::info!("Notification binding started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Notification binding received shutdown signal");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.sync_logged();
                }
            }
        }

        if let Err(e) = self.unmount_all() {
            tracing::error!(error = %e, "Callback failed while unmounting notifications");
        }
        self.publish();

        tracing::info!("Notification binding stopped");
    }

    fn apply(&self, action: Action) -> Result<()> {
        self.store.dispatch(action);
        self.sync()
    }

    fn mount(&self, record: &NotificationRecord) -> Result<()> {
        // A concurrent sync already owns this id
        if !self.mounting.insert(record.id) {
            return Ok(());
        }
        if self.units.contains_key(&record.id) {
            self.mounting.remove(&record.id);
            return Ok(());
        }

        let result = MountedNotification::mount(record.clone(), self.unit_dispatcher.clone());
        let result = match result {
            Ok(unit) => {
                self.failed.remove(&record.id);
                self.units.insert(record.id, unit);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(notification_id = %record.id, error = %e, "Notification failed to mount");
                self.failed.insert(record.id, record.clone());
                Err(e)
            }
        };
        self.mounting.remove(&record.id);
        result?;

        // on_add may have removed its own record before the unit was registered
        if !self.store.contains(record.id) {
            self.unmount(record.id)?;
        }
        Ok(())
    }

    fn unmount(&self, id: NotificationId) -> Result<()> {
        match self.units.remove(&id) {
            Some((_, unit)) => unit.unmount(),
            None => Ok(()),
        }
    }

    fn sync_logged(&self) {
        if let Err(e) = self.sync() {
            tracing::error!(error = %e, hook = ?e.hook(), "Notification sync failed");
        }
    }

    fn publish(&self) {
        let rendered = self.render();
        self.rendered.send_if_modified(|current| {
            if *current == rendered {
                return false;
            }
            *current = rendered;
            true
        });
    }
}

impl Dispatch for NotificationBinding {
    /// Apply `action` to the store and reconcile units before returning.
    /// Callback errors are logged.
    fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
        self.sync_logged();
    }
}

impl Drop for NotificationBinding {
    fn drop(&mut self) {
        if let Err(e) = self.unmount_all() {
            tracing::error!(error = %e, "Callback failed while dropping notification binding");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::LifecycleHook;
    use crate::notification::Status;

    fn binding() -> Arc<NotificationBinding> {
        NotificationBinding::new(Arc::new(NotificationStore::new()), &Settings::default())
    }

    fn record(id: u64) -> NotificationRecord {
        NotificationRecord::builder(NotificationId(id), format!("message {}", id)).build()
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_add_mounts_one_unit_per_record() {
        let binding = binding();
        binding.add_record(record(1)).unwrap();
        binding.add_record(record(2)).unwrap();

        assert_eq!(binding.mounted_count(), 2);
        let ids: Vec<_> = binding.render().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![NotificationId(1), NotificationId(2)]);
    }

    #[test]
    fn test_sync_picks_up_direct_store_dispatch() {
        let binding = binding();
        binding.store().dispatch(store::add_notification(record(1)));
        assert!(!binding.is_mounted(NotificationId(1)));

        binding.sync().unwrap();
        assert!(binding.is_mounted(NotificationId(1)));
    }

    #[test]
    fn test_remove_command_unmounts_unit() {
        let removed = counter();
        let seen = removed.clone();
        let binding = binding();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "m")
                    .on_remove(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        binding.remove_notification(NotificationId(1)).unwrap();
        assert!(!binding.is_mounted(NotificationId(1)));
        assert_eq!(removed.load(Ordering::SeqCst), 1);

        binding.sync().unwrap();
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_command_returns_on_remove_error() {
        let binding = binding();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "m")
                    .on_remove(|| Err("onRemove() callback".into()))
                    .build(),
            )
            .unwrap();

        let err = binding.remove_notification(NotificationId(1)).unwrap_err();
        assert_eq!(err.hook(), Some(LifecycleHook::OnRemove));
        assert!(!binding.is_mounted(NotificationId(1)));
    }

    #[test]
    fn test_click_removes_dismissible_record() {
        let removed = counter();
        let seen = removed.clone();
        let binding = binding();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(2), "m")
                    .on_remove(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(3), "pinned")
                    .dismissible(false)
                    .build(),
            )
            .unwrap();

        assert!(binding.click(NotificationId(2)));
        assert!(!binding.click(NotificationId(3)));
        assert!(!binding.click(NotificationId(99)));

        assert!(!binding.store().contains(NotificationId(2)));
        assert!(!binding.is_mounted(NotificationId(2)));
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(binding.is_mounted(NotificationId(3)));
    }

    #[test]
    fn test_failed_mount_is_not_retried() {
        let calls = counter();
        let seen = calls.clone();
        let binding = binding();
        let err = binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "m")
                    .on_add(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Err("onAdd() callback".into())
                    })
                    .build(),
            )
            .unwrap_err();
        assert_eq!(err.hook(), Some(LifecycleHook::OnAdd));
        assert!(binding.store().contains(NotificationId(1)));

        binding.add_record(record(2)).unwrap();
        assert!(binding.is_mounted(NotificationId(2)));

        binding.sync().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!binding.is_mounted(NotificationId(1)));
    }

    #[test]
    fn test_replaced_failed_record_is_retried() {
        let binding = binding();
        let failing = NotificationRecord::builder(NotificationId(1), "m")
            .on_add(|| Err("onAdd() callback".into()))
            .build();
        assert!(binding.add_record(failing.clone()).is_err());

        // Same callbacks, new text: still not retried
        let mut renamed = failing;
        renamed.message = "renamed".to_string();
        binding.update_record(renamed).unwrap();
        assert!(!binding.is_mounted(NotificationId(1)));

        binding.add_record(record(1)).unwrap();
        assert!(binding.is_mounted(NotificationId(1)));
    }

    #[test]
    fn test_on_add_removing_its_record_leaves_nothing_mounted() {
        let removed = counter();
        let seen = removed.clone();
        let binding = binding();
        let shared = binding.store().clone();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "m")
                    .on_add(move || {
                        shared.dispatch(store::remove_notification(NotificationId(1)));
                        Ok(())
                    })
                    .on_remove(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        assert!(!binding.is_mounted(NotificationId(1)));
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_rerenders_without_remount() {
        let added = counter();
        let seen = added.clone();
        let binding = binding();
        let base = NotificationRecord::builder(NotificationId(1), "Uploading")
            .on_add(move || {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();
        binding.add_record(base.clone()).unwrap();

        let mut updated = base;
        updated.message = "Uploaded".to_string();
        updated.status = Status::Success;
        binding.update_record(updated).unwrap();

        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert_eq!(binding.render()[0].message.text, "Uploaded");
    }

    #[test]
    fn test_replaced_callbacks_remount_unit() {
        let old_removed = counter();
        let new_added = counter();
        let binding = binding();
        let seen = old_removed.clone();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "first")
                    .on_remove(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        let seen = new_added.clone();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "second")
                    .on_add(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        assert_eq!(old_removed.load(Ordering::SeqCst), 1);
        assert_eq!(new_added.load(Ordering::SeqCst), 1);
        assert_eq!(binding.mounted_count(), 1);
        assert_eq!(binding.render()[0].message.text, "second");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_add_json_applies_defaults() {
        let binding = binding();
        let id = binding.add_json(r#"{"title": "Hi", "message": "Welcome"}"#).unwrap();

        let snapshot = binding.store().snapshot();
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].status, Status::Info);
        assert!(snapshot[0].dismissible);
        assert_eq!(snapshot[0].dismiss_after, Some(5000));
        assert!(binding.is_mounted(id));
    }

    #[test]
    fn test_add_json_rejects_bad_input() {
        let binding = binding();
        assert!(matches!(
            binding.add_json(r#"{"message": ""}"#),
            Err(ToastError::InvalidRecord(_))
        ));
        assert!(matches!(
            binding.add_json("not json"),
            Err(ToastError::InvalidRecord(_))
        ));
        assert!(binding.store().is_empty());
    }

    #[test]
    fn test_clear_unmounts_everything() {
        let binding = binding();
        binding.add_record(record(1)).unwrap();
        binding.add_record(record(2)).unwrap();

        binding.clear().unwrap();
        assert_eq!(binding.mounted_count(), 0);
        assert!(binding.render().is_empty());
    }

    #[test]
    fn test_dropping_binding_unmounts_units() {
        let removed = counter();
        let seen = removed.clone();
        let binding = binding();
        binding
            .add_record(
                NotificationRecord::builder(NotificationId(1), "m")
                    .on_remove(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build(),
            )
            .unwrap();

        drop(binding);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_run_follows_store_until_shutdown() {
        let binding = binding();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let mut rendered = binding.subscribe_rendered();

        let task = {
            let binding = binding.clone();
            tokio::spawn(async move { binding.run(shutdown_rx).await })
        };

        binding.store().dispatch(store::add_notification(
            NotificationRecord::builder(NotificationId(1), "m")
                .dismiss_after(1000)
                .build(),
        ));
        rendered.changed().await.unwrap();
        assert_eq!(rendered.borrow_and_update().len(), 1);

        // Auto-dismiss removes the record and unmounts the unit
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(binding.store().is_empty());
        assert!(!binding.is_mounted(NotificationId(1)));
        assert!(rendered.borrow_and_update().is_empty());

        binding.store().dispatch(store::add_notification(record(2)));
        rendered.changed().await.unwrap();
        assert!(binding.is_mounted(NotificationId(2)));

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("Binding should stop")
            .expect("Binding should not panic");
        assert_eq!(binding.mounted_count(), 0);
    }
}

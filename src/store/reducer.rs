use crate::notification::NotificationRecord;

use super::Action;

/// Apply `action` to the active list. Returns whether the list changed.
pub fn reduce(notifications: &mut Vec<NotificationRecord>, action: Action) -> bool {
    match action {
        Action::AddNotification(record) => {
            // ids stay unique: re-adding an active id replaces it in place
            match notifications.iter_mut().find(|n| n.id == record.id) {
                Some(existing) => *existing = record,
                None => notifications.push(record),
            }
            true
        }
        Action::UpdateNotification(record) => {
            match notifications.iter_mut().find(|n| n.id == record.id) {
                Some(existing) => {
                    *existing = record;
                    true
                }
                None => false,
            }
        }
        Action::RemoveNotification(id) => {
            let before = notifications.len();
            notifications.retain(|n| n.id != id);
            notifications.len() != before
        }
        Action::RemoveNotifications => {
            let changed = !notifications.is_empty();
            notifications.clear();
            changed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NotificationId, Status};

    fn record(id: u64, message: &str) -> NotificationRecord {
        NotificationRecord::builder(NotificationId(id), message).build()
    }

    fn ids(list: &[NotificationRecord]) -> Vec<u64> {
        list.iter().map(|n| n.id.0).collect()
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut list = Vec::new();
        assert!(reduce(&mut list, Action::AddNotification(record(1, "a"))));
        assert!(reduce(&mut list, Action::AddNotification(record(2, "b"))));
        assert_eq!(ids(&list), vec![1, 2]);
    }

    #[test]
    fn test_add_existing_id_replaces_in_place() {
        let mut list = vec![record(1, "a"), record(2, "b")];
        reduce(&mut list, Action::AddNotification(record(1, "again")));

        assert_eq!(ids(&list), vec![1, 2]);
        assert_eq!(list[0].message, "again");
    }

    #[test]
    fn test_update_replaces_matching_record() {
        let mut list = vec![record(1, "a")];
        let mut updated = record(1, "a");
        updated.status = Status::Error;

        assert!(reduce(&mut list, Action::UpdateNotification(updated)));
        assert_eq!(list[0].status, Status::Error);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut list = vec![record(1, "a")];
        assert!(!reduce(&mut list, Action::UpdateNotification(record(5, "x"))));
        assert_eq!(ids(&list), vec![1]);
    }

    #[test]
    fn test_remove_filters_by_id() {
        let mut list = vec![record(1, "a"), record(2, "b"), record(3, "c")];
        assert!(reduce(&mut list, Action::RemoveNotification(NotificationId(2))));
        assert_eq!(ids(&list), vec![1, 3]);

        assert!(!reduce(&mut list, Action::RemoveNotification(NotificationId(2))));
    }

    #[test]
    fn test_remove_all() {
        let mut list = vec![record(1, "a"), record(2, "b")];
        assert!(reduce(&mut list, Action::RemoveNotifications));
        assert!(list.is_empty());
        assert!(!reduce(&mut list, Action::RemoveNotifications));
    }
}

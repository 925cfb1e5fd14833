use super::ConsoleStore;
use chrono::Utc;
use riego_core::{Draft, NewNotification, Notification};
use tracing::debug;

impl ConsoleStore {
    /// Appends an unread notification
    pub fn notify(&self, draft: NewNotification) -> Notification {
        let notification = draft.build(self.next_id(), Utc::now());
        self.write(|c| c.notifications.push(notification.clone()));
        debug!(
            notification_id = notification.id,
            severity = ?notification.severity,
            "{}",
            notification.title
        );
        notification
    }

    /// Newest first
    pub fn notifications(&self) -> Vec<Notification> {
        let snapshot = self.snapshot::<Notification>();
        snapshot.iter().rev().cloned().collect()
    }

    pub fn mark_read(&self, id: i32) -> Option<Notification> {
        self.write(|c| c.notifications.update(id, ()))
    }

    pub fn mark_all_read(&self) -> usize {
        self.write(|c| {
            let unread = c.notifications.iter().filter(|n| !n.read).count();
            if unread > 0 {
                c.notifications.modify_all(|n| n.read = true);
            }
            unread
        })
    }

    pub fn unread_count(&self) -> usize {
        self.state
            .read()
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count()
    }
}

use crate::error::AppError;
use crate::model::{PendingReminder, ReminderRequest};
use crate::reminder::ReminderScheduler;
use time::OffsetDateTime;
use tracing::debug;

/// Scheduler backed by the reminder list persisted in the store. Reminders
/// sit here until `kiln notify` delivers them.
pub struct ReminderQueue<'a> {
    entries: &'a mut Vec<PendingReminder>,
}

impl<'a> ReminderQueue<'a> {
    pub fn new(entries: &'a mut Vec<PendingReminder>) -> Self {
        Self { entries }
    }

    /// Reminders due at `now`, earliest first.
    pub fn due(&self, now: OffsetDateTime) -> Vec<PendingReminder> {
        let mut due: Vec<PendingReminder> = self
            .entries
            .iter()
            .filter(|entry| entry.request.fires_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|entry| entry.request.fires_at);
        due
    }

    pub fn remove(&mut self, reminder_id: &str) -> Option<PendingReminder> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.reminder_id == reminder_id)?;
        Some(self.entries.remove(index))
    }

    fn next_id(&self) -> String {
        let base = format!(
            "reminder-{}",
            OffsetDateTime::now_utc().unix_timestamp_nanos()
        );
        let taken = |id: &str| self.entries.iter().any(|entry| entry.reminder_id == id);
        if !taken(&base) {
            return base;
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

impl ReminderScheduler for ReminderQueue<'_> {
    fn schedule(&mut self, request: &ReminderRequest) -> Result<String, AppError> {
        let reminder_id = self.next_id();
        self.entries.push(PendingReminder {
            reminder_id: reminder_id.clone(),
            request: request.clone(),
        });
        Ok(reminder_id)
    }

    /// Cancelling is idempotent: an id that is no longer queued has already
    /// been delivered or cancelled, and there is nothing left to stop.
    fn cancel(&mut self, reminder_id: &str) -> Result<(), AppError> {
        if self.remove(reminder_id).is_none() {
            debug!(reminder_id, "reminder already gone from the queue");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ReminderQueue;
    use crate::model::{NotificationImportance, PendingReminder, ReminderRequest};
    use crate::reminder::ReminderScheduler;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn request(piece_id: &str, fires_at: OffsetDateTime) -> ReminderRequest {
        ReminderRequest {
            piece_id: piece_id.to_string(),
            title: "Drying Complete! 🎨".to_string(),
            body: "check it".to_string(),
            fires_at,
            channel_id: "pottery-timers".to_string(),
            importance: NotificationImportance::High,
            sound: true,
        }
    }

    #[test]
    fn schedule_assigns_unique_ids() {
        let mut entries: Vec<PendingReminder> = Vec::new();
        let mut queue = ReminderQueue::new(&mut entries);
        let fires_at = datetime!(2024-01-02 00:00:00 UTC);

        let first = queue.schedule(&request("piece-1", fires_at)).unwrap();
        let second = queue.schedule(&request("piece-2", fires_at)).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("reminder-"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn cancel_removes_entry_and_is_idempotent() {
        let mut entries: Vec<PendingReminder> = Vec::new();
        let mut queue = ReminderQueue::new(&mut entries);
        let id = queue
            .schedule(&request("piece-1", datetime!(2024-01-02 00:00:00 UTC)))
            .unwrap();
        let other = queue
            .schedule(&request("piece-2", datetime!(2024-01-02 00:00:00 UTC)))
            .unwrap();

        queue.cancel(&id).unwrap();
        queue.cancel(&id).unwrap();
        queue.cancel("reminder-delivered-long-ago").unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reminder_id, other);
    }

    #[test]
    fn due_returns_elapsed_reminders_in_order() {
        let mut entries: Vec<PendingReminder> = Vec::new();
        let mut queue = ReminderQueue::new(&mut entries);
        queue
            .schedule(&request("late", datetime!(2024-01-03 00:00:00 UTC)))
            .unwrap();
        queue
            .schedule(&request("second", datetime!(2024-01-01 12:00:00 UTC)))
            .unwrap();
        queue
            .schedule(&request("first", datetime!(2024-01-01 06:00:00 UTC)))
            .unwrap();

        let due = queue.due(datetime!(2024-01-01 12:00:00 UTC));
        let pieces: Vec<&str> = due.iter().map(|entry| entry.request.piece_id.as_str()).collect();

        assert_eq!(pieces, vec!["first", "second"]);
    }
}

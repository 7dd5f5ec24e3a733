use crate::error::AppError;
use crate::model::{NotificationImportance, PendingReminder};
use crate::notify::{Notifier, activation_target, launch_show};
use notify_rust::{Notification, Urgency};

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, reminder: &PendingReminder) -> Result<(), AppError> {
        self.notify_with_action(reminder, "")
    }

    fn notify_with_action(&self, reminder: &PendingReminder, action: &str) -> Result<(), AppError> {
        let request = &reminder.request;
        let mut notification = Notification::new();
        notification
            .appname("kiln")
            .summary(&request.title)
            .body(&request.body)
            .urgency(match request.importance {
                NotificationImportance::Low => Urgency::Low,
                NotificationImportance::Default => Urgency::Normal,
                NotificationImportance::High => Urgency::Critical,
            });
        if request.sound {
            notification.sound_name("message-new-instant");
        }
        if !action.trim().is_empty() {
            notification.action(action, "Open");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        if !action.trim().is_empty() {
            let action_key = action.to_string();
            let piece_id = request.piece_id.clone();
            std::thread::spawn(move || {
                handle.wait_for_action(|selected| {
                    if let Some(id) = activation_target(Some(selected), &action_key, &piece_id) {
                        let _ = launch_show(&id);
                    }
                });
            });
        }

        Ok(())
    }
}

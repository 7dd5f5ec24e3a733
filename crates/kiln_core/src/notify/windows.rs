use crate::error::AppError;
use crate::model::PendingReminder;
use crate::notify::{Notifier, activation_target, launch_show};
use tauri_winrt_notification::{Sound, Toast};

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, reminder: &PendingReminder) -> Result<(), AppError> {
        self.notify_with_action(reminder, "")
    }

    fn notify_with_action(&self, reminder: &PendingReminder, action: &str) -> Result<(), AppError> {
        let request = &reminder.request;
        let piece_id = request.piece_id.clone();
        let action_value = action.to_string();
        let sound = if request.sound {
            Some(Sound::Default)
        } else {
            None
        };
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&request.title)
            .text1(&request.body)
            .sound(sound);

        if !action_value.trim().is_empty() {
            toast = toast.add_button("Open", &action_value);
        }

        toast
            .on_activated(move |args| {
                if let Some(id) = activation_target(args.as_deref(), &action_value, &piece_id) {
                    let _ = launch_show(&id);
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}

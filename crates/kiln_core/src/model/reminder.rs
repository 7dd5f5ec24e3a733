use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The one outstanding reminder a piece may own. Everything here is frozen
/// when the reminder is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub reminder_id: String,
    pub subject_name: String,
    pub status_label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub fires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationImportance {
    Low,
    Default,
    #[default]
    High,
}

/// Display policy for timer notifications, configured once at startup and
/// handed to whatever schedules them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    #[serde(default)]
    pub importance: NotificationImportance,
    #[serde(default = "default_sound")]
    pub sound: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channel_id: default_channel_id(),
            channel_name: default_channel_name(),
            importance: NotificationImportance::default(),
            sound: default_sound(),
        }
    }
}

fn default_channel_id() -> String {
    "pottery-timers".to_string()
}

fn default_channel_name() -> String {
    "Pottery Timers".to_string()
}

fn default_sound() -> bool {
    true
}

/// Everything the scheduler needs to raise a notification later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub piece_id: String,
    pub title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub fires_at: OffsetDateTime,
    pub channel_id: String,
    pub importance: NotificationImportance,
    pub sound: bool,
}

/// A queued reminder as persisted next to the pieces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub reminder_id: String,
    #[serde(flatten)]
    pub request: ReminderRequest,
}

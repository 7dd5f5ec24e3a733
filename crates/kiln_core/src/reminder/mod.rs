mod queue;

pub use queue::ReminderQueue;

use crate::error::{AppError, TimerError};
use crate::model::{
    NotificationSettings, PieceStatus, ReminderRequest, ScheduledReminder,
};
use crate::timer::{self, TimerSpec};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// The notification collaborator. There is no update-in-place: a changed
/// reminder is always a cancel followed by a fresh schedule.
pub trait ReminderScheduler {
    fn schedule(&mut self, request: &ReminderRequest) -> Result<String, AppError>;

    fn cancel(&mut self, reminder_id: &str) -> Result<(), AppError>;
}

/// What to do when the scheduler cannot cancel a reminder.
///
/// Schedulers treat an id they no longer hold as already cancelled, so this
/// only matters for real backend failures. `BestEffort` logs and moves on.
/// `Strict` reports the failure and leaves the stored reminder in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    #[default]
    BestEffort,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderAction {
    Unchanged,
    Scheduled,
    Cancelled,
    Replaced,
}

/// The state a piece is being saved with.
#[derive(Debug, Clone, Copy)]
pub struct ReminderPlan<'a> {
    pub piece_id: &'a str,
    pub subject_name: &'a str,
    pub status: PieceStatus,
    pub timer: Option<&'a TimerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub reminder: Option<ScheduledReminder>,
    pub action: ReminderAction,
    pub error: Option<TimerError>,
}

pub struct ReminderManager<'a> {
    scheduler: &'a mut dyn ReminderScheduler,
    settings: &'a NotificationSettings,
    cancel_policy: CancelPolicy,
}

impl<'a> ReminderManager<'a> {
    pub fn new(
        scheduler: &'a mut dyn ReminderScheduler,
        settings: &'a NotificationSettings,
        cancel_policy: CancelPolicy,
    ) -> Self {
        Self {
            scheduler,
            settings,
            cancel_policy,
        }
    }

    /// Brings a piece's reminder in line with the state it is being saved
    /// with. Runs once per save; any previous reminder is cancelled before a
    /// replacement is scheduled.
    pub fn reconcile(
        &mut self,
        prior: Option<ScheduledReminder>,
        plan: &ReminderPlan<'_>,
        now: OffsetDateTime,
    ) -> ReconcileOutcome {
        let wanted = plan
            .timer
            .filter(|_| plan.status.is_timer_eligible());
        debug!(
            piece_id = plan.piece_id,
            status = plan.status.label(),
            has_prior = prior.is_some(),
            wants_timer = wanted.is_some(),
            "reconciling reminder"
        );

        let had_prior = prior.is_some();
        if let Some(prior) = prior {
            if let Err(err) = self.cancel(&prior) {
                return ReconcileOutcome {
                    reminder: Some(prior),
                    action: ReminderAction::Unchanged,
                    error: Some(err),
                };
            }
        }

        let Some(spec) = wanted else {
            let action = if had_prior {
                ReminderAction::Cancelled
            } else {
                ReminderAction::Unchanged
            };
            return ReconcileOutcome {
                reminder: None,
                action,
                error: None,
            };
        };

        match self.schedule(spec, plan, now) {
            Ok(reminder) => ReconcileOutcome {
                reminder: Some(reminder),
                action: if had_prior {
                    ReminderAction::Replaced
                } else {
                    ReminderAction::Scheduled
                },
                error: None,
            },
            Err(err) => {
                warn!(piece_id = plan.piece_id, error = %err, "reminder not set");
                ReconcileOutcome {
                    reminder: None,
                    action: if had_prior {
                        ReminderAction::Cancelled
                    } else {
                        ReminderAction::Unchanged
                    },
                    error: Some(err),
                }
            }
        }
    }

    /// Cancels a reminder ahead of deleting the piece that owns it.
    pub fn release(&mut self, prior: Option<&ScheduledReminder>) -> Result<(), TimerError> {
        match prior {
            Some(reminder) => self.cancel(reminder),
            None => Ok(()),
        }
    }

    fn schedule(
        &mut self,
        spec: &TimerSpec,
        plan: &ReminderPlan<'_>,
        now: OffsetDateTime,
    ) -> Result<ScheduledReminder, TimerError> {
        let fires_at = timer::resolve(spec, now)?;
        let (title, body) = reminder_text(plan.subject_name, plan.status);
        let request = ReminderRequest {
            piece_id: plan.piece_id.to_string(),
            title,
            body,
            fires_at,
            channel_id: self.settings.channel_id.clone(),
            importance: self.settings.importance,
            sound: self.settings.sound,
        };

        let reminder_id = self
            .scheduler
            .schedule(&request)
            .map_err(|err| TimerError::scheduling_failed(err.message()))?;
        info!(
            piece_id = plan.piece_id,
            reminder_id = reminder_id.as_str(),
            fires_at = %fires_at,
            "scheduled reminder"
        );

        Ok(ScheduledReminder {
            reminder_id,
            subject_name: plan.subject_name.to_string(),
            status_label: plan.status.label().to_string(),
            fires_at,
        })
    }

    fn cancel(&mut self, reminder: &ScheduledReminder) -> Result<(), TimerError> {
        match self.scheduler.cancel(&reminder.reminder_id) {
            Ok(()) => {
                info!(reminder_id = reminder.reminder_id.as_str(), "cancelled reminder");
                Ok(())
            }
            Err(err) => match self.cancel_policy {
                CancelPolicy::BestEffort => {
                    warn!(
                        reminder_id = reminder.reminder_id.as_str(),
                        error = %err,
                        "could not cancel reminder, ignoring"
                    );
                    Ok(())
                }
                CancelPolicy::Strict => Err(TimerError::scheduling_failed(format!(
                    "could not cancel reminder {}: {}",
                    reminder.reminder_id,
                    err.message()
                ))),
            },
        }
    }
}

/// Notification title and body for a piece whose wait is over.
pub fn reminder_text(subject_name: &str, status: PieceStatus) -> (String, String) {
    match status {
        PieceStatus::InProgress => (
            "Timer Complete! 🎨".to_string(),
            format!("Your pottery \"{subject_name}\" timer is complete. Time to check on it!"),
        ),
        other => (
            format!("{} Complete! 🎨", other.label()),
            format!(
                "Your pottery \"{subject_name}\" has finished {}. Time to check on it!",
                other.label().to_lowercase()
            ),
        ),
    }
}

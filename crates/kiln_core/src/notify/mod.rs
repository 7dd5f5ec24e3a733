use crate::error::AppError;
use crate::model::PendingReminder;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

/// Puts a due reminder in front of the user.
pub trait Notifier {
    fn notify(&self, reminder: &PendingReminder) -> Result<(), AppError>;

    fn notify_with_action(&self, reminder: &PendingReminder, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(reminder)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _reminder: &PendingReminder) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("KILN_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(piece_id: &str) -> String {
    format!("{ACTION_PREFIX}{piece_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .filter(|id| !id.trim().is_empty())
        .map(|id| id.to_string())
}

/// Works out which piece to open when a notification is activated.
///
/// `selected` is what the platform reported: the action key of a button,
/// a `show:<id>` argument, or nothing/`default` for a click on the body.
/// Anything else is ignored.
pub fn activation_target(selected: Option<&str>, action: &str, piece_id: &str) -> Option<String> {
    let selected = selected.map(str::trim).unwrap_or_default();
    if selected.is_empty() || selected == "default" {
        return Some(piece_id.to_string());
    }
    if !action.is_empty() && selected == action {
        return Some(piece_id.to_string());
    }
    parse_activation_argument(selected)
}

/// Reopens the piece a notification was about in a fresh `kiln show`.
pub fn launch_show(piece_id: &str) -> Result<(), AppError> {
    let exe = std::env::current_exe().map_err(|err| AppError::io(err.to_string()))?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(piece_id)
        .spawn()
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::{activation_argument, activation_target, parse_activation_argument};

    #[test]
    fn activation_argument_round_trip() {
        let argument = activation_argument("piece-1");
        let parsed = parse_activation_argument(&argument);
        assert_eq!(parsed.as_deref(), Some("piece-1"));
    }

    #[test]
    fn parse_activation_argument_rejects_other_values() {
        assert!(parse_activation_argument("open:piece-1").is_none());
        assert!(parse_activation_argument("show:").is_none());
    }

    #[test]
    fn clicking_the_body_opens_the_reminded_piece() {
        let action = activation_argument("piece-1");
        for selected in [None, Some(""), Some("  "), Some("default")] {
            assert_eq!(
                activation_target(selected, &action, "piece-1").as_deref(),
                Some("piece-1"),
                "{selected:?}"
            );
        }
    }

    #[test]
    fn open_button_opens_the_reminded_piece() {
        let action = activation_argument("piece-1");
        assert_eq!(
            activation_target(Some(action.as_str()), &action, "piece-1").as_deref(),
            Some("piece-1")
        );
    }

    #[test]
    fn activation_argument_for_another_piece_opens_that_piece() {
        let action = activation_argument("piece-1");
        assert_eq!(
            activation_target(Some("show:piece-2"), &action, "piece-1").as_deref(),
            Some("piece-2")
        );
    }

    #[test]
    fn unrelated_activation_is_ignored() {
        let action = activation_argument("piece-1");
        assert!(activation_target(Some("__closed"), &action, "piece-1").is_none());
        assert!(activation_target(Some("show:"), "", "piece-1").is_none());
    }
}

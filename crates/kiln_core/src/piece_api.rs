use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{AppError, TimerError};
use crate::model::{
    ClayType, DesignType, GlazeType, MAX_IMAGES, PendingReminder, Piece, PieceImage, PieceStatus,
};
use crate::notify::{Notifier, activation_argument, notifier_from_env};
use crate::reminder::{ReminderAction, ReminderManager, ReminderPlan, ReminderQueue};
use crate::storage::json_store;
use crate::timer::{self, RemainingTime, TimerSpec};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::info;

/// A piece as first entered, before it has an id.
#[derive(Debug, Clone)]
pub struct PieceDraft {
    pub name: String,
    pub clay_type: ClayType,
    pub design_type: DesignType,
    pub status: PieceStatus,
    pub glaze_type: GlazeType,
    /// Defaults to today.
    pub created_on: Option<String>,
    pub images: Vec<PieceImage>,
    pub notes: Option<String>,
    pub timer: Option<TimerSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerChange {
    #[default]
    Keep,
    Set(TimerSpec),
    Clear,
}

/// A partial edit. `None` fields keep their stored value; `notes: Some("")`
/// clears the notes.
#[derive(Debug, Clone, Default)]
pub struct PieceChanges {
    pub name: Option<String>,
    pub clay_type: Option<ClayType>,
    pub design_type: Option<DesignType>,
    pub status: Option<PieceStatus>,
    pub glaze_type: Option<GlazeType>,
    pub created_on: Option<String>,
    pub images: Option<Vec<PieceImage>>,
    pub notes: Option<String>,
    pub timer: TimerChange,
}

/// Result of a save. The piece is always persisted; `timer_error` reports a
/// reminder that could not be set.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub piece: Piece,
    pub reminder_action: ReminderAction,
    pub timer_error: Option<TimerError>,
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub delivered: Vec<PendingReminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub reminder_id: String,
    pub piece_id: String,
    pub error: AppError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PieceStatus),
}

impl StatusFilter {
    pub fn matches(self, status: PieceStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        raw.parse().map(Self::Only)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    DateOldest,
    #[default]
    DateNewest,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::DateOldest,
        Self::DateNewest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::DateOldest => "date-oldest",
            Self::DateNewest => "date-newest",
        }
    }

    fn compare(self, left: &Piece, right: &Piece) -> Ordering {
        let by_name = || {
            left.name
                .to_lowercase()
                .cmp(&right.name.to_lowercase())
        };
        let by_date = || left.created_on.cmp(&right.created_on);
        let ordering = match self {
            Self::NameAsc => by_name(),
            Self::NameDesc => by_name().reverse(),
            Self::DateOldest => by_date(),
            Self::DateNewest => by_date().reverse(),
        };
        ordering.then_with(|| left.id.cmp(&right.id))
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|order| order.as_str().replace('-', "") == wanted)
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "unknown sort order '{}' (expected name-asc, name-desc, date-oldest or date-newest)",
                    raw.trim()
                ))
            })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn add_piece(draft: PieceDraft, config: &Config) -> Result<SaveOutcome, AppError> {
    let path = json_store::store_path()?;
    add_piece_with_path(&path, draft, &SystemClock, config)
}

pub fn update_piece(
    id: &str,
    changes: PieceChanges,
    config: &Config,
) -> Result<SaveOutcome, AppError> {
    let path = json_store::store_path()?;
    update_piece_with_path(&path, id, changes, &SystemClock, config)
}

pub fn delete_piece(id: &str, config: &Config) -> Result<Piece, AppError> {
    let path = json_store::store_path()?;
    delete_piece_with_path(&path, id, config)
}

pub fn get_piece(id: &str) -> Result<Piece, AppError> {
    let path = json_store::store_path()?;
    get_piece_with_path(&path, id)
}

pub fn list_pieces(filter: StatusFilter, sort: SortOrder) -> Result<Vec<Piece>, AppError> {
    let path = json_store::store_path()?;
    list_pieces_with_path(&path, filter, sort)
}

pub fn pending_reminders() -> Result<Vec<PendingReminder>, AppError> {
    let path = json_store::store_path()?;
    pending_reminders_with_path(&path)
}

pub fn notify_due_reminders() -> Result<NotificationOutcome, AppError> {
    let path = json_store::store_path()?;
    let notifier = notifier_from_env()?;
    notify_due_reminders_with_path(&path, &SystemClock, notifier.as_ref())
}

/// Live countdown for a piece's reminder, if it has one.
pub fn remaining_for(piece: &Piece, now: OffsetDateTime) -> Option<RemainingTime> {
    piece
        .reminder
        .as_ref()
        .map(|reminder| timer::project(reminder.fires_at, now))
}

fn add_piece_with_path(
    path: &Path,
    draft: PieceDraft,
    clock: &dyn Clock,
    config: &Config,
) -> Result<SaveOutcome, AppError> {
    let now = clock.now();
    let name = required_name(&draft.name)?;
    let created_on = match draft.created_on.as_deref() {
        Some(value) => normalize_date(value)?,
        None => format_date(now.date())?,
    };
    let images = validate_images(draft.images)?;

    let mut state = json_store::load_state(path)?;
    let mut piece = Piece {
        id: next_piece_id(&state.pieces),
        name,
        clay_type: draft.clay_type,
        design_type: draft.design_type,
        status: draft.status,
        glaze_type: draft.glaze_type,
        created_on,
        images,
        notes: normalize_notes(draft.notes.as_deref()),
        timer: draft.timer,
        timer_started_at: None,
        reminder: None,
    };

    let mut queue = ReminderQueue::new(&mut state.reminders);
    let (reminder_action, timer_error) = apply_reminder(&mut piece, &mut queue, now, config);

    state.pieces.push(piece.clone());
    json_store::save_state(path, &state)?;
    info!(piece_id = piece.id.as_str(), status = piece.status.label(), "added piece");

    Ok(SaveOutcome {
        piece,
        reminder_action,
        timer_error,
    })
}

fn update_piece_with_path(
    path: &Path,
    id: &str,
    changes: PieceChanges,
    clock: &dyn Clock,
    config: &Config,
) -> Result<SaveOutcome, AppError> {
    let trimmed_id = required_id(id)?;
    let now = clock.now();

    let mut state = json_store::load_state(path)?;
    let index = state
        .pieces
        .iter()
        .position(|piece| piece.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("piece not found"))?;

    let mut piece = state.pieces[index].clone();
    if let Some(name) = changes.name.as_deref() {
        piece.name = required_name(name)?;
    }
    if let Some(clay_type) = changes.clay_type {
        piece.clay_type = clay_type;
    }
    if let Some(design_type) = changes.design_type {
        piece.design_type = design_type;
    }
    if let Some(status) = changes.status {
        piece.status = status;
    }
    if let Some(glaze_type) = changes.glaze_type {
        piece.glaze_type = glaze_type;
    }
    if let Some(created_on) = changes.created_on.as_deref() {
        piece.created_on = normalize_date(created_on)?;
    }
    if let Some(images) = changes.images {
        piece.images = validate_images(images)?;
    }
    if let Some(notes) = changes.notes.as_deref() {
        piece.notes = normalize_notes(Some(notes));
    }
    match changes.timer {
        TimerChange::Keep => {}
        TimerChange::Set(spec) => piece.timer = Some(spec),
        TimerChange::Clear => piece.timer = None,
    }

    let mut queue = ReminderQueue::new(&mut state.reminders);
    let (reminder_action, timer_error) = apply_reminder(&mut piece, &mut queue, now, config);

    state.pieces[index] = piece.clone();
    json_store::save_state(path, &state)?;
    info!(
        piece_id = piece.id.as_str(),
        status = piece.status.label(),
        reminder = ?reminder_action,
        "updated piece"
    );

    Ok(SaveOutcome {
        piece,
        reminder_action,
        timer_error,
    })
}

fn apply_reminder(
    piece: &mut Piece,
    queue: &mut ReminderQueue<'_>,
    now: OffsetDateTime,
    config: &Config,
) -> (ReminderAction, Option<TimerError>) {
    let mut manager = ReminderManager::new(queue, &config.notifications, config.cancel_policy);
    let plan = ReminderPlan {
        piece_id: &piece.id,
        subject_name: &piece.name,
        status: piece.status,
        timer: piece.timer.as_ref(),
    };
    let outcome = manager.reconcile(piece.reminder.clone(), &plan, now);

    let rescheduled = matches!(
        outcome.action,
        ReminderAction::Scheduled | ReminderAction::Replaced
    );
    if rescheduled {
        piece.timer_started_at = Some(now);
    } else if outcome.reminder.is_none() {
        piece.timer_started_at = None;
    }
    piece.reminder = outcome.reminder;
    (outcome.action, outcome.error)
}

fn delete_piece_with_path(path: &Path, id: &str, config: &Config) -> Result<Piece, AppError> {
    let trimmed_id = required_id(id)?;

    let mut state = json_store::load_state(path)?;
    let index = state
        .pieces
        .iter()
        .position(|piece| piece.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("piece not found"))?;

    let mut queue = ReminderQueue::new(&mut state.reminders);
    let mut manager = ReminderManager::new(&mut queue, &config.notifications, config.cancel_policy);
    manager.release(state.pieces[index].reminder.as_ref())?;

    let removed = state.pieces.remove(index);
    json_store::save_state(path, &state)?;
    info!(piece_id = removed.id.as_str(), "deleted piece");

    Ok(removed)
}

fn get_piece_with_path(path: &Path, id: &str) -> Result<Piece, AppError> {
    let trimmed_id = required_id(id)?;

    let state = json_store::load_state(path)?;
    state
        .pieces
        .into_iter()
        .find(|piece| piece.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("piece not found"))
}

fn list_pieces_with_path(
    path: &Path,
    filter: StatusFilter,
    sort: SortOrder,
) -> Result<Vec<Piece>, AppError> {
    let mut pieces: Vec<Piece> = json_store::load_pieces(path)?
        .into_iter()
        .filter(|piece| filter.matches(piece.status))
        .collect();
    pieces.sort_by(|left, right| sort.compare(left, right));
    Ok(pieces)
}

fn pending_reminders_with_path(path: &Path) -> Result<Vec<PendingReminder>, AppError> {
    let mut reminders = json_store::load_state(path)?.reminders;
    reminders.sort_by_key(|entry| entry.request.fires_at);
    Ok(reminders)
}

/// Raises every queued reminder that is due. Delivered reminders leave the
/// queue; failed ones stay for the next run.
///
/// Delivery can be slow, so the store is read again before the delivered
/// ids are dropped. Anything saved in the meantime is kept.
fn notify_due_reminders_with_path(
    path: &Path,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
) -> Result<NotificationOutcome, AppError> {
    let now = clock.now();
    let mut snapshot = json_store::load_state(path)?.reminders;
    let due = ReminderQueue::new(&mut snapshot).due(now);
    let mut delivered = Vec::new();
    let mut failures = Vec::new();

    for entry in due {
        let action = activation_argument(&entry.request.piece_id);
        match notifier.notify_with_action(&entry, &action) {
            Ok(()) => {
                info!(reminder_id = entry.reminder_id.as_str(), "delivered reminder");
                delivered.push(entry);
            }
            Err(err) => failures.push(NotificationFailure {
                reminder_id: entry.reminder_id.clone(),
                piece_id: entry.request.piece_id.clone(),
                error: err,
            }),
        }
    }

    if !delivered.is_empty() {
        let mut state = json_store::load_state(path)?;
        let mut queue = ReminderQueue::new(&mut state.reminders);
        for entry in &delivered {
            queue.remove(&entry.reminder_id);
        }
        json_store::save_state(path, &state)?;
    }

    Ok(NotificationOutcome {
        delivered,
        failures,
    })
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn required_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn normalize_date(raw: &str) -> Result<String, AppError> {
    let date = Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))?;
    format_date(date)
}

fn format_date(date: Date) -> Result<String, AppError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn validate_images(images: Vec<PieceImage>) -> Result<Vec<PieceImage>, AppError> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::invalid_input(format!(
            "a piece can have at most {MAX_IMAGES} images"
        )));
    }

    images
        .into_iter()
        .map(|image| {
            let uri = image.uri.trim();
            if uri.is_empty() {
                return Err(AppError::invalid_input("image uri is required"));
            }
            Ok(PieceImage {
                uri: uri.to_string(),
                title: normalize_notes(image.title.as_deref()),
            })
        })
        .collect()
}

fn next_piece_id(pieces: &[Piece]) -> String {
    let mut nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let id = format!("piece-{nanos}");
        if !pieces.iter().any(|piece| piece.id == id) {
            return id;
        }
        nanos += 1;
    }
}

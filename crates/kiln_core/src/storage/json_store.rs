use crate::error::AppError;
use crate::model::{PendingReminder, Piece};
use crate::timer::TimerSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const SCHEMA_VERSION: u32 = 2;
const STORE_FILE_NAME: &str = "pieces.json";
const STORE_ENV_VAR: &str = "KILN_STORE_PATH";
const LEGACY_TIMER_FIELDS: [&str; 3] = ["timer_days", "timer_minutes", "timer_time"];

#[derive(Debug, Deserialize)]
struct StoredPieces {
    schema_version: u32,
    pieces: Vec<Piece>,
    #[serde(default)]
    reminders: Vec<PendingReminder>,
}

#[derive(Debug, Serialize)]
struct StoredPiecesRef<'a> {
    schema_version: u32,
    pieces: &'a [Piece],
    reminders: &'a [PendingReminder],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceState {
    pub pieces: Vec<Piece>,
    pub reminders: Vec<PendingReminder>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("kiln").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("kiln")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_pieces(path: &Path) -> Result<Vec<Piece>, AppError> {
    Ok(load_state(path)?.pieces)
}

pub fn load_state(path: &Path) -> Result<PieceState, AppError> {
    if !path.exists() {
        return Ok(PieceState::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let mut raw: Value =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    let schema_version = raw
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| AppError::invalid_data("schema_version is required"))?;
    if !(1..=u64::from(SCHEMA_VERSION)).contains(&schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }
    if schema_version == 1 {
        upgrade_v1(&mut raw)?;
    }

    let stored: StoredPieces =
        serde_json::from_value(raw).map_err(|err| AppError::invalid_data(err.to_string()))?;
    debug!(
        schema_version = stored.schema_version,
        pieces = stored.pieces.len(),
        reminders = stored.reminders.len(),
        "loaded store"
    );

    let mut piece_ids = HashSet::new();
    if let Some(piece) = stored
        .pieces
        .iter()
        .find(|piece| !piece_ids.insert(piece.id.as_str()))
    {
        return Err(AppError::invalid_data(format!(
            "duplicate piece id {}",
            piece.id
        )));
    }

    let mut reminder_ids = HashSet::new();
    if let Some(entry) = stored
        .reminders
        .iter()
        .find(|entry| !reminder_ids.insert(entry.reminder_id.as_str()))
    {
        return Err(AppError::invalid_data(format!(
            "duplicate reminder id {}",
            entry.reminder_id
        )));
    }

    Ok(PieceState {
        pieces: stored.pieces,
        reminders: stored.reminders,
    })
}

/// Schema 1 kept a timer as three loose optional fields. Fold them into a
/// single `timer`; combinations that never described a valid timer are
/// dropped.
fn upgrade_v1(raw: &mut Value) -> Result<(), AppError> {
    let pieces = raw
        .get_mut("pieces")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| AppError::invalid_data("pieces must be an array"))?;

    for piece in pieces {
        let Some(fields) = piece.as_object_mut() else {
            return Err(AppError::invalid_data("piece must be an object"));
        };
        let legacy = take_legacy_fields(fields)?;
        match TimerSpec::from_legacy_fields(legacy.0, legacy.1, legacy.2.as_deref()) {
            Ok(Some(spec)) => {
                let value =
                    serde_json::to_value(spec).map_err(|err| AppError::invalid_data(err.to_string()))?;
                fields.insert("timer".to_string(), value);
            }
            Ok(None) => {}
            Err(err) => {
                let id = fields.get("id").and_then(Value::as_str).unwrap_or("?");
                warn!(piece_id = id, error = %err, "dropping unusable legacy timer");
            }
        }
    }

    Ok(())
}

type LegacyTimer = (Option<i64>, Option<i64>, Option<String>);

fn take_legacy_fields(fields: &mut Map<String, Value>) -> Result<LegacyTimer, AppError> {
    let [days, minutes, time] =
        LEGACY_TIMER_FIELDS.map(|name| fields.remove(name).filter(|value| !value.is_null()));

    let as_int = |value: Option<Value>, name: &str| -> Result<Option<i64>, AppError> {
        value
            .map(|value| {
                value
                    .as_i64()
                    .ok_or_else(|| AppError::invalid_data(format!("{name} must be an integer")))
            })
            .transpose()
    };
    let time = time
        .map(|value| match value {
            Value::String(text) => Ok(text),
            _ => Err(AppError::invalid_data("timer_time must be a string")),
        })
        .transpose()?;

    Ok((
        as_int(days, "timer_days")?,
        as_int(minutes, "timer_minutes")?,
        time,
    ))
}

/// Writes the store through a temp file in the same directory and renames it
/// into place, so readers see either the old file or the new one.
pub fn save_state(path: &Path, state: &PieceState) -> Result<(), AppError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;

    let stored = StoredPiecesRef {
        schema_version: SCHEMA_VERSION,
        pieces: &state.pieces,
        reminders: &state.reminders,
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut file = NamedTempFile::new_in(parent).map_err(|err| AppError::io(err.to_string()))?;
    file.write_all(content.as_bytes())
        .map_err(|err| AppError::io(err.to_string()))?;
    file.as_file()
        .sync_all()
        .map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        file.as_file()
            .set_permissions(permissions)
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    file.persist(path)
        .map_err(|err| AppError::io(err.error.to_string()))?;
    debug!(path = %path.display(), "saved store");
    Ok(())
}

use crate::error::AppError;
use crate::model::ScheduledReminder;
use crate::timer::TimerSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

pub const MAX_IMAGES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceImage {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: String,
    pub name: String,
    pub clay_type: ClayType,
    pub design_type: DesignType,
    pub status: PieceStatus,
    pub glaze_type: GlazeType,
    pub created_on: String,
    #[serde(default)]
    pub images: Vec<PieceImage>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub timer: Option<TimerSpec>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timer_started_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub reminder: Option<ScheduledReminder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Drying,
    Firing,
    Finished,
}

impl PieceStatus {
    pub const ALL: [Self; 4] = [Self::InProgress, Self::Drying, Self::Firing, Self::Finished];

    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Drying => "Drying",
            Self::Firing => "Firing",
            Self::Finished => "Finished",
        }
    }

    /// Statuses that represent a waiting period worth a reminder.
    pub fn is_timer_eligible(self) -> bool {
        matches!(self, Self::InProgress | Self::Drying | Self::Firing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClayType {
    Porcelain,
    #[serde(rename = "Cinco Rojo")]
    CincoRojo,
    #[serde(rename = "Cinco Blanco")]
    CincoBlanco,
    #[serde(rename = "Buffalo Wallow")]
    BuffaloWallow,
    #[serde(rename = "Dark Chocolate")]
    DarkChocolate,
    Custom,
    Other,
}

impl ClayType {
    pub const ALL: [Self; 7] = [
        Self::Porcelain,
        Self::CincoRojo,
        Self::CincoBlanco,
        Self::BuffaloWallow,
        Self::DarkChocolate,
        Self::Custom,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Porcelain => "Porcelain",
            Self::CincoRojo => "Cinco Rojo",
            Self::CincoBlanco => "Cinco Blanco",
            Self::BuffaloWallow => "Buffalo Wallow",
            Self::DarkChocolate => "Dark Chocolate",
            Self::Custom => "Custom",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignType {
    Pot,
    Vase,
    Platter,
    Mug,
    Bowl,
    Tile,
    Other,
}

impl DesignType {
    pub const ALL: [Self; 7] = [
        Self::Pot,
        Self::Vase,
        Self::Platter,
        Self::Mug,
        Self::Bowl,
        Self::Tile,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pot => "Pot",
            Self::Vase => "Vase",
            Self::Platter => "Platter",
            Self::Mug => "Mug",
            Self::Bowl => "Bowl",
            Self::Tile => "Tile",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlazeType {
    #[serde(rename = "No Glaze")]
    NoGlaze,
    Matte,
    Gloss,
}

impl GlazeType {
    pub const ALL: [Self; 3] = [Self::NoGlaze, Self::Matte, Self::Gloss];

    pub fn label(self) -> &'static str {
        match self {
            Self::NoGlaze => "No Glaze",
            Self::Matte => "Matte",
            Self::Gloss => "Gloss",
        }
    }
}

/// Lowercased letters and digits only, so "in-progress", "In Progress" and
/// "in_progress" compare equal.
fn canonical_label(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

fn parse_label<T: Copy>(
    raw: &str,
    all: &[T],
    label: fn(T) -> &'static str,
    kind: &str,
) -> Result<T, AppError> {
    let wanted = canonical_label(raw);
    all.iter()
        .copied()
        .find(|value| canonical_label(label(*value)) == wanted)
        .ok_or_else(|| {
            let options: Vec<&str> = all.iter().map(|value| label(*value)).collect();
            AppError::invalid_input(format!(
                "unknown {kind} '{}' (expected one of: {})",
                raw.trim(),
                options.join(", ")
            ))
        })
}

impl FromStr for PieceStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label(raw, &Self::ALL, Self::label, "status")
    }
}

impl FromStr for ClayType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label(raw, &Self::ALL, Self::label, "clay type")
    }
}

impl FromStr for DesignType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label(raw, &Self::ALL, Self::label, "design type")
    }
}

impl FromStr for GlazeType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label(raw, &Self::ALL, Self::label, "glaze type")
    }
}

impl fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ClayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for GlazeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

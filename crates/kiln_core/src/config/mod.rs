use crate::error::AppError;
use crate::model::NotificationSettings;
use crate::piece_api::SortOrder;
use crate::reminder::CancelPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "KILN_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub danger: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        self.paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.paint(self.muted, text)
    }

    pub fn dangerize(&self, text: &str) -> String {
        self.paint(self.danger, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if color.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", color, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("dark") => Palette {
            accent: "\x1b[38;5;39m",
            muted: "\x1b[38;5;249m",
            danger: "\x1b[38;5;203m",
            reset: "\x1b[0m",
        },
        Some("light") => Palette {
            accent: "\x1b[38;5;27m",
            muted: "\x1b[38;5;242m",
            danger: "\x1b[38;5;160m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            danger: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("plain".into());
    }

    match trimmed {
        "default" | "none" | "plain" | "no_color" => Some("plain".to_string()),
        "dark" | "dark_mode" | "darkmode" | "night" => Some("dark".to_string()),
        "light_mode" | "lightmode" | "day" => Some("light".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
    #[serde(default)]
    pub default_sort: Option<SortOrder>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub aliases: HashMap<String, String>,
    pub sound: Option<bool>,
    pub cancel_policy: Option<CancelPolicy>,
    pub default_sort: Option<SortOrder>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("kiln").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("kiln")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    for (alias, value) in overrides.aliases.iter() {
        merged.aliases.insert(alias.clone(), value.clone());
    }

    if let Some(sound) = overrides.sound {
        merged.notifications.sound = sound;
    }
    if let Some(policy) = overrides.cancel_policy {
        merged.cancel_policy = policy;
    }
    if let Some(sort) = overrides.default_sort {
        merged.default_sort = Some(sort);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
    };
    use crate::model::NotificationImportance;
    use crate::piece_api::SortOrder;
    use crate::reminder::CancelPolicy;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config_with_fallback_from_path(&dir.path().join("missing.json"));

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
        assert_eq!(result.config.notifications.channel_id, "pottery-timers");
        assert_eq!(result.config.cancel_policy, CancelPolicy::BestEffort);
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "aliases": { "ls": "list --status drying" },
            "notifications": { "importance": "low", "sound": false },
            "cancel_policy": "strict",
            "default_sort": "name-asc"
        });
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(loaded.theme.as_deref(), Some("dark"));
        assert_eq!(
            loaded.aliases.get("ls").map(String::as_str),
            Some("list --status drying")
        );
        assert_eq!(
            loaded.notifications.importance,
            NotificationImportance::Low
        );
        assert!(!loaded.notifications.sound);
        assert_eq!(loaded.notifications.channel_name, "Pottery Timers");
        assert_eq!(loaded.cancel_policy, CancelPolicy::Strict);
        assert_eq!(loaded.default_sort, Some(SortOrder::NameAsc));
    }

    #[test]
    fn merge_overrides_updates_fields_and_preserves_base() {
        let base = Config {
            theme: Some("light".into()),
            aliases: [("ls".into(), "list".into())].into_iter().collect(),
            ..Config::default()
        };

        let overrides = ConfigOverrides {
            theme: Some("night".into()),
            aliases: [
                ("ls".into(), "list --sort name-asc".into()),
                ("due".into(), "reminders".into()),
            ]
            .into_iter()
            .collect(),
            sound: Some(false),
            cancel_policy: Some(CancelPolicy::Strict),
            default_sort: Some(SortOrder::DateOldest),
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("dark"));
        assert_eq!(
            merged.aliases.get("ls").map(String::as_str),
            Some("list --sort name-asc")
        );
        assert_eq!(
            merged.aliases.get("due").map(String::as_str),
            Some("reminders")
        );
        assert!(!merged.notifications.sound);
        assert_eq!(merged.cancel_policy, CancelPolicy::Strict);
        assert_eq!(merged.default_sort, Some(SortOrder::DateOldest));

        assert_eq!(base.theme.as_deref(), Some("light"));
        assert!(base.aliases.get("due").is_none());
        assert!(base.notifications.sound);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("dark".into()),
            ..Config::default()
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Default"), Some("plain".into()));
        assert_eq!(canonical_theme_name("dark-mode"), Some("dark".into()));
        assert_eq!(canonical_theme_name("Light"), Some("light".into()));
        assert_eq!(canonical_theme_name("  "), Some("plain".into()));
    }

    #[test]
    fn palette_for_theme_returns_palette() {
        let plain = palette_for_theme(Some("plain"));
        assert!(plain.accent.is_empty());
        assert_eq!(plain.dangerize("expired"), "expired");

        let dark = palette_for_theme(Some("dark"));
        assert_eq!(dark.danger, "\x1b[38;5;203m");
        assert_eq!(dark.dangerize("expired"), "\x1b[38;5;203mexpired\x1b[0m");

        let unknown = palette_for_theme(Some("oceanic"));
        assert!(unknown.accent.is_empty());
    }
}

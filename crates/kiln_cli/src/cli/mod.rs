use clap::{Args, Parser, Subcommand};
use kiln_core::config::ConfigOverrides;
use kiln_core::model::{ClayType, DesignType, GlazeType, PieceStatus};
use kiln_core::piece_api::{SortOrder, StatusFilter};
use kiln_core::reminder::CancelPolicy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new piece
    ///
    /// Example: kiln add "Tall vase" --design vase --status firing --timer-days 2
    Add {
        name: String,
        #[arg(long, default_value = "other")]
        clay: ClayType,
        #[arg(long, default_value = "other")]
        design: DesignType,
        #[arg(long, default_value = "in-progress")]
        status: PieceStatus,
        #[arg(long, default_value = "no-glaze")]
        glaze: GlazeType,
        /// Creation date, YYYY-MM-DD (defaults to today)
        #[arg(long, value_name = "DATE")]
        created_on: Option<String>,
        /// Photo reference, optionally titled as URI|TITLE (up to three)
        #[arg(long = "image", value_name = "URI")]
        images: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        #[command(flatten)]
        timer: TimerArgs,
    },
    /// Edit a piece
    ///
    /// Example: kiln edit piece-1 --status finished
    /// Example: kiln edit piece-1 --timer-at 09:00 --timer-days 1
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        clay: Option<ClayType>,
        #[arg(long)]
        design: Option<DesignType>,
        #[arg(long)]
        status: Option<PieceStatus>,
        #[arg(long)]
        glaze: Option<GlazeType>,
        #[arg(long, value_name = "DATE")]
        created_on: Option<String>,
        /// Replace the photos (URI or URI|TITLE, up to three)
        #[arg(long = "image", value_name = "URI", conflicts_with = "clear_images")]
        images: Vec<String>,
        #[arg(long)]
        clear_images: bool,
        /// New notes; an empty value clears them
        #[arg(long)]
        notes: Option<String>,
        #[command(flatten)]
        timer: TimerArgs,
        /// Remove the timer and its reminder
        #[arg(long, conflicts_with_all = ["timer_days", "timer_minutes", "timer_at"])]
        clear_timer: bool,
    },
    /// Delete a piece and cancel its reminder
    ///
    /// Example: kiln delete piece-1
    Delete {
        id: String,
    },
    /// Show details of a piece
    ///
    /// Example: kiln show piece-1
    Show {
        id: String,
    },
    /// List pieces
    ///
    /// Example: kiln list --status drying --sort name-asc
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// name-asc, name-desc, date-oldest or date-newest
        #[arg(long)]
        sort: Option<SortOrder>,
    },
    /// Show the time left on a piece's timer
    ///
    /// Example: kiln timer piece-1
    Timer {
        id: String,
    },
    /// List reminders waiting to be delivered
    ///
    /// Example: kiln reminders
    Reminders,
    /// Send notifications for due reminders
    ///
    /// Example: kiln notify
    Notify,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TimerArgs {
    /// Wait this many days
    #[arg(long, value_name = "DAYS", allow_negative_numbers = true)]
    pub timer_days: Option<i64>,
    /// Wait this many minutes (cannot be combined with days or a clock time)
    #[arg(long, value_name = "MINUTES", allow_negative_numbers = true)]
    pub timer_minutes: Option<i64>,
    /// Fire at this clock time, HH:MM, after --timer-days days (default 0)
    #[arg(long, value_name = "HH:MM")]
    pub timer_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    Sound,
    CancelPolicy,
    DefaultSort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            return Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            });
        }
        "notifications" | "notification" => {
            match remainder.and_then(canonicalize_flag_name).as_deref() {
                Some("sound") => ConfigOverrideTarget::Sound,
                Some(other) => return Err(format!("unknown notifications field '{other}'")),
                None => return Err("notifications override requires a field name".to_string()),
            }
        }
        "theme" => ConfigOverrideTarget::Theme,
        "cancel_policy" => ConfigOverrideTarget::CancelPolicy,
        "default_sort" => ConfigOverrideTarget::DefaultSort,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if remainder.is_some() && target != ConfigOverrideTarget::Sound {
        return Err(format!("{canonical_field} override cannot have subfields"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` value into one set of overrides; later
/// values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
            ConfigOverrideTarget::Sound => {
                overrides.sound = Some(parse_switch(&parsed.value)?);
            }
            ConfigOverrideTarget::CancelPolicy => {
                overrides.cancel_policy = Some(
                    match canonicalize_flag_name(&parsed.value).as_deref() {
                        Some("best_effort") => CancelPolicy::BestEffort,
                        Some("strict") => CancelPolicy::Strict,
                        _ => {
                            return Err(format!(
                                "unknown cancel policy '{}' (expected best_effort or strict)",
                                parsed.value
                            ));
                        }
                    },
                );
            }
            ConfigOverrideTarget::DefaultSort => {
                overrides.default_sort =
                    Some(parsed.value.parse().map_err(|err: kiln_core::error::AppError| {
                        err.message()
                    })?);
            }
        }
    }
    Ok(overrides)
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match canonicalize_flag_name(value).as_deref() {
        Some("true" | "on" | "yes" | "1") => Ok(true),
        Some("false" | "off" | "no" | "0") => Ok(false),
        _ => Err(format!("expected on or off, got '{value}'")),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
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
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, collect_config_overrides, parse_config_override,
    };
    use clap::Parser;
    use kiln_core::model::PieceStatus;
    use kiln_core::piece_api::{SortOrder, StatusFilter};
    use kiln_core::reminder::CancelPolicy;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Midnight ").unwrap();

        match parsed.target {
            ConfigOverrideTarget::Theme => {}
            other => panic!("unexpected target: {other:?}"),
        }

        assert_eq!(parsed.value, "Midnight");
    }

    #[test]
    fn parse_config_override_rejects_empty_alias_name() {
        let err = parse_config_override("aliases. = foo").unwrap_err();
        assert!(err.contains("aliases override requires an alias name"));
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));

        let err = parse_config_override("notifications.channel=x").unwrap_err();
        assert!(err.contains("unknown notifications field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("aliasesls").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_trims_whitespace_for_alias_names() {
        let parsed = parse_config_override("aliases. ls = list --status drying").unwrap();

        match parsed.target {
            ConfigOverrideTarget::Alias(alias) => assert_eq!(alias, "ls"),
            other => panic!("unexpected target: {other:?}"),
        }

        assert_eq!(parsed.value, "list --status drying");
    }

    #[test]
    fn collect_config_overrides_reads_every_key() {
        let raw = [
            "theme=dark",
            "aliases.due=reminders",
            "notifications.sound=off",
            "cancel-policy=strict",
            "default_sort=name-desc",
        ]
        .map(String::from);

        let overrides = collect_config_overrides(&raw).unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("dark"));
        assert_eq!(
            overrides.aliases.get("due").map(String::as_str),
            Some("reminders")
        );
        assert_eq!(overrides.sound, Some(false));
        assert_eq!(overrides.cancel_policy, Some(CancelPolicy::Strict));
        assert_eq!(overrides.default_sort, Some(SortOrder::NameDesc));
    }

    #[test]
    fn collect_config_overrides_rejects_bad_values() {
        let err = collect_config_overrides(&["notifications.sound=loud".to_string()]).unwrap_err();
        assert!(err.contains("on or off"));

        let err = collect_config_overrides(&["default_sort=oldest".to_string()]).unwrap_err();
        assert!(err.contains("unknown sort order"));
    }

    #[test]
    fn list_arguments_parse_into_core_types() {
        let cli = Cli::try_parse_from(["kiln", "list", "--status", "drying", "--sort", "name-asc"])
            .unwrap();

        match cli.command {
            Command::List { status, sort } => {
                assert_eq!(status, StatusFilter::Only(PieceStatus::Drying));
                assert_eq!(sort, Some(SortOrder::NameAsc));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn edit_rejects_clear_timer_with_new_timer() {
        let result = Cli::try_parse_from([
            "kiln",
            "edit",
            "piece-1",
            "--clear-timer",
            "--timer-days",
            "2",
        ]);
        assert!(result.is_err());
    }
}

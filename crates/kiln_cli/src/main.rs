use clap::{CommandFactory, Parser};
use kiln_cli::cli::{Cli, Command, TimerArgs, collect_config_overrides};
use kiln_cli::logging;
use kiln_core::clock::{Clock, SystemClock, local_offset};
use kiln_core::config::{self, Config, Palette, merge_overrides, palette_for_theme};
use kiln_core::error::AppError;
use kiln_core::model::{PendingReminder, Piece, PieceImage};
use kiln_core::piece_api::{self, PieceChanges, PieceDraft, SaveOutcome, TimerChange};
use kiln_core::timer::{RemainingTime, TimerSpec};
use std::collections::HashMap;
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use tracing::debug;

#[derive(Tabled)]
struct PieceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Clay")]
    clay: String,
    #[tabled(rename = "Design")]
    design: String,
    #[tabled(rename = "Created")]
    created_on: String,
    #[tabled(rename = "Timer")]
    remaining: String,
}

fn format_instant(instant: OffsetDateTime) -> String {
    instant
        .to_offset(local_offset())
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| instant.to_string())
}

fn remaining_badge(remaining: Option<RemainingTime>, palette: &Palette) -> String {
    match remaining {
        None => palette.mutedize("-"),
        Some(remaining) if remaining.is_expired => palette.dangerize(&remaining.to_string()),
        Some(remaining) => palette.accentize(&remaining.to_string()),
    }
}

fn print_pieces_table(pieces: &[Piece], now: OffsetDateTime, palette: &Palette) {
    if pieces.is_empty() {
        println!("No pieces.");
        return;
    }

    let rows = pieces.iter().map(|piece| PieceRow {
        id: piece.id.clone(),
        name: piece.name.clone(),
        status: piece.status.to_string(),
        clay: piece.clay_type.to_string(),
        design: piece.design_type.to_string(),
        created_on: piece.created_on.clone(),
        remaining: remaining_badge(piece_api::remaining_for(piece, now), palette),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn piece_json(piece: &Piece, now: OffsetDateTime) -> Result<serde_json::Value, AppError> {
    let mut value =
        serde_json::to_value(piece).map_err(|err| AppError::invalid_data(err.to_string()))?;
    if let Some(fields) = value.as_object_mut() {
        let remaining = piece_api::remaining_for(piece, now)
            .map(|remaining| serde_json::json!(remaining))
            .unwrap_or(serde_json::Value::Null);
        fields.insert("remaining".to_string(), remaining);
    }
    Ok(value)
}

fn print_pieces_json(pieces: &[Piece], now: OffsetDateTime) -> Result<(), AppError> {
    let mut payload = Vec::with_capacity(pieces.len());
    for piece in pieces {
        payload.push(piece_json(piece, now)?);
    }
    println!("{}", serde_json::Value::Array(payload));
    Ok(())
}

fn print_piece_plain(piece: &Piece, now: OffsetDateTime, palette: &Palette) {
    println!("{} ({})", palette.accentize(&piece.name), piece.id);
    println!("  Status:  {}", piece.status);
    println!("  Clay:    {}", piece.clay_type);
    println!("  Design:  {}", piece.design_type);
    println!("  Glaze:   {}", piece.glaze_type);
    println!("  Created: {}", piece.created_on);
    if let Some(timer) = piece.timer.as_ref() {
        println!("  Timer:   {timer}");
    }
    if let Some(reminder) = piece.reminder.as_ref() {
        println!(
            "  Due:     {} ({})",
            format_instant(reminder.fires_at),
            remaining_badge(piece_api::remaining_for(piece, now), palette)
        );
    }
    for image in &piece.images {
        match image.title.as_deref() {
            Some(title) => println!("  Image:   {} ({title})", image.uri),
            None => println!("  Image:   {}", image.uri),
        }
    }
    if let Some(notes) = piece.notes.as_deref() {
        println!("  Notes:   {notes}");
    }
}

fn report_save(verb: &str, outcome: &SaveOutcome, json: bool) -> Result<(), AppError> {
    let piece = &outcome.piece;
    if json {
        let mut value = piece_json(piece, SystemClock.now())?;
        if let Some(fields) = value.as_object_mut() {
            fields.insert(
                "reminder_action".to_string(),
                serde_json::json!(outcome.reminder_action),
            );
            fields.insert(
                "timer_error".to_string(),
                serde_json::json!(outcome.timer_error.as_ref().map(|err| err.code())),
            );
        }
        println!("{value}");
    } else {
        println!("{verb} piece: {} ({})", piece.name, piece.id);
        if let Some(reminder) = piece.reminder.as_ref() {
            println!("Reminder set for {}", format_instant(reminder.fires_at));
        }
    }

    if let Some(err) = outcome.timer_error.as_ref() {
        eprintln!(
            "WARNING: piece saved without a reminder: {}",
            AppError::from(err.clone())
        );
    }
    Ok(())
}

fn parse_images(raw: &[String]) -> Vec<PieceImage> {
    raw.iter()
        .map(|entry| match entry.split_once('|') {
            Some((uri, title)) => PieceImage {
                uri: uri.to_string(),
                title: Some(title.to_string()),
            },
            None => PieceImage {
                uri: entry.to_string(),
                title: None,
            },
        })
        .collect()
}

fn timer_from_args(args: &TimerArgs) -> Result<Option<TimerSpec>, AppError> {
    TimerSpec::from_parts(args.timer_days, args.timer_minutes, args.timer_at.as_deref())
}

fn print_reminders(reminders: &[PendingReminder], json: bool) -> Result<(), AppError> {
    if json {
        let payload =
            serde_json::to_value(reminders).map_err(|err| AppError::invalid_data(err.to_string()))?;
        println!("{payload}");
        return Ok(());
    }

    if reminders.is_empty() {
        println!("No pending reminders.");
    }
    for reminder in reminders {
        println!(
            "{} | {} | {} | {}",
            reminder.reminder_id,
            reminder.request.piece_id,
            format_instant(reminder.request.fires_at),
            reminder.request.title
        );
    }
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

/// Replaces a leading alias with its configured command line.
fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let Some(expansion) = args.first().and_then(|first| aliases.get(first)) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn resolve_config(base: &Config, raw_overrides: &[String]) -> Result<Config, AppError> {
    let overrides = collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(merge_overrides(base, &overrides))
}

fn run_command(cli: Cli, base: &Config) -> Result<(), AppError> {
    let config = resolve_config(base, &cli.config_override)?;
    let palette = palette_for_theme(config.theme.as_deref());
    debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Add {
            name,
            clay,
            design,
            status,
            glaze,
            created_on,
            images,
            notes,
            timer,
        } => {
            let draft = PieceDraft {
                name,
                clay_type: clay,
                design_type: design,
                status,
                glaze_type: glaze,
                created_on,
                images: parse_images(&images),
                notes,
                timer: timer_from_args(&timer)?,
            };
            let outcome = piece_api::add_piece(draft, &config)?;
            report_save("Added", &outcome, cli.json)?;
        }
        Command::Edit {
            id,
            name,
            clay,
            design,
            status,
            glaze,
            created_on,
            images,
            clear_images,
            notes,
            timer,
            clear_timer,
        } => {
            let timer = if clear_timer {
                TimerChange::Clear
            } else {
                match timer_from_args(&timer)? {
                    Some(spec) => TimerChange::Set(spec),
                    None => TimerChange::Keep,
                }
            };
            let images = if clear_images {
                Some(Vec::new())
            } else if images.is_empty() {
                None
            } else {
                Some(parse_images(&images))
            };
            let changes = PieceChanges {
                name,
                clay_type: clay,
                design_type: design,
                status,
                glaze_type: glaze,
                created_on,
                images,
                notes,
                timer,
            };
            let outcome = piece_api::update_piece(&id, changes, &config)?;
            report_save("Updated", &outcome, cli.json)?;
        }
        Command::Delete { id } => {
            let piece = piece_api::delete_piece(&id, &config)?;
            if cli.json {
                println!("{}", piece_json(&piece, SystemClock.now())?);
            } else {
                println!("Deleted piece: {} ({})", piece.name, piece.id);
            }
        }
        Command::Show { id } => {
            let piece = piece_api::get_piece(&id)?;
            let now = SystemClock.now();
            if cli.json {
                println!("{}", piece_json(&piece, now)?);
            } else {
                print_piece_plain(&piece, now, &palette);
            }
        }
        Command::List { status, sort } => {
            let sort = sort.or(config.default_sort).unwrap_or_default();
            let pieces = piece_api::list_pieces(status, sort)?;
            let now = SystemClock.now();
            if cli.json {
                print_pieces_json(&pieces, now)?;
            } else {
                print_pieces_table(&pieces, now, &palette);
            }
        }
        Command::Timer { id } => {
            let piece = piece_api::get_piece(&id)?;
            let remaining = piece_api::remaining_for(&piece, SystemClock.now());
            if cli.json {
                let fires_at = piece
                    .reminder
                    .as_ref()
                    .map(|reminder| reminder.fires_at.format(&Rfc3339))
                    .transpose()
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                let payload = serde_json::json!({
                    "id": piece.id,
                    "fires_at": fires_at,
                    "remaining": remaining,
                });
                println!("{payload}");
            } else {
                match remaining {
                    None => println!("{} ({}): no timer running", piece.name, piece.id),
                    Some(remaining) if remaining.is_expired => println!(
                        "{} ({}): {}",
                        piece.name,
                        piece.id,
                        palette.dangerize("expired")
                    ),
                    Some(remaining) => println!(
                        "{} ({}): {} left",
                        piece.name,
                        piece.id,
                        palette.accentize(&remaining.to_string())
                    ),
                }
            }
        }
        Command::Reminders => {
            let reminders = piece_api::pending_reminders()?;
            print_reminders(&reminders, cli.json)?;
        }
        Command::Notify => {
            let outcome = piece_api::notify_due_reminders()?;
            if cli.json {
                let payload = serde_json::json!({
                    "delivered": outcome.delivered,
                    "failed": outcome
                        .failures
                        .iter()
                        .map(|failure| serde_json::json!({
                            "reminder_id": failure.reminder_id,
                            "piece_id": failure.piece_id,
                            "error": failure.error.to_string(),
                        }))
                        .collect::<Vec<_>>(),
                });
                println!("{payload}");
            } else {
                println!("Delivered {} reminder(s)", outcome.delivered.len());
            }
            for failure in &outcome.failures {
                eprintln!(
                    "WARNING: reminder {} for piece {} not delivered: {}",
                    failure.reminder_id, failure.piece_id, failure.error
                );
            }
        }
    }

    Ok(())
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line).and_then(|args| expand_alias(args, &base.aliases))
        {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("kiln".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, base) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    logging::init();

    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        eprintln!("WARNING: using default configuration: {}", err);
    }
    let base = loaded.config;

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive(&base) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli, &base) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

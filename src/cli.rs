use std::{env, path::PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};

use calpop::{
    CalendarEvent, EventPatch, EventStore, Position, Size, SqliteStorage, Viewport,
    adjust_position_with, format_date, format_time, storage::config::Config,
};

pub const USAGE: &str = "Usage: calpop [--config PATH] <command>

Commands:
  list [YYYY-MM-DD]                          List stored events
  add <title> <start> <end> [bg] [border]    Add an event
  update <id> [--title T] [--start S] [--end E] [--bg C] [--border C]
  delete <id>                                Delete every event with this id
  place <x> <y> <width> <height> [vw vh]     Position a popup near (x, y)";

const DEFAULT_COLOR: &str = "#3788d8";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List { date: Option<NaiveDate> },
    Add(CalendarEvent),
    Update(EventPatch),
    Delete { id: String },
    Place {
        anchor: Position,
        size: Size,
        viewport: Option<Viewport>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliMode {
    Help,
    Run(CliArgs),
}

pub fn parse_cli_mode() -> Result<CliMode, String> {
    parse_args(env::args().skip(1))
}

pub fn parse_args<I>(args: I) -> Result<CliMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path = None;
    let mut args = args.into_iter().peekable();

    while let Some(arg) = args.peek().cloned() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliMode::Help),
            "--config" => {
                args.next();
                let path = args.next().ok_or("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            _ => break,
        }
    }

    let name = args.next().ok_or("Missing command")?;
    let rest: Vec<String> = args.collect();

    if rest.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliMode::Help);
    }

    let command = match name.as_str() {
        "list" => parse_list(&rest)?,
        "add" => parse_add(&rest)?,
        "update" => parse_update(&rest)?,
        "delete" => match rest.as_slice() {
            [id] => Command::Delete { id: id.clone() },
            _ => return Err("delete takes exactly one id".to_string()),
        },
        "place" => parse_place(&rest)?,
        "help" => return Ok(CliMode::Help),
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(CliMode::Run(CliArgs { config_path, command }))
}

fn parse_list(rest: &[String]) -> Result<Command, String> {
    match rest {
        [] => Ok(Command::List { date: None }),
        [date] => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| Command::List { date: Some(d) })
            .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD.", date)),
        _ => Err("list takes at most one date".to_string()),
    }
}

fn parse_add(rest: &[String]) -> Result<Command, String> {
    if !(3..=5).contains(&rest.len()) {
        return Err("add needs <title> <start> <end> [bg] [border]".to_string());
    }

    let background = rest.get(3).map(String::as_str).unwrap_or(DEFAULT_COLOR);
    let border = rest.get(4).map(String::as_str).unwrap_or(background);

    Ok(Command::Add(CalendarEvent::new(
        rest[0].as_str(),
        rest[1].as_str(),
        rest[2].as_str(),
        background,
        border,
    )))
}

fn parse_update(rest: &[String]) -> Result<Command, String> {
    let (id, flags) = rest.split_first().ok_or("update needs an id")?;
    let mut patch = EventPatch::new(id.as_str());
    let mut flags = flags.iter();

    while let Some(flag) = flags.next() {
        let value = flags
            .next()
            .ok_or_else(|| format!("{} needs a value", flag))?
            .clone();
        patch = match flag.as_str() {
            "--title" => patch.title(value),
            "--start" => patch.start(value),
            "--end" => patch.end(value),
            "--bg" => patch.background_color(value),
            "--border" => patch.border_color(value),
            other => return Err(format!("Unknown update flag: {}", other)),
        };
    }

    if patch.is_empty() {
        return Err("update needs at least one field to change".to_string());
    }
    Ok(Command::Update(patch))
}

fn parse_place(rest: &[String]) -> Result<Command, String> {
    let numbers = rest
        .iter()
        .map(|s| s.parse::<f64>().map_err(|_| format!("Not a number: {}", s)))
        .collect::<Result<Vec<_>, _>>()?;

    match numbers.as_slice() {
        [x, y, width, height] => Ok(Command::Place {
            anchor: Position::new(*x, *y),
            size: Size::new(*width, *height),
            viewport: None,
        }),
        [x, y, width, height, vw, vh] => Ok(Command::Place {
            anchor: Position::new(*x, *y),
            size: Size::new(*width, *height),
            viewport: Some(Viewport::new(*vw, *vh)),
        }),
        _ => Err("place needs <x> <y> <width> <height> [vw vh]".to_string()),
    }
}

pub fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = match &args.config_path {
        Some(path) => Config::load_or_create_at(path),
        None => Config::load_or_create(),
    }
    .context("loading config")?;

    match args.command {
        Command::Place { anchor, size, viewport } => {
            let viewport = viewport.unwrap_or_else(|| config.popup.viewport());
            adjust_position_with(&config.popup.layout(), Some(&size), anchor, viewport, |p| {
                println!("{} {}", p.x, p.y);
            });
        }
        Command::List { date } => {
            let store = open_store(&config)?;
            let events: Vec<&CalendarEvent> = match date {
                Some(date) => store.events_on(date),
                None => store.events().iter().collect(),
            };
            if events.is_empty() {
                println!("No events.");
            }
            for event in events {
                println!("{}", format_event_line(event));
            }
        }
        Command::Add(event) => {
            let id = event.id.clone();
            open_store(&config)?.add_event(event)?;
            println!("{}", id);
        }
        Command::Update(patch) => {
            let id = patch.id.clone();
            if !open_store(&config)?.update_event(patch)? {
                println!("No event with id {}", id);
            }
        }
        Command::Delete { id } => {
            let removed = open_store(&config)?.delete_event(&id)?;
            println!("Removed {} event(s)", removed);
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<EventStore<SqliteStorage>> {
    let storage = SqliteStorage::open(&config.storage.database)
        .with_context(|| format!("opening {}", config.storage.database.display()))?;

    let store = if config.storage.strict {
        EventStore::open_strict_with_key(storage, config.storage.key.as_str())?
    } else {
        EventStore::open_with_key(storage, config.storage.key.as_str())
    };
    Ok(store)
}

fn format_event_line(event: &CalendarEvent) -> String {
    let when = match (parse_date_time(&event.start), parse_date_time(&event.end)) {
        (Some(start), Some(end)) => format!(
            "{} {}-{}",
            format_date(&start),
            format_time(&start),
            format_time(&end)
        ),
        _ => format!("{} - {}", event.start, event.end),
    };
    format!("{}  {:<22} {}", event.id, when, event.title)
}

fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

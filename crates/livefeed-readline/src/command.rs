//! REPL command parsing.

use livefeed_core::event::EventKind;

/// Command names offered for completion and hints.
pub const COMMANDS: &[&str] = &[
    "start", "stop", "use", "pause", "resume", "slow", "pin", "unpin", "pins", "clear-pins",
    "filter", "search", "show", "sessions", "recent", "forget", "scripts", "help", "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    User(String),
    Text(String),
    /// Hide events that hit neither query.
    FilterOn,
    FilterOff,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(String),
    /// Stops the named handle, or the focused one.
    Stop(Option<String>),
    Use(String),
    Pause,
    Resume,
    /// `None` toggles.
    Slow(Option<bool>),
    Pin(usize),
    Unpin(usize),
    Pins,
    ClearPins,
    Filter(EventKind),
    Search(SearchCommand),
    Show,
    Sessions,
    Recent,
    Forget(String),
    Scripts,
    Help,
    Quit,
}

/// Parses one input line. Errors are user-facing usage messages.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start(required(rest, "start <handle>")?),
        "stop" => Command::Stop(optional(rest)),
        "use" => Command::Use(required(rest, "use <handle>")?),
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "slow" => match rest.to_ascii_lowercase().as_str() {
            "" => Command::Slow(None),
            "on" => Command::Slow(Some(true)),
            "off" => Command::Slow(Some(false)),
            _ => return Err("usage: slow [on|off]".to_string()),
        },
        "pin" => Command::Pin(index(rest, "pin <index>")?),
        "unpin" => Command::Unpin(index(rest, "unpin <index>")?),
        "pins" => Command::Pins,
        "clear-pins" => Command::ClearPins,
        "filter" => {
            let kind = EventKind::parse(rest)
                .filter(|kind| *kind != EventKind::InvalidUser)
                .ok_or_else(|| "usage: filter <comment|gift|subscription>".to_string())?;
            Command::Filter(kind)
        }
        "search" => Command::Search(parse_search(rest)?),
        "show" => Command::Show,
        "sessions" => Command::Sessions,
        "recent" => Command::Recent,
        "forget" => Command::Forget(required(rest, "forget <handle>")?),
        "scripts" => Command::Scripts,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(command)
}

fn parse_search(rest: &str) -> Result<SearchCommand, String> {
    const USAGE: &str = "usage: search <user|text> <query> | search <on|off|clear>";
    let (target, query) = match rest.split_once(char::is_whitespace) {
        Some((target, query)) => (target, query.trim()),
        None => (rest, ""),
    };
    match target.to_ascii_lowercase().as_str() {
        "user" if !query.is_empty() => Ok(SearchCommand::User(query.to_string())),
        "text" if !query.is_empty() => Ok(SearchCommand::Text(query.to_string())),
        "on" => Ok(SearchCommand::FilterOn),
        "off" => Ok(SearchCommand::FilterOff),
        "clear" => Ok(SearchCommand::Clear),
        _ => Err(USAGE.to_string()),
    }
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    optional(rest).ok_or_else(|| format!("usage: {}", usage))
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

fn index(rest: &str, usage: &str) -> Result<usize, String> {
    rest.parse().map_err(|_| format!("usage: {}", usage))
}

pub const HELP: &str = "\
start <handle>         start monitoring a handle (@ optional)
stop [handle]          stop a handle (default: focused)
use <handle>           focus another running handle
pause | resume         hold incoming events / release them
slow [on|off]          drip queued events one at a time (no arg toggles)
pin <i> | unpin <i>    toggle / remove a pin on feed index i
pins | clear-pins      show / clear pinned events
filter <kind>          toggle comment, gift or subscription events
search user <q>        highlight senders matching q
search text <q>        highlight messages matching q
search on|off|clear    hide non-matching events / show all / reset
show                   re-render the focused feed
sessions | recent      list running / recently started handles
forget <handle>        drop a handle from the recent list
scripts                list handles with a replay script
quit                   stop every session and exit";

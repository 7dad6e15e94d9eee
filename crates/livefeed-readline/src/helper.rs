use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMANDS;

/// Commands whose argument is a handle.
const HANDLE_COMMANDS: &[&str] = &["start", "stop", "use", "forget"];

/// Rustyline helper: completes command names and known handles, hints the
/// rest of a command name and colors recognized commands.
#[derive(Clone)]
pub struct CliHelper {
    /// Handles offered after `start`, `stop`, `use` and `forget`.
    handles: Arc<Mutex<Vec<String>>>,
}

impl CliHelper {
    pub fn new(handles: Arc<Mutex<Vec<String>>>) -> Self {
        Self { handles }
    }

    fn complete_handle(&self, prefix: &str) -> Vec<Pair> {
        let prefix = prefix.trim_start_matches('@');
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|handle| handle.starts_with(prefix))
            .map(|handle| Pair {
                display: handle.clone(),
                replacement: handle.clone(),
            })
            .collect()
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        match line.split_once(' ') {
            None => {
                let candidates = COMMANDS
                    .iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .map(|cmd| Pair {
                        display: cmd.to_string(),
                        replacement: cmd.to_string(),
                    })
                    .collect();
                Ok((0, candidates))
            }
            Some((command, rest)) if HANDLE_COMMANDS.contains(&command) && !rest.contains(' ') => {
                let start = line.len() - rest.len() + usize::from(rest.starts_with('@'));
                Ok((start, self.complete_handle(rest)))
            }
            Some(_) => Ok((pos, Vec::new())),
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let command = line.split(' ').next().unwrap_or_default();
        if COMMANDS.contains(&command) {
            let rest = &line[command.len()..];
            Owned(format!("{}{}", command.bright_cyan(), rest))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.is_empty() || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

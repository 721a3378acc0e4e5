use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::command::COMMANDS;

/// Rustyline helper for the dashboard REPL.
///
/// Completes command names, colors known commands cyan and unknown ones red,
/// and hints the argument synopsis once a command name is typed.
#[derive(Clone, Default)]
pub struct CliHelper;

impl CliHelper {
    fn command_name(line: &str) -> Option<&str> {
        line.starts_with('/')
            .then(|| line.split_whitespace().next())
            .flatten()
    }

    fn is_known(name: &str) -> bool {
        COMMANDS.iter().any(|(cmd, _)| *cmd == name) || name == "/exit"
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
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, args)| Pair {
                display: format!("{} {}", cmd, args).trim_end().to_string(),
                replacement: if args.is_empty() {
                    cmd.to_string()
                } else {
                    format!("{} ", cmd)
                },
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match Self::command_name(line) {
            Some(name) if Self::is_known(name) => Owned(line.bright_cyan().to_string()),
            Some(_) => Owned(line.red().to_string()),
            None => Borrowed(line),
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
        if !line.starts_with('/') {
            return None;
        }

        if let Some((cmd, args)) = COMMANDS.iter().find(|(cmd, _)| *cmd == line.trim_end()) {
            if args.is_empty() || line.len() > cmd.len() + 1 {
                return None;
            }
            let sep = if line.ends_with(' ') { "" } else { " " };
            return Some(format!("{}{}", sep, args).dimmed().to_string());
        }

        if line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Validator for CliHelper {}

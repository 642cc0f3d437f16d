use std::io::{self, BufRead, Write};
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::driver::DeviceDriver;
use crate::ops::FileSystem;
use crate::util::error::Result;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Create { path: String, size: u64 },
    Delete { path: String },
    Copy { source: String, destination: String },
    Move { source: String, destination: String },
    MakeDir { path: String },
    RemoveDir { path: String },
    List,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' takes {expected} argument(s), got {got}")]
    Arity { command: String, expected: usize, got: usize },
    #[error("invalid size '{0}'")]
    InvalidSize(String),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<String> = words.map(str::to_string).collect();

        let expected = match command {
            "CR" | "CP" | "MV" => 2,
            "DL" | "CD" | "DD" => 1,
            "LL" => 0,
            _ => return Err(ParseError::UnknownCommand(command.to_string())),
        };
        if args.len() != expected {
            return Err(ParseError::Arity { command: command.to_string(), expected, got: args.len() });
        }

        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or_default();
        Ok(match command {
            "CR" => {
                let path = next();
                let size = next();
                let size = size.parse().map_err(|_| ParseError::InvalidSize(size))?;
                Command::Create { path, size }
            }
            "DL" => Command::Delete { path: next() },
            "CP" => Command::Copy { source: next(), destination: next() },
            "MV" => Command::Move { source: next(), destination: next() },
            "CD" => Command::MakeDir { path: next() },
            "DD" => Command::RemoveDir { path: next() },
            _ => Command::List,
        })
    }
}

impl Command {
    /// Runs the command, writing `LL` output to `out`.
    pub fn execute<A: DeviceDriver, W: Write>(&self, fs: &mut FileSystem<A>, out: &mut W) -> Result<()> {
        match self {
            Command::Create { path, size } => fs.create(path, *size),
            Command::Delete { path } => fs.delete(path),
            Command::Copy { source, destination } => fs.copy(source, destination),
            Command::Move { source, destination } => fs.move_file(source, destination),
            Command::MakeDir { path } => fs.mkdir(path),
            Command::RemoveDir { path } => fs.rmdir(path),
            Command::List => {
                for listing in fs.list()? {
                    writeln!(out, "{}", listing)?;
                }
                Ok(())
            }
        }
    }

    /// The line reported once the command has succeeded. `LL` has none, its
    /// listing is the report.
    pub fn confirmation(&self) -> Option<String> {
        match self {
            Command::Create { path, .. } => Some(format!("File '{}' created successfully", path)),
            Command::Delete { path } => Some(format!("File '{}' deleted successfully", path)),
            Command::Copy { source, destination } => {
                Some(format!("File '{}' copied successfully to destination '{}'", source, destination))
            }
            Command::Move { source, destination } => {
                Some(format!("File '{}' moved successfully to destination '{}'", source, destination))
            }
            Command::MakeDir { path } => Some(format!("Directory '{}' created successfully", path)),
            Command::RemoveDir { path } => Some(format!("Directory '{}' deleted successfully", path)),
            Command::List => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub executed: usize,
    pub failed: usize,
}

/// Executes every line of `script` in order. A failing line is reported on
/// `out` and the next line runs regardless. With `confirm`, each successful
/// command is acknowledged on `out` as well.
pub fn run<A: DeviceDriver, R: BufRead, W: Write>(
    fs: &mut FileSystem<A>,
    script: R,
    out: &mut W,
    confirm: bool,
) -> io::Result<Summary> {
    let mut summary = Summary::default();
    for (number, line) in script.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        summary.executed += 1;
        let result = match trimmed.parse::<Command>() {
            Ok(command) => {
                debug!("line {}: {:?}", number + 1, command);
                command.execute(fs, out).map(|()| command.confirmation()).map_err(|err| err.to_string())
            }
            Err(err) => Err(err.to_string()),
        };
        match result {
            Ok(Some(confirmation)) if confirm => writeln!(out, "{}", confirmation)?,
            Ok(_) => {}
            Err(message) => {
                warn!("line {}: {}", number + 1, message);
                writeln!(out, "Error: {}", message)?;
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

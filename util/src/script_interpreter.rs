//! # Flight script interpreter module
//!
//! This module provides an interpreter for flight scripts, allowing operator
//! commands to be executed from a file rather than a live input device. Each
//! line of a script has the form `<time_s>: <json op command>;`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use vehicle_if::cmds::{OpCmd, OpCmdParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The operator command to run
    op: OpCmd,
}

/// A flight script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_ops` to acquire a list of operator commands that need
/// executing.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid op command at {0} s: {1}")]
    InvalidOpCmd(f64, OpCmdParseError),
}

pub enum PendingOps {
    None,
    Some(Vec<OpCmd>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        let cmds = parse_script(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds,
        })
    }

    /// Return a vector of pending op commands, or `None` if no commands need
    /// executing now.
    pub fn get_pending_ops(&mut self) -> PendingOps {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingOps::EndOfScript;
        }

        let mut op_vec: Vec<OpCmd> = vec![];

        let current_time_s = get_elapsed_seconds();

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding commands
        // until the exec times are larger than the current time.
        while self
            .cmds
            .front()
            .map(|c| c.exec_time_s < current_time_s)
            .unwrap_or(false)
        {
            if let Some(c) = self.cmds.pop_front() {
                op_vec.push(c.op);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !op_vec.is_empty() {
            PendingOps::Some(op_vec)
        } else {
            PendingOps::None
        }
    }

    /// Get the number of op commands in the script
    pub fn get_num_ops(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a full script string into a queue of timed commands.
fn parse_script(script: &str) -> Result<VecDeque<Command>, ScriptError> {
    // Empty queue of commands
    let mut op_queue: VecDeque<Command> = VecDeque::new();

    // Go through the script executing __the magic regex__.
    let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
        .multi_line(true)
        .build()
        .unwrap();

    let mut num_caps = 0;

    for cap in re.captures_iter(script) {
        // Parse the exec time
        let exec_time_s: f64 = match cap.get(1).unwrap().as_str().parse() {
            Ok(t) => t,
            Err(e) => return Err(ScriptError::InvalidTimestamp(format!("{}", e))),
        };

        // Parse the op command from the payload. The scripts contain JSON
        // only.
        let op = match OpCmd::from_json(cap.get(3).unwrap().as_str()) {
            Ok(c) => c,
            Err(e) => return Err(ScriptError::InvalidOpCmd(exec_time_s, e)),
        };

        // Build command from the match
        op_queue.push_back(Command { exec_time_s, op });

        num_caps += 1;
    }

    if num_caps == 0 {
        return Err(ScriptError::ScriptEmpty);
    }

    Ok(op_queue)
}

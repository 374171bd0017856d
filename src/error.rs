//! Error types
//!
//! Every failure here is fatal for the run: there is no partial-output mode.

use crate::block::BlockState;

/// Which per-tool temperature map a lookup was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureKind {
    Idle,
    Printing,
}

impl std::fmt::Display for TemperatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureKind::Idle => f.write_str("idle"),
            TemperatureKind::Printing => f.write_str("printing"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter token whose value is neither an integer nor a float
    #[error("malformed parameter '{token}' in '{line}'")]
    MalformedParameter { line: String, token: String },

    #[error("'{operation}' is missing required parameter '{letter}'")]
    MissingParameter { operation: String, letter: char },

    #[error("invalid tool number {value}")]
    InvalidTool { value: String },

    #[error("no {kind} temperature known for T{tool} (block {state})")]
    MissingTemperature {
        kind: TemperatureKind,
        tool: u32,
        state: BlockState,
    },

    /// Extruder-unload seen before any prime tower section was captured
    #[error("extruder end on T{tool} with no preceding prime tower block")]
    MissingPrimeBlock { tool: u32 },

    #[error("invalid trigger pattern '{pattern}'")]
    InvalidTrigger {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("trigger '{pattern}' cannot open a {state} block")]
    UntriggerableState { pattern: String, state: BlockState },

    #[error("line {line}: {text}")]
    AtLine {
        line: usize,
        text: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the 1-based line number and text the error was raised on
    pub fn at_line(self, line: usize, text: &str) -> Self {
        Error::AtLine {
            line,
            text: text.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

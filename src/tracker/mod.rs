//! Stream Trackers
//!
//! Single forward pass over instruction lines. Each tracker is a plain state
//! struct plus a fixed, ordered list of transition functions run on every
//! line. Higher trackers contain the lower ones instead of extending them.

pub mod redundancy;
pub mod segmenter;
pub mod stream;
pub mod temperature;

pub use redundancy::RedundancyFilter;
pub use segmenter::Segmenter;
pub use stream::{StreamState, ToolId};
pub use temperature::{
    Target, Targets, Temperature, TemperatureCommand, TemperatureTracker, ToolTemperatures,
};

use crate::error::Result;
use crate::parser::{self, ParsedLine};

/// One input line, trimmed, with its parse
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine<'a> {
    pub text: &'a str,
    pub parsed: ParsedLine,
}

impl<'a> SourceLine<'a> {
    pub fn parse(text: &'a str) -> Result<Self> {
        let text = text.trim();
        Ok(Self {
            text,
            parsed: parser::parse_line(text)?,
        })
    }
}

/// A state update applied to every line
pub type Transition<S> = fn(&mut S, &SourceLine<'_>) -> Result<()>;

/// Run `transitions` in order against `line`
pub(crate) fn apply_transitions<S>(
    state: &mut S,
    transitions: &[Transition<S>],
    line: &SourceLine<'_>,
) -> Result<()> {
    for transition in transitions {
        transition(state, line)?;
    }
    Ok(())
}

/// Something that consumes lines one at a time, never looking ahead
pub trait Tracker {
    fn observe(&mut self, line: &SourceLine<'_>) -> Result<()>;

    fn process_line(&mut self, text: &str) -> Result<()> {
        let line = SourceLine::parse(text)?;
        self.observe(&line)
    }

    /// Feed every line in order; errors carry the 1-based line number
    fn process_lines<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (idx, text) in lines.into_iter().enumerate() {
            let text = text.as_ref();
            self.process_line(text)
                .map_err(|e| e.at_line(idx + 1, text.trim()))?;
        }
        Ok(())
    }
}

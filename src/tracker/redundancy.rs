//! Redundancy Filter
//!
//! Drops temperature commands that cannot change anything given the commands
//! seen so far: a set to the current target, or a wait on a target that was
//! already waited for. Dropped commands still move the target.

use super::stream::StreamState;
use super::temperature::{Target, TemperatureCommand};
use super::{apply_transitions, SourceLine, Targets, Tracker, Transition};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct RedundancyFilter {
    stream: StreamState,
    /// Targets as commanded by every recognized line, dropped or not
    targets: Targets,
    lines: Vec<String>,
    dropped: usize,
}

const TRANSITIONS: [Transition<RedundancyFilter>; 2] = [filter_line, track_stream];

impl RedundancyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `command` repeats state the machine already has
    pub fn is_redundant(&self, command: &TemperatureCommand) -> bool {
        match self.targets.get(&command.tool) {
            Some(target) if target.temperature == command.temperature => {
                !command.wait || target.reached
            }
            _ => false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Tracker for RedundancyFilter {
    fn observe(&mut self, line: &SourceLine<'_>) -> Result<()> {
        apply_transitions(self, &TRANSITIONS, line)
    }
}

fn filter_line(filter: &mut RedundancyFilter, line: &SourceLine<'_>) -> Result<()> {
    let command = TemperatureCommand::recognize(&line.parsed, filter.stream.active_tool)?;
    let Some(command) = command else {
        filter.lines.push(line.text.to_string());
        return Ok(());
    };

    if filter.is_redundant(&command) {
        log::debug!("Dropping redundant '{}'", line.text);
        filter.dropped += 1;
    } else {
        filter.lines.push(line.text.to_string());
    }

    // A dropped set still counts: it clears the reached flag.
    filter.targets.insert(
        command.tool,
        Target {
            temperature: command.temperature,
            reached: command.wait,
        },
    );
    Ok(())
}

fn track_stream(filter: &mut RedundancyFilter, line: &SourceLine<'_>) -> Result<()> {
    filter.stream.observe(line)
}

//! Temperature Tracker
//!
//! Per-tool idle (lowest non-zero) and printing (highest non-zero) setpoints,
//! plus the last commanded target and whether it was waited for.

use std::collections::BTreeMap;

use super::stream::{tool_id, StreamState, ToolId};
use super::{apply_transitions, SourceLine, Tracker, Transition};
use crate::error::{Error, Result};
use crate::parser::{Instruction, ParsedLine};

/// Whole degrees, as written after `S`
pub type Temperature = i64;

pub type ToolTemperatures = BTreeMap<ToolId, Temperature>;

/// Last commanded setpoint for one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub temperature: Temperature,
    /// True if the command was a blocking wait
    pub reached: bool,
}

impl Target {
    /// Already commanded to `temperature` and waited for
    pub fn satisfies(&self, temperature: Temperature) -> bool {
        self.temperature == temperature && self.reached
    }
}

pub type Targets = BTreeMap<ToolId, Target>;

/// `M104` / `M109` with the tool resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureCommand {
    pub tool: ToolId,
    pub temperature: Temperature,
    /// `M109` blocks until the target is reached
    pub wait: bool,
}

impl TemperatureCommand {
    pub fn set(tool: ToolId, temperature: Temperature) -> Self {
        Self {
            tool,
            temperature,
            wait: false,
        }
    }

    pub fn wait(tool: ToolId, temperature: Temperature) -> Self {
        Self {
            tool,
            temperature,
            wait: true,
        }
    }

    /// Recognize a temperature command; the tool defaults to `active_tool`
    pub fn recognize(parsed: &ParsedLine, active_tool: ToolId) -> Result<Option<Self>> {
        let Some(instruction) = parsed.instruction() else {
            return Ok(None);
        };
        let wait = match instruction.operation.as_str() {
            "M104" => false,
            "M109" => true,
            _ => return Ok(None),
        };

        let tool = match instruction.get('T') {
            Some(value) => tool_id(value)?,
            None => active_tool,
        };
        let temperature = instruction
            .get('S')
            .ok_or_else(|| Error::MissingParameter {
                operation: instruction.operation.clone(),
                letter: 'S',
            })?
            .as_i64();

        Ok(Some(Self {
            tool,
            temperature,
            wait,
        }))
    }

    pub fn to_line(&self) -> String {
        Instruction::new(if self.wait { "M109" } else { "M104" })
            .with('T', self.tool)
            .with('S', self.temperature)
            .serialize()
    }
}

/// True for the operations [`TemperatureCommand`] recognizes
pub fn is_temperature(operation: &str) -> bool {
    matches!(operation, "M104" | "M109")
}

#[derive(Debug, Clone, Default)]
pub struct TemperatureTracker {
    pub stream: StreamState,
    /// Lowest non-zero target per tool
    pub idle: ToolTemperatures,
    /// Highest non-zero target per tool
    pub printing: ToolTemperatures,
    pub targets: Targets,
}

const TRANSITIONS: [Transition<TemperatureTracker>; 2] = [track_stream, track_temperature];

impl TemperatureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tool(&self) -> ToolId {
        self.stream.active_tool
    }

    pub fn height(&self) -> f64 {
        self.stream.height
    }

    /// Record a command. Zero is a cooldown: it moves the target but is
    /// neither an idle nor a printing temperature.
    pub fn apply(&mut self, command: TemperatureCommand) {
        self.targets.insert(
            command.tool,
            Target {
                temperature: command.temperature,
                reached: command.wait,
            },
        );

        if command.temperature == 0 {
            return;
        }

        self.idle
            .entry(command.tool)
            .and_modify(|t| *t = (*t).min(command.temperature))
            .or_insert(command.temperature);
        self.printing
            .entry(command.tool)
            .and_modify(|t| *t = (*t).max(command.temperature))
            .or_insert(command.temperature);
    }
}

impl Tracker for TemperatureTracker {
    fn observe(&mut self, line: &SourceLine<'_>) -> Result<()> {
        apply_transitions(self, &TRANSITIONS, line)
    }
}

fn track_stream(tracker: &mut TemperatureTracker, line: &SourceLine<'_>) -> Result<()> {
    tracker.stream.observe(line)
}

fn track_temperature(tracker: &mut TemperatureTracker, line: &SourceLine<'_>) -> Result<()> {
    if let Some(command) = TemperatureCommand::recognize(&line.parsed, tracker.active_tool())? {
        tracker.apply(command);
    }
    Ok(())
}

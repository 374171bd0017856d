//! Active tool and current height

use super::{apply_transitions, SourceLine, Tracker, Transition};
use crate::error::{Error, Result};
use crate::parser::Value;
use crate::rewrite::is_motion;

/// Extruder number as written after `T`
pub type ToolId = u32;

/// Machine state shared by every tracker: tool 0 at height 0 until told otherwise
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamState {
    pub active_tool: ToolId,
    pub height: f64,
}

const TRANSITIONS: [Transition<StreamState>; 2] = [track_tool_change, track_height];

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracker for StreamState {
    fn observe(&mut self, line: &SourceLine<'_>) -> Result<()> {
        apply_transitions(self, &TRANSITIONS, line)
    }
}

/// `T<n>` with nothing else selects tool `n`
fn track_tool_change(state: &mut StreamState, line: &SourceLine<'_>) -> Result<()> {
    let Some(instruction) = line.parsed.instruction() else {
        return Ok(());
    };
    if !instruction.parameters.is_empty() {
        return Ok(());
    }
    let Some(digits) = instruction.operation.strip_prefix('T') else {
        return Ok(());
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }

    state.active_tool = digits.parse().map_err(|_| Error::InvalidTool {
        value: digits.to_string(),
    })?;
    Ok(())
}

/// A motion carrying `Z` moves the head to that height
fn track_height(state: &mut StreamState, line: &SourceLine<'_>) -> Result<()> {
    if let Some(instruction) = line.parsed.instruction() {
        if is_motion(&instruction.operation) {
            if let Some(z) = instruction.get('Z') {
                state.height = z.as_f64();
            }
        }
    }
    Ok(())
}

/// Interpret a `T` parameter value as a tool number
pub fn tool_id(value: Value) -> Result<ToolId> {
    let invalid = || Error::InvalidTool {
        value: value.to_string(),
    };
    match value {
        Value::Int(i) => ToolId::try_from(i).map_err(|_| invalid()),
        Value::Float(f) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(ToolId::MAX) => {
            Ok(f as ToolId)
        }
        Value::Float(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = StreamState::new();
        assert_eq!(state.active_tool, 0);
        assert_eq!(state.height, 0.0);
    }

    #[test]
    fn test_tracks_height() {
        let mut state = StreamState::new();
        state.process_line("G0 Z0.5").unwrap();
        assert_eq!(state.height, 0.5);
        state.process_line("G1 X10 Z12.25 E1").unwrap();
        assert_eq!(state.height, 12.25);
        state.process_line("G92 Z0").unwrap();
        assert_eq!(state.height, 12.25);
        state.process_line("G1 X5 Y5").unwrap();
        assert_eq!(state.height, 12.25);
    }

    #[test]
    fn test_tracks_tool() {
        let mut state = StreamState::new();
        state.process_line("T1").unwrap();
        assert_eq!(state.active_tool, 1);
        state.process_line("M104 T2 S100").unwrap();
        assert_eq!(state.active_tool, 1);
        state.process_line("T0").unwrap();
        assert_eq!(state.active_tool, 0);
        state.process_line("TOOL").unwrap();
        assert_eq!(state.active_tool, 0);
    }

    #[test]
    fn test_tool_id_conversion() {
        assert_eq!(tool_id(Value::Int(3)).unwrap(), 3);
        assert_eq!(tool_id(Value::Float(2.0)).unwrap(), 2);
        assert!(tool_id(Value::Int(-1)).is_err());
        assert!(tool_id(Value::Float(1.5)).is_err());
    }
}

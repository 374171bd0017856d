//! Blocks
//!
//! Contiguous runs of lines sharing one segmentation state, and the
//! annotation table that decides where one block ends and the next begins.

use std::fmt;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::parser;
use crate::tracker::{Targets, ToolId};

/// What a block of lines is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockState {
    /// Everything before the first annotation
    Init,
    /// Between the end of the start-up code and the first feature
    PostInit,
    /// Walls, skin and infill of the printed part
    Part,
    /// Prime tower section
    Prime,
    /// Synthesized nozzle wipe over the last prime tower section
    PrimeWipe,
    ExtruderStart,
    ExtruderEnd,
    /// Synthesized shutdown
    End,
}

impl BlockState {
    pub const ALL: [BlockState; 8] = [
        BlockState::Init,
        BlockState::PostInit,
        BlockState::Part,
        BlockState::Prime,
        BlockState::PrimeWipe,
        BlockState::ExtruderStart,
        BlockState::ExtruderEnd,
        BlockState::End,
    ];

    /// States an annotation in the source can open. The rest are implicit
    /// or synthesized.
    pub fn is_triggerable(self) -> bool {
        matches!(
            self,
            BlockState::PostInit
                | BlockState::Part
                | BlockState::Prime
                | BlockState::ExtruderStart
                | BlockState::ExtruderEnd
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockState::Init => "INIT",
            BlockState::PostInit => "POST_INIT",
            BlockState::Part => "PART",
            BlockState::Prime => "PRIME",
            BlockState::PrimeWipe => "PRIME_WIPE",
            BlockState::ExtruderStart => "EXTRUDER_START",
            BlockState::ExtruderEnd => "EXTRUDER_END",
            BlockState::End => "END",
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub state: BlockState,
    /// Tool active when the block opened
    pub active_tool: ToolId,
    pub start_height: f64,
    /// Height of the last Z-bearing move up to the end of this block
    pub finish_height: f64,
    pub lines: Vec<String>,
    /// Per-tool targets as of the end of this block
    pub finish_targets: Targets,
}

impl Block {
    pub fn new(state: BlockState, active_tool: ToolId, start_height: f64) -> Self {
        Self {
            state,
            active_tool,
            start_height,
            finish_height: start_height,
            lines: Vec::new(),
            finish_targets: Targets::new(),
        }
    }

    /// Same metadata, different lines
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            state: self.state,
            active_tool: self.active_tool,
            start_height: self.start_height,
            finish_height: self.finish_height,
            lines,
            finish_targets: self.finish_targets.clone(),
        }
    }

    /// Copy of this block without instructions whose operation matches
    pub fn without_operations(&self, matches: impl Fn(&str) -> bool) -> Result<Self> {
        let mut lines = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            match parser::parse_line(line)?.operation() {
                Some(op) if matches(op) => {}
                _ => lines.push(line.clone()),
            }
        }
        Ok(self.with_lines(lines))
    }
}

/// One row of the trigger table as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerSpec {
    pub pattern: String,
    pub state: BlockState,
}

impl TriggerSpec {
    pub fn new(pattern: impl Into<String>, state: BlockState) -> Self {
        Self {
            pattern: pattern.into(),
            state,
        }
    }
}

/// Annotations written by the slicer this tool targets
pub fn standard_triggers() -> Vec<TriggerSpec> {
    vec![
        TriggerSpec::new(";END-INIT", BlockState::PostInit),
        TriggerSpec::new(";TYPE:(WALL.*|SKIN|FILL)", BlockState::Part),
        TriggerSpec::new(";TYPE:PRIME-TOWER", BlockState::Prime),
        TriggerSpec::new("; EXTRUDER START HOME", BlockState::ExtruderStart),
        TriggerSpec::new("; EXTRUDER END HOME", BlockState::ExtruderEnd),
    ]
}

#[derive(Debug, Clone)]
struct Trigger {
    regex: Regex,
    state: BlockState,
}

/// Ordered annotation patterns, each anchored at the start of the line
#[derive(Debug, Clone)]
pub struct TriggerTable {
    triggers: Vec<Trigger>,
}

impl TriggerTable {
    pub fn new(specs: &[TriggerSpec]) -> Result<Self> {
        let triggers = specs
            .iter()
            .map(|spec| {
                if !spec.state.is_triggerable() {
                    return Err(Error::UntriggerableState {
                        pattern: spec.pattern.clone(),
                        state: spec.state,
                    });
                }
                let regex = Regex::new(&format!("^(?:{})", spec.pattern)).map_err(|source| {
                    Error::InvalidTrigger {
                        pattern: spec.pattern.clone(),
                        source,
                    }
                })?;
                Ok(Trigger {
                    regex,
                    state: spec.state,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { triggers })
    }

    pub fn standard() -> Result<Self> {
        Self::new(&standard_triggers())
    }

    /// Every state whose pattern matches `line`, in table order
    pub fn matches<'a>(&'a self, line: &'a str) -> impl Iterator<Item = BlockState> + 'a {
        self.triggers
            .iter()
            .filter(move |t| t.regex.is_match(line))
            .map(|t| t.state)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::temperature::is_temperature;

    fn first_match(table: &TriggerTable, line: &str) -> Option<BlockState> {
        let found: Vec<_> = table.matches(line).collect();
        assert!(found.len() <= 1, "{line:?} matched {found:?}");
        found.first().copied()
    }

    #[test]
    fn test_standard_table_transitions() {
        let table = TriggerTable::standard().unwrap();
        let cases = [
            (";END-INIT", Some(BlockState::PostInit)),
            (";TYPE:WALL-OUTER", Some(BlockState::Part)),
            (";TYPE:WALL-INNER", Some(BlockState::Part)),
            (";TYPE:SKIN", Some(BlockState::Part)),
            (";TYPE:FILL", Some(BlockState::Part)),
            (";TYPE:PRIME-TOWER", Some(BlockState::Prime)),
            ("; EXTRUDER START HOME", Some(BlockState::ExtruderStart)),
            ("; EXTRUDER END HOME", Some(BlockState::ExtruderEnd)),
            (";TYPE:SUPPORT", None),
            (";LAYER:3", None),
            ("G1 X1 ;TYPE:SKIN", None),
            ("", None),
        ];
        for (line, expected) in cases {
            assert_eq!(first_match(&table, line), expected, "{line:?}");
        }
    }

    #[test]
    fn test_every_triggerable_state_is_reachable() {
        let specs = standard_triggers();
        for state in BlockState::ALL {
            let covered = specs.iter().any(|s| s.state == state);
            assert_eq!(covered, state.is_triggerable(), "{state}");
        }
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = TriggerTable::new(&[TriggerSpec::new(";TYPE:(", BlockState::Part)]).unwrap_err();
        assert!(matches!(err, Error::InvalidTrigger { .. }));
    }

    #[test]
    fn test_synthesized_state_rejected() {
        let err = TriggerTable::new(&[TriggerSpec::new(";WIPE", BlockState::PrimeWipe)]).unwrap_err();
        assert!(matches!(err, Error::UntriggerableState { .. }));
    }

    #[test]
    fn test_without_operations_copies() {
        let mut block = Block::new(BlockState::Part, 1, 0.2);
        block.lines = vec![
            ";TYPE:FILL".to_string(),
            "M104 T1 S200".to_string(),
            "G1 X1 E1".to_string(),
            "M109 S210".to_string(),
        ];
        let stripped = block.without_operations(is_temperature).unwrap();

        assert_eq!(stripped.lines, vec![";TYPE:FILL", "G1 X1 E1"]);
        assert_eq!(stripped.active_tool, 1);
        assert_eq!(block.lines.len(), 4);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BlockState::PrimeWipe.to_string(), "PRIME_WIPE");
        assert_eq!(BlockState::ExtruderEnd.to_string(), "EXTRUDER_END");
    }
}

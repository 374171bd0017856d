//! Instruction Rewriter
//!
//! Three-tier parameter edits applied to instructions whose operation
//! matches a predicate. Non-matching lines come back byte-for-byte.

use crate::error::Result;
use crate::parser::{self, Instruction, Parameter, ParsedLine, Value};

/// Bare linear or rapid motion
pub fn is_motion(operation: &str) -> bool {
    matches!(operation, "G0" | "G1")
}

/// Parameter edits applied by [`rewrite`]
///
/// Overrides only replace letters already present, forces always set, and
/// deletes remove. They are applied in that order.
#[derive(Debug, Clone, Default)]
pub struct Edits {
    overrides: Vec<Parameter>,
    forces: Vec<Parameter>,
    deletes: Vec<char>,
}

impl Edits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_with(mut self, letter: char, value: impl Into<Value>) -> Self {
        self.overrides.push(Parameter {
            letter,
            value: value.into(),
        });
        self
    }

    pub fn force(mut self, letter: char, value: impl Into<Value>) -> Self {
        self.forces.push(Parameter {
            letter,
            value: value.into(),
        });
        self
    }

    pub fn delete(mut self, letter: char) -> Self {
        self.deletes.push(letter);
        self
    }

    pub fn apply(&self, instruction: &mut Instruction) {
        for param in &self.overrides {
            if instruction.has(param.letter) {
                instruction.set(param.letter, param.value);
            }
        }
        for param in &self.forces {
            instruction.set(param.letter, param.value);
        }
        for letter in &self.deletes {
            instruction.remove(*letter);
        }
    }
}

/// Rewrite `line` if its operation satisfies `matches`
pub fn rewrite(line: &str, matches: impl Fn(&str) -> bool, edits: &Edits) -> Result<String> {
    let mut instruction = match parser::parse_line(line)? {
        ParsedLine::Instruction(instruction) if matches(&instruction.operation) => instruction,
        _ => return Ok(line.to_string()),
    };

    edits.apply(&mut instruction);
    Ok(instruction.serialize())
}

/// Rewrite a motion line for non-extruding replay
///
/// Feed rate is overridden, extrusion is always dropped, and height is
/// forced to `height` when given or dropped otherwise.
pub fn rewrite_move(line: &str, feed: f64, height: Option<f64>) -> Result<String> {
    let edits = Edits::new().override_with('F', feed).delete('E');
    let edits = match height {
        Some(z) => edits.force('Z', z),
        None => edits.delete('Z'),
    };
    rewrite(line, is_motion, &edits)
}

//! Abstract Syntax Tree for GCode
//!
//! Minimal types for a parsed instruction. Comments are dropped during
//! parsing and are never reconstructed.

use std::fmt;

use crate::error::{Error, Result};
use crate::parser::lexer::{Token, TokenKind};

/// A numeric parameter value, integer when the source text parses as one
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    /// Decode a parameter value: integer first, then float
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Int(i));
        }
        text.parse::<f64>().ok().map(Value::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    /// Integer view, truncating toward zero
    pub fn as_i64(self) -> i64 {
        match self {
            Value::Int(i) => i,
            Value::Float(f) => f.trunc() as i64,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A command parameter like "X10" or "S255"
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub letter: char,
    pub value: Value,
}

/// One operation with its parameters, e.g. "G1 X10 Y20 E0.5"
///
/// Parameters keep the position they were first seen at; setting an existing
/// letter replaces its value in place.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub operation: String,
    pub parameters: Vec<Parameter>,
}

impl Instruction {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            parameters: Vec::new(),
        }
    }

    /// Builder form of [`Instruction::set`]
    pub fn with(mut self, letter: char, value: impl Into<Value>) -> Self {
        self.set(letter, value);
        self
    }

    pub fn get(&self, letter: char) -> Option<Value> {
        self.parameters
            .iter()
            .find(|p| p.letter == letter)
            .map(|p| p.value)
    }

    pub fn has(&self, letter: char) -> bool {
        self.parameters.iter().any(|p| p.letter == letter)
    }

    pub fn set(&mut self, letter: char, value: impl Into<Value>) {
        let value = value.into();
        match self.parameters.iter_mut().find(|p| p.letter == letter) {
            Some(param) => param.value = value,
            None => self.parameters.push(Parameter { letter, value }),
        }
    }

    pub fn remove(&mut self, letter: char) -> Option<Value> {
        let idx = self.parameters.iter().position(|p| p.letter == letter)?;
        Some(self.parameters.remove(idx).value)
    }

    /// Serialize back to a single line without comment
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

/// Parameter order is not significant
impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .all(|p| other.get(p.letter) == Some(p.value))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operation)?;
        for param in &self.parameters {
            write!(f, " {}{}", param.letter, param.value)?;
        }
        Ok(())
    }
}

/// A parsed line of GCode
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Instruction(Instruction),
    /// Blank or comment-only line; passes through every rewrite untouched
    NoOp,
}

impl ParsedLine {
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            ParsedLine::Instruction(instruction) => Some(instruction),
            ParsedLine::NoOp => None,
        }
    }

    pub fn operation(&self) -> Option<&str> {
        self.instruction().map(|i| i.operation.as_str())
    }

    /// True if the line carries parameter `letter`; always false for no-ops
    pub fn has(&self, letter: char) -> bool {
        self.instruction().is_some_and(|i| i.has(letter))
    }
}

/// Convert the tokens of `line` into a parsed line
pub fn tokens_to_parsed_line(line: &str, tokens: Vec<Token<'_>>) -> Result<ParsedLine> {
    let mut tokens = tokens.into_iter().filter(|t| t.kind != TokenKind::Comment);

    let Some(command) = tokens.next() else {
        return Ok(ParsedLine::NoOp);
    };

    let mut instruction = Instruction::new(command.text);
    for token in tokens {
        let param = parse_parameter_token(token.text).ok_or_else(|| Error::MalformedParameter {
            line: line.trim().to_string(),
            token: token.text.to_string(),
        })?;
        instruction.set(param.letter, param.value);
    }

    Ok(ParsedLine::Instruction(instruction))
}

/// Parse a parameter token like "X10.5" into a Parameter
fn parse_parameter_token(text: &str) -> Option<Parameter> {
    let mut chars = text.chars();
    let letter = chars.next()?;
    let value = Value::parse(chars.as_str())?;

    Some(Parameter { letter, value })
}

//! GCode Parser
//!
//! Parses one textual instruction into an operation plus parameters, and
//! serializes it back. Stateless: no dependence on prior lines.

pub mod ast;
pub mod lexer;

pub use ast::{Instruction, Parameter, ParsedLine, Value};
pub use lexer::{tokenize_line, Token, TokenKind};

use crate::error::Result;

/// Parse a single line of GCode into structured data
///
/// Blank and comment-only lines yield [`ParsedLine::NoOp`]. A parameter
/// that is neither an integer nor a float is an error.
pub fn parse_line(line: &str) -> Result<ParsedLine> {
    let tokens = lexer::tokenize_line(line);
    ast::tokens_to_parsed_line(line, tokens)
}

/// Serialize an operation and its parameters into a line
pub fn serialize(operation: &str, parameters: &[Parameter]) -> String {
    Instruction {
        operation: operation.to_string(),
        parameters: parameters.to_vec(),
    }
    .serialize()
}

//! GCode Lexer
//!
//! Splits one line into an operation token, parameter tokens and an
//! optional trailing `;` comment.

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Operation like "G1", "M104", "T0"
    Command,
    /// Parameter like "X10", "S255"
    Parameter,
    /// Semicolon comment, always the last token on a line
    Comment,
}

/// A token borrowed from the source line
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Tokenize a line of GCode into tokens
///
/// The first whitespace-separated word before any `;` is the command,
/// every following word is a parameter. Nothing after `;` is split.
pub fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    let (code, comment) = match line.find(';') {
        Some(idx) => (&line[..idx], Some(&line[idx..])),
        None => (line, None),
    };

    let mut tokens: Vec<Token<'_>> = code
        .split_whitespace()
        .enumerate()
        .map(|(idx, text)| Token {
            kind: if idx == 0 {
                TokenKind::Command
            } else {
                TokenKind::Parameter
            },
            text,
        })
        .collect();

    if let Some(text) = comment {
        tokens.push(Token {
            kind: TokenKind::Comment,
            text,
        });
    }

    tokens
}

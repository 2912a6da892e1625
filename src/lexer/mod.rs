//! HLSL tokenizer.
//!
//! Produces the flat token stream the parser consumes. Whitespace and
//! comments are skipped; a 1-based line counter rides along in the lexer
//! extras so every token (and every lexical error) knows its source line.

use logos::{Lexer, Logos};

use crate::errors::{CompileError, Result};

mod kind;

pub use kind::TokenKind;

/// Lexer state threaded through logos callbacks.
#[derive(Debug, Clone, Copy)]
pub struct LexerState {
    /// Current 1-based source line.
    pub line: u32,
}

impl Default for LexerState {
    fn default() -> Self {
        LexerState { line: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    UnknownCharacter,
    UnterminatedComment,
    MalformedNumber,
}

/// A single token with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

/// Bump the line counter; the newline itself is dropped in [`tokenize`].
pub(crate) fn count_newline(lex: &mut Lexer<'_, TokenKind>) {
    lex.extras.line += 1;
}

/// Scan a `/* ... */` comment by hand so we can count the newlines it spans.
pub(crate) fn scan_block_comment(lex: &mut Lexer<'_, TokenKind>) -> std::result::Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    match rem.windows(2).position(|w| w == b"*/") {
        Some(pos) => {
            let newlines = rem[..pos].iter().filter(|&&b| b == b'\n').count();
            lex.extras.line += newlines as u32;
            lex.bump(pos + 2);
            Ok(())
        }
        None => {
            lex.bump(rem.len());
            Err(LexErrorKind::UnterminatedComment)
        }
    }
}

pub(crate) fn lex_int(lex: &mut Lexer<'_, TokenKind>) -> i32 {
    // Out-of-range literals saturate, matching strtol-style clamping.
    lex.slice()
        .parse::<i64>()
        .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        .unwrap_or(i32::MAX)
}

pub(crate) fn lex_hex_int(lex: &mut Lexer<'_, TokenKind>) -> i32 {
    i64::from_str_radix(&lex.slice()[2..], 16)
        .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        .unwrap_or(i32::MAX)
}

pub(crate) fn lex_float(lex: &mut Lexer<'_, TokenKind>) -> std::result::Result<f32, LexErrorKind> {
    lex.slice()
        .trim_end_matches(['f', 'F'])
        .parse::<f32>()
        .map_err(|_| LexErrorKind::MalformedNumber)
}

pub(crate) fn lex_half(lex: &mut Lexer<'_, TokenKind>) -> std::result::Result<f32, LexErrorKind> {
    lex.slice()
        .trim_end_matches(['h', 'H'])
        .parse::<f32>()
        .map_err(|_| LexErrorKind::MalformedNumber)
}

/// Tokenize a source buffer. `file_name` is used only for diagnostics.
///
/// The returned stream always ends with a single [`TokenKind::EndOfStream`].
pub fn tokenize(source: &str, file_name: &str) -> Result<Vec<Token>> {
    let mut lexer = TokenKind::lexer_with_extras(source, LexerState::default());
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            // Trivia kept as variants only so their callbacks run.
            Ok(TokenKind::Newline | TokenKind::BlockComment) => {}
            Ok(kind) => tokens.push(Token {
                kind,
                line: lexer.extras.line,
            }),
            Err(error) => {
                let message = match error {
                    LexErrorKind::UnterminatedComment => {
                        "Syntax error: unterminated block comment".to_owned()
                    }
                    LexErrorKind::MalformedNumber => {
                        format!("Syntax error: malformed number '{}'", lexer.slice())
                    }
                    LexErrorKind::UnknownCharacter => {
                        format!("Syntax error: unexpected character '{}'", lexer.slice())
                    }
                };
                return Err(CompileError::at(file_name, lexer.extras.line, message));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::EndOfStream,
        line: lexer.extras.line,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests;

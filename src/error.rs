//! Centralised error hierarchy for the **Runic interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! Printing and error bookkeeping live in [`Reporter`]: the scanner, parser
//! and resolver hand their diagnostics to a shared sink, and the driver asks
//! the sink whether it is safe to advance to the next pipeline stage.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenKind};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RunicError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, located at a token.
    #[error("[line {line}] Error{place}: {message}")]
    Parse {
        message: String,
        place: String,
        line: usize,
    },

    /// Static-analysis failure (resolver pass), located at a token.
    #[error("[line {line}] Error{place}: {message}")]
    Resolve {
        message: String,
        place: String,
        line: usize,
    },

    /// Runtime evaluation error, reported with the offending token's line.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`.  Enables `?` on I/O ops.
    #[error("{0}")]
    Io(String),

    /// UTF-8 decoding failure when ingesting external text.
    #[error("{0}")]
    Utf8(String),
}

impl From<io::Error> for RunicError {
    fn from(err: io::Error) -> Self {
        RunicError::Io(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RunicError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RunicError::Utf8(err.to_string())
    }
}

/// `" at end"` for EOF, `" at '<lexeme>'"` otherwise.
fn place_of(token: &Token) -> String {
    if token.kind == TokenKind::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl RunicError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        RunicError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        RunicError::Parse {
            message,
            place: place_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        RunicError::Resolve {
            message,
            place: place_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, msg={}",
            token.line, message
        );

        RunicError::Runtime {
            message,
            line: token.line,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RunicError>;

/// Diagnostic sink shared by the front-end passes.
///
/// Scan, parse and resolve errors accumulate here; the driver must not
/// execute a program once `had_error()` reports true.  Runtime errors are
/// recorded separately so file mode can exit with a distinct status.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<String>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    /// Record a scan/parse/resolve diagnostic and echo it to stderr.
    pub fn report(&mut self, err: &RunicError) {
        let rendered: String = err.to_string();

        eprintln!("{}", rendered);

        self.diagnostics.push(rendered);
        self.had_error = true;
    }

    /// Record a runtime failure and echo it to stderr.
    pub fn report_runtime(&mut self, err: &RunicError) {
        let rendered: String = err.to_string();

        eprintln!("{}", rendered);

        self.diagnostics.push(rendered);
        self.had_runtime_error = true;
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Rendered diagnostics, oldest first.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Reset error state between REPL lines.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    #[test]
    fn static_error_format() {
        let token = Token::new(TokenKind::SEMICOLON, ";".to_string(), 3);
        let err = RunicError::parse(&token, "Expect expression.");

        assert_eq!(err.to_string(), "[line 3] Error at ';': Expect expression.");
    }

    #[test]
    fn eof_error_reports_at_end() {
        let token = Token::new(TokenKind::EOF, "".to_string(), 9);
        let err = RunicError::parse(&token, "Expect ';' after value.");

        assert_eq!(
            err.to_string(),
            "[line 9] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn runtime_error_format() {
        let token = Token::new(TokenKind::SLASH, "/".to_string(), 2);
        let err = RunicError::runtime(&token, "Cannot divide by zero.");

        assert_eq!(err.to_string(), "Cannot divide by zero.\n[line 2]");
    }

    #[test]
    fn reporter_accumulates() {
        let mut reporter = Reporter::new();
        assert!(!reporter.had_error());

        reporter.report(&RunicError::lex(1, "Unexpected character."));
        assert!(reporter.had_error());
        assert_eq!(reporter.diagnostics().len(), 1);

        reporter.clear();
        assert!(!reporter.had_error());
        assert!(reporter.diagnostics().is_empty());
    }
}

//! Tree-walking interpreter for the Runic scripting language.
//!
//! The pipeline is scanner → parser → resolver → evaluator; [`run`] wires
//! the stages together over a shared diagnostic sink and skips execution
//! once any front-end stage has reported an error.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Run one source chunk through the full pipeline.
///
/// Scan and parse diagnostics accumulate in `reporter`; execution is
/// skipped entirely once anything has been reported.  A runtime failure is
/// recorded through `reporter` as well, so the caller can distinguish the
/// three error classes by flag.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>, reporter: &mut Reporter) {
    let tokens = Scanner::new(source).scan_tokens(reporter);

    let statements = Parser::new(tokens, reporter).parse();

    if reporter.had_error() {
        return;
    }

    Resolver::new(interpreter, reporter).resolve(&statements);

    if reporter.had_error() {
        return;
    }

    if let Err(err) = interpreter.interpret(&statements) {
        reporter.report_runtime(&err);
    }
}

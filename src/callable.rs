//! User functions, lambdas and native functions.
//!
//! A [`Function`] pairs a shared declaration with the environment captured
//! at its point of creation; [`bind`](Function::bind) layers a one-entry
//! `this` frame on top for method dispatch.  Lambdas capture the global
//! environment only.  The actual body execution lives in the interpreter,
//! which owns block execution and the control-flow channel.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::ast::{FunctionDecl, Stmt};
use crate::environment::Environment;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A new function whose closure has `this` bound to `receiver`,
    /// enclosing the original closure.  Created fresh on each property
    /// access; binding is cheap.
    pub fn bind(&self, receiver: Value) -> Function {
        debug!(
            "Binding method '{}' to receiver",
            self.declaration.name.lexeme
        );

        let mut environment: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", receiver);

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

/// An anonymous `lambda (...) { ... }` value.  Its captured environment is
/// the interpreter's global frame at creation time; surrounding locals are
/// not captured.
#[derive(Debug)]
pub struct LambdaFn {
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub globals: Rc<RefCell<Environment>>,
}

impl LambdaFn {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A built-in function backed by a plain fn pointer.
#[derive(Debug, Clone)]
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

//! Tree-walking evaluator.
//!
//! Expressions evaluate post-order to a [`Value`]; statements execute for
//! side effects.  Variable references resolved by the static pass are read
//! by walking exactly the recorded number of environment links; everything
//! else goes to the globals frame.
//!
//! `return` and `break` are non-local control-flow signals, not errors:
//! the evaluator propagates an [`Interrupt`] sum up the recursion and each
//! construct catches the variant it binds (calls catch `Return`, loops
//! catch `Break`, runtime failures travel to the driver).  Every
//! environment pushed by a block or call is restored on every exit path.
//!
//! Program output goes through a generic `Write` sink so tests can capture
//! it exactly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Lit, Stmt};
use crate::callable::{clock_native, Function, LambdaFn, NativeFn};
use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{Result, RunicError};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Non-local control flow, propagated through the recursive walk.
#[derive(Debug)]
pub enum Interrupt {
    /// `return` unwinding to the nearest call boundary.
    Return(Value),

    /// `break` unwinding to the nearest enclosing loop.
    Break,

    /// A runtime error unwinding all the way to the driver.
    Failure(RunicError),
}

impl From<RunicError> for Interrupt {
    fn from(err: RunicError) -> Self {
        Interrupt::Failure(err)
    }
}

type EResult<T> = std::result::Result<T, Interrupt>;

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    out: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(NativeFn {
                name: "clock",
                arity: 0,
                func: clock_native,
            }),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Record a variable occurrence's scope depth.  Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Recording depth {} for expr #{}", depth, id);

        self.locals.insert(id, depth);
    }

    /// Execute a resolved program.  The driver must not call this when the
    /// reporter holds front-end errors.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Interrupt::Failure(err)) => return Err(err),

                Err(Interrupt::Return(_)) | Err(Interrupt::Break) => {
                    unreachable!("resolver rejects top-level return/break")
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> EResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.out, "{}", value).map_err(RunicError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment: Environment =
                    Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                // The condition is re-evaluated before every iteration and
                // the truthiness of its *result* is tested.
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}

                        Err(Interrupt::Break) => break,

                        Err(err) => return Err(err),
                    }
                }

                Ok(())
            }

            Stmt::Break(_) => Err(Interrupt::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,

                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Function(declaration) => {
                let function: Function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => self.execute_class(name, superclass.as_ref(), methods, class_methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        class_methods: &[Rc<FunctionDecl>],
    ) -> EResult<()> {
        let superclass_value: Option<Rc<Class>> = match superclass {
            Some(expr) => {
                let value: Value = self.evaluate(expr)?;

                match value {
                    Value::Class(class) => Some(class),

                    _ => {
                        let at: &Token = match expr {
                            Expr::Variable { name, .. } => name,
                            _ => name,
                        };

                        return Err(
                            RunicError::runtime(at, "Superclass must be a class.").into()
                        );
                    }
                }
            }

            None => None,
        };

        // Two-step define/assign so methods can refer to the class by name.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let mut method_table: HashMap<String, Rc<Function>> = HashMap::new();

        for declaration in methods {
            let is_initializer: bool = declaration.name.lexeme == "init";

            let function: Function = Function::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                is_initializer,
            );

            method_table.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let mut class_method_table: HashMap<String, Rc<Function>> = HashMap::new();

        for declaration in class_methods {
            let function: Function = Function::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                false,
            );

            class_method_table.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let class: Value = Value::Class(Rc::new(Class::new(
            name.lexeme.clone(),
            superclass_value,
            method_table,
            class_method_table,
        )));

        self.environment.borrow_mut().assign(&name.lexeme, class);

        Ok(())
    }

    /// Run `statements` inside `environment`, restoring the previous frame
    /// on every exit path (normal, return, break, runtime error).
    fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> EResult<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = Rc::new(RefCell::new(environment));

        let mut result: EResult<()> = Ok(());

        for statement in statements {
            result = self.execute(statement);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> EResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Lit::Nil => Value::Nil,

                Lit::Bool(b) => Value::Bool(*b),

                Lit::Number(n) => Value::Number(*n),

                Lit::Str(s) => Value::Str(s.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_value: Value = self.evaluate(left)?;

                // The unconverted operand is the result, not a coerced bool.
                if operator.kind == TokenKind::OR {
                    if left_value.is_truthy() {
                        return Ok(left_value);
                    }
                } else if !left_value.is_truthy() {
                    return Ok(left_value);
                }

                self.evaluate(right)
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Comma { left, right } => {
                self.evaluate(left)?;

                self.evaluate(right)
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(self.undefined_variable(name));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee_value, args, paren)
            }

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object_value: Value = self.evaluate(object)?;

                match object_value {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance
                            .borrow_mut()
                            .set_field(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(RunicError::runtime(name, "Only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Lambda { params, body } => Ok(Value::Lambda(Rc::new(LambdaFn {
                params: params.clone(),
                body: Rc::clone(body),
                globals: Rc::clone(&self.globals),
            }))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EResult<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.kind {
            TokenKind::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(RunicError::runtime(operator, "Operand must be a number.").into()),
            },

            TokenKind::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => unreachable!("parser emits only '!' and '-' as unary"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EResult<Value> {
        let left_value: Value = self.evaluate(left)?;
        let right_value: Value = self.evaluate(right)?;

        match operator.kind {
            TokenKind::PLUS => match (&left_value, &right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // Either operand a string: concatenate, stringifying the
                // other side.
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    Ok(Value::Str(format!("{}{}", left_value, right_value)))
                }

                _ => Err(RunicError::runtime(
                    operator,
                    "Operands must both be numbers or one of them a string.",
                )
                .into()),
            },

            TokenKind::MINUS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::STAR => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::SLASH => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(RunicError::runtime(operator, "Cannot divide by zero.").into())
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::GREATER => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::GREATER_EQUAL => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::LESS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::LESS_EQUAL => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(RunicError::runtime(operator, "Operands must be numbers.").into()),
            },

            TokenKind::EQUAL_EQUAL => Ok(Value::Bool(left_value == right_value)),

            TokenKind::BANG_EQUAL => Ok(Value::Bool(left_value != right_value)),

            _ => unreachable!("parser emits no other binary operators"),
        }
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> EResult<Value> {
        let object_value: Value = self.evaluate(object)?;

        match object_value {
            Value::Instance(instance) => {
                // Fields shadow methods.
                if let Some(value) = instance.borrow().field(&name.lexeme) {
                    return Ok(value);
                }

                let method: Option<Rc<Function>> =
                    instance.borrow().class.find_method(&name.lexeme);

                match method {
                    Some(method) => {
                        let bound: Function = method.bind(Value::Instance(Rc::clone(&instance)));

                        Ok(Value::Function(Rc::new(bound)))
                    }

                    None => Err(RunicError::runtime(
                        name,
                        format!("No such property found: '{}'.", name.lexeme),
                    )
                    .into()),
                }
            }

            // A class value is instance-like with respect to its class
            // methods.
            Value::Class(class) => match class.find_class_method(&name.lexeme) {
                Some(method) => {
                    let bound: Function = method.bind(Value::Class(Rc::clone(&class)));

                    Ok(Value::Function(Rc::new(bound)))
                }

                None => Err(RunicError::runtime(
                    name,
                    format!("No such static method found: {}.", name.lexeme),
                )
                .into()),
            },

            _ => Err(RunicError::runtime(name, "Only instances have properties.").into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> EResult<Value> {
        match callee {
            Value::Native(native) => {
                self.check_arity(native.arity, args.len(), paren)?;

                (native.func)(&args)
                    .map_err(|msg| RunicError::runtime(paren, msg).into())
            }

            Value::Function(function) => {
                self.check_arity(function.arity(), args.len(), paren)?;

                self.call_function(&function, args)
            }

            Value::Lambda(lambda) => {
                self.check_arity(lambda.arity(), args.len(), paren)?;

                self.call_lambda(&lambda, args)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), args.len(), paren)?;

                self.construct(class, args)
            }

            _ => Err(RunicError::runtime(paren, "Can only call functions and classes.").into()),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> EResult<()> {
        if expected != got {
            return Err(RunicError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", expected, got),
            )
            .into());
        }

        Ok(())
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> EResult<Value> {
        debug!("Calling function '{}'", function.declaration.name.lexeme);

        let mut environment: Environment =
            Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, arg) in function.declaration.params.iter().zip(args) {
            environment.define(&param.lexeme, arg);
        }

        match self.execute_block(&function.declaration.body, environment) {
            Ok(()) => {
                if function.is_initializer {
                    Ok(self.bound_this(function))
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Interrupt::Return(value)) => {
                // A bare `return;` in an initializer still yields `this`.
                if function.is_initializer {
                    Ok(self.bound_this(function))
                } else {
                    Ok(value)
                }
            }

            Err(other) => Err(other),
        }
    }

    /// The receiver an initializer's closure was bound to.
    fn bound_this(&self, function: &Function) -> Value {
        Environment::get_at(&function.closure, 0, "this").unwrap_or(Value::Nil)
    }

    fn call_lambda(&mut self, lambda: &LambdaFn, args: Vec<Value>) -> EResult<Value> {
        debug!("Calling lambda with {} argument(s)", args.len());

        let mut environment: Environment =
            Environment::with_enclosing(Rc::clone(&lambda.globals));

        for (param, arg) in lambda.params.iter().zip(args) {
            environment.define(&param.lexeme, arg);
        }

        match self.execute_block(&lambda.body, environment) {
            Ok(()) => Ok(Value::Nil),

            Err(Interrupt::Return(value)) => Ok(value),

            Err(other) => Err(other),
        }
    }

    fn construct(&mut self, class: Rc<Class>, args: Vec<Value>) -> EResult<Value> {
        debug!("Constructing {} instance", class.name);

        let instance: Rc<RefCell<Instance>> =
            Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

        if let Some(initializer) = class.find_method("init") {
            let bound: Function = initializer.bind(Value::Instance(Rc::clone(&instance)));

            self.call_function(&bound, args)?;
        }

        Ok(Value::Instance(instance))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Variable access
    // ─────────────────────────────────────────────────────────────────────

    fn look_up_variable(&self, name: &Token, id: ExprId) -> EResult<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| self.undefined_variable(name))
    }

    fn undefined_variable(&self, name: &Token) -> Interrupt {
        RunicError::runtime(name, format!("Undefined variable '{}'.", name.lexeme)).into()
    }
}

//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (`false`) and fully defined (`true`) names per block.
//! 2. **Enforces static rules**: duplicate locals, reading a variable in its
//!    own initializer, `return` outside a function, value returns from an
//!    initializer, `break` outside a loop, `this` outside a class, and class
//!    self-inheritance.  Every violation goes to the shared [`Reporter`] and
//!    the walk continues, so one pass surfaces all of them.
//! 3. **Records binding distances**: each `Variable`/`Assign`/`This`
//!    occurrence found on the scope stack is reported to the interpreter
//!    with its depth; names not found anywhere are globals and get no entry.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{Reporter, RunicError};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// What kind of function body the resolver is currently in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Init,
    Method,
    ClassMethod,
}

/// What kind of class body the resolver is currently in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    reporter: &'a mut Reporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    in_a_loop: bool,
}

impl<'a, W: Write> Resolver<'a, W> {
    pub fn new(interpreter: &'a mut Interpreter<W>, reporter: &'a mut Reporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_a_loop: false,
        }
    }

    /// Walk all top-level statements, accumulating diagnostics.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declare and define eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => {
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(expr) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = expr
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class cannot inherit from itself.");
                        }
                    }

                    self.resolve_expr(expr);
                }

                // Methods see `this` one frame above their own scope.
                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this".to_string(), true);
                }

                for method in methods {
                    let kind: FunctionType = if method.name.lexeme == "init" {
                        FunctionType::Init
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, kind);
                }

                for class_method in class_methods {
                    self.resolve_function(class_method, FunctionType::ClassMethod);
                }

                self.end_scope();

                self.current_class = enclosing_class;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                let enclosed_in_loop: bool = self.in_a_loop;
                self.in_a_loop = true;

                self.resolve_expr(condition);
                self.resolve_stmt(body);

                self.in_a_loop = enclosed_in_loop;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Init {
                        self.error(
                            keyword,
                            "Cannot return a value from an instance initializer.",
                        );
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Break(keyword) => {
                if !self.in_a_loop {
                    self.error(keyword, "Cannot use break when not in a loop.");
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. }
            | Expr::Logical { left, right, .. }
            | Expr::Comma { left, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                // The only time a name maps to `false` here is while its own
                // initializer is being resolved.
                let shadows_itself: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if shadows_itself {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Lambda { params, body } => {
                // A lambda body is a function context for `return`
                // validation, but it binds no name and, at runtime, captures
                // only globals.
                let enclosing: FunctionType = self.current_function;
                self.current_function = FunctionType::Function;

                let enclosed_in_loop: bool = self.in_a_loop;
                self.in_a_loop = false;

                self.begin_scope();

                for param in params {
                    self.declare(param);
                    self.define(param);
                }

                for stmt in body.iter() {
                    self.resolve_stmt(stmt);
                }

                self.end_scope();

                self.in_a_loop = enclosed_in_loop;
                self.current_function = enclosing;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        // A `break` may not cross a call boundary.
        let enclosed_in_loop: bool = self.in_a_loop;
        self.in_a_loop = false;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.in_a_loop = enclosed_in_loop;
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Duplicate declarations are rejected locally but permitted for
    /// globals.
    fn declare(&mut self, name: &Token) {
        let duplicate: bool = match self.scopes.last() {
            Some(scope) => scope.contains_key(&name.lexeme),

            None => return,
        };

        if duplicate {
            self.error(
                name,
                "Variable with the same name already declared in this scope.",
            );

            return;
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its depth, or leave it for the
    /// globals frame when no scope knows the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.resolve(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error<S: Into<String>>(&mut self, token: &Token, msg: S) {
        self.reporter.report(&RunicError::resolve(token, msg));
    }
}

//! Syntax tree for the Runic language.
//!
//! Expressions and statements are tagged enums with boxed children; every
//! pass (printer, resolver, evaluator) pattern-matches over them directly.
//! `Variable`, `Assign` and `This` nodes carry a monotonic [`ExprId`]
//! assigned by the parser, which keys the resolver's depth side-table.
//! Function and lambda bodies are `Rc`-shared so runtime callables can hold
//! them after the statement list that produced them is gone.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Stable identity for expression nodes the resolver needs to tag.
pub type ExprId = usize;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Ids are unique across every parse in the process, so a REPL session's
/// accumulated side-table never sees a collision from a later line.
pub fn fresh_expr_id() -> ExprId {
    NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

/// A named function declaration, shared between the AST and the runtime
/// closure that executes it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Expr {
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `a, b` evaluates both, discards the left value.
    Comma {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Grouping(Box<Expr>),

    Lambda {
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
    },

    Literal(Lit),

    /// Distinct from `Binary`: short-circuits.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        colon: Token,
        else_branch: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },
}

#[derive(Debug)]
pub enum Stmt {
    Block(Vec<Stmt>),

    Break(Token),

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
        class_methods: Vec<Rc<FunctionDecl>>,
    },

    Expression(Expr),

    Function(Rc<FunctionDecl>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Print(Expr),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

//! Recursive-descent parser: token list to statement list.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! program     → declaration* EOF
//! declaration → classDecl | funDecl | varDecl | statement
//! classDecl   → "class" IDENTIFIER ( "<" IDENTIFIER )?
//!               "{" ( "class"? function )* "}"
//! funDecl     → "fun" function
//! function    → IDENTIFIER "(" params? ")" block
//! varDecl     → "var" IDENTIFIER ( "=" expression )? ";"
//! statement   → forStmt | ifStmt | printStmt | returnStmt
//!             | breakStmt | whileStmt | block | exprStmt
//! expression  → comma
//! comma       → assignment ( "," assignment )*
//! assignment  → ( call "." IDENTIFIER | IDENTIFIER ) "=" assignment
//!             | conditional
//! conditional → lambda ( "?" expression ":" conditional )?
//! lambda      → "lambda" "(" params? ")" block | logicOr
//! logicOr     → logicAnd ( "or" logicAnd )*
//! logicAnd    → equality ( "and" equality )*
//! equality    → comparison ( ("!=" | "==") comparison )*
//! comparison  → term ( (">" | ">=" | "<" | "<=") term )*
//! term        → factor ( ("-" | "+") factor )*
//! factor      → unary ( ("/" | "*") unary )*
//! unary       → ("!" | "-") unary | call
//! call        → primary ( "(" arguments? ")" | "." IDENTIFIER )*
//! primary     → "false" | "true" | "nil" | NUMBER | STRING
//!             | "this" | IDENTIFIER | "(" expression ")"
//! ```
//!
//! `for` desugars to a `while` inside a block.  Parameter and argument
//! lists are capped at 32 entries.  Any parse error is reported to the
//! shared [`Reporter`] and recovery advances to the next statement
//! boundary, so a single run surfaces as many diagnostics as possible.

use std::rc::Rc;

use log::{debug, info};

use crate::ast::{fresh_expr_id, Expr, ExprId, FunctionDecl, Lit, Stmt};
use crate::error::{Reporter, RunicError};
use crate::token::{Token, TokenKind};

const MAX_PARAMS: usize = 32;
const MAX_ARGS: usize = 32;

/// Marker for an already-reported parse error; unwinds to the nearest
/// statement boundary where `synchronize` resumes.
struct ParseInterrupt;

type PResult<T> = std::result::Result<T, ParseInterrupt>;

pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'r mut Reporter,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, reporter: &'r mut Reporter) -> Self {
        Parser {
            tokens,
            current: 0,
            reporter,
        }
    }

    /// Parse the whole token stream.
    ///
    /// Always produces a (possibly partial) statement list; the caller must
    /// consult the reporter before executing it.
    pub fn parse(mut self) -> Vec<Stmt> {
        info!("Beginning parse over {} token(s)", self.tokens.len());

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),

                Err(ParseInterrupt) => self.synchronize(),
            }
        }

        statements
    }

    // ─────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> PResult<Stmt> {
        if self.match_kinds(&[TokenKind::CLASS]) {
            return self.class_declaration();
        }

        if self.match_kinds(&[TokenKind::FUN]) {
            return Ok(Stmt::Function(self.function("function")?));
        }

        if self.match_kinds(&[TokenKind::VAR]) {
            return self.var_declaration();
        }

        self.statement()
    }

    fn class_declaration(&mut self) -> PResult<Stmt> {
        let name: Token = self.consume(TokenKind::IDENTIFIER, "Expect class name.")?;

        // `class Sub < Super` names the superclass as a variable reference.
        let superclass: Option<Expr> = if self.match_kinds(&[TokenKind::LESS]) {
            let super_name: Token =
                self.consume(TokenKind::IDENTIFIER, "Expect superclass name.")?;

            Some(Expr::Variable {
                id: self.fresh_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenKind::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut class_methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(&TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            // A member prefixed with `class` is a class-level method.
            if self.match_kinds(&[TokenKind::CLASS]) {
                class_methods.push(self.function("class method")?);
            } else {
                methods.push(self.function("method")?);
            }
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} method(s), {} class method(s)",
            name.lexeme,
            methods.len(),
            class_methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
            class_methods,
        })
    }

    fn function(&mut self, kind: &str) -> PResult<Rc<FunctionDecl>> {
        let name: Token =
            self.consume(TokenKind::IDENTIFIER, format!("Expect {} name.", kind))?;

        self.consume(
            TokenKind::LEFT_PAREN,
            format!("Expect '(' after {} name.", kind),
        )?;

        let params: Vec<Token> = self.parameters()?;

        self.consume(
            TokenKind::LEFT_BRACE,
            format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    /// Parses `params? ")"`; the opening paren is already consumed.
    fn parameters(&mut self) -> PResult<Vec<Token>> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_PARAMS {
                    // Report but keep parsing so later errors still surface.
                    let token: Token = self.peek().clone();
                    self.report(&token, "Cannot have more than 32 parameters.");
                }

                params.push(self.consume(TokenKind::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_kinds(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after parameters.")?;

        Ok(params)
    }

    fn var_declaration(&mut self) -> PResult<Stmt> {
        let name: Token = self.consume(TokenKind::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_kinds(&[TokenKind::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenKind::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> PResult<Stmt> {
        if self.match_kinds(&[TokenKind::FOR]) {
            return self.for_statement();
        }

        if self.match_kinds(&[TokenKind::IF]) {
            return self.if_statement();
        }

        if self.match_kinds(&[TokenKind::PRINT]) {
            return self.print_statement();
        }

        if self.match_kinds(&[TokenKind::RETURN]) {
            return self.return_statement();
        }

        if self.match_kinds(&[TokenKind::BREAK]) {
            return self.break_statement();
        }

        if self.match_kinds(&[TokenKind::WHILE]) {
            return self.while_statement();
        }

        if self.match_kinds(&[TokenKind::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    /// `for (init; cond; incr) body` is rewritten at parse time into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_kinds(&[TokenKind::SEMICOLON]) {
            None
        } else if self.match_kinds(&[TokenKind::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(&TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(&TokenKind::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }

        let condition: Expr = condition.unwrap_or(Expr::Literal(Lit::Bool(true)));

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_kinds(&[TokenKind::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenKind::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if !self.check(&TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn break_statement(&mut self) -> PResult<Stmt> {
        let keyword: Token = self.previous().clone();

        self.consume(TokenKind::SEMICOLON, "Expect ';' after 'break'.")?;

        Ok(Stmt::Break(keyword))
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// Parses `declaration* "}"`; the opening brace is already consumed.
    fn block(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),

                Err(ParseInterrupt) => self.synchronize(),
            }
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> PResult<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenKind::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> PResult<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.assignment()?;

        while self.match_kinds(&[TokenKind::COMMA]) {
            let right: Expr = self.assignment()?;

            expr = Expr::Comma {
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr: Expr = self.conditional()?;

        if self.match_kinds(&[TokenKind::EQUAL]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            // Re-interpret the parsed l-value.
            match expr {
                Expr::Variable { name, .. } => {
                    return Ok(Expr::Assign {
                        id: self.fresh_id(),
                        name,
                        value: Box::new(value),
                    });
                }

                Expr::Get { object, name } => {
                    return Ok(Expr::Set {
                        object,
                        name,
                        value: Box::new(value),
                    });
                }

                _ => {
                    // Report without unwinding; parsing can continue.
                    self.report(&equals, "Invalid assignment target.");
                }
            }

            return Ok(value);
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> PResult<Expr> {
        let expr: Expr = self.lambda()?;

        if self.match_kinds(&[TokenKind::QUESTION]) {
            let question: Token = self.previous().clone();

            // The middle operand parses at full expression precedence, as
            // if parenthesized.
            let then_branch: Expr = self.expression()?;

            let colon: Token =
                self.consume(TokenKind::COLON, "Expect ':' in conditional expression.")?;

            // Right-associative.
            let else_branch: Expr = self.conditional()?;

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                question,
                then_branch: Box::new(then_branch),
                colon,
                else_branch: Box::new(else_branch),
            });
        }

        Ok(expr)
    }

    fn lambda(&mut self) -> PResult<Expr> {
        if self.match_kinds(&[TokenKind::LAMBDA]) {
            self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'lambda'.")?;

            let params: Vec<Token> = self.parameters()?;

            self.consume(TokenKind::LEFT_BRACE, "Expect '{' before lambda body.")?;

            let body: Vec<Stmt> = self.block()?;

            return Ok(Expr::Lambda {
                params,
                body: Rc::new(body),
            });
        }

        self.logic_or()
    }

    fn logic_or(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.logic_and()?;

        while self.match_kinds(&[TokenKind::OR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logic_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logic_and(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.match_kinds(&[TokenKind::AND]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.match_kinds(&[TokenKind::BANG_EQUAL, TokenKind::EQUAL_EQUAL]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.term()?;

        while self.match_kinds(&[
            TokenKind::GREATER,
            TokenKind::GREATER_EQUAL,
            TokenKind::LESS,
            TokenKind::LESS_EQUAL,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.match_kinds(&[TokenKind::MINUS, TokenKind::PLUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.match_kinds(&[TokenKind::SLASH, TokenKind::STAR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.match_kinds(&[TokenKind::BANG, TokenKind::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.match_kinds(&[TokenKind::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_kinds(&[TokenKind::DOT]) {
                let name: Token =
                    self.consume(TokenKind::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenKind::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let token: Token = self.peek().clone();
                    self.report(&token, "Cannot have more than 32 arguments.");
                }

                // Arguments parse one level below the comma operator so the
                // separating commas stay separators.
                arguments.push(self.assignment()?);

                if !self.match_kinds(&[TokenKind::COMMA]) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> PResult<Expr> {
        if self.match_kinds(&[TokenKind::FALSE]) {
            return Ok(Expr::Literal(Lit::Bool(false)));
        }

        if self.match_kinds(&[TokenKind::TRUE]) {
            return Ok(Expr::Literal(Lit::Bool(true)));
        }

        if self.match_kinds(&[TokenKind::NIL]) {
            return Ok(Expr::Literal(Lit::Nil));
        }

        if self.match_kinds(&[TokenKind::NUMBER(0.0), TokenKind::STRING(String::new())]) {
            let literal: Lit = match &self.previous().kind {
                TokenKind::NUMBER(n) => Lit::Number(*n),

                TokenKind::STRING(s) => Lit::Str(s.clone()),

                _ => unreachable!("just matched a literal token"),
            };

            return Ok(Expr::Literal(literal));
        }

        if self.match_kinds(&[TokenKind::THIS]) {
            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_kinds(&[TokenKind::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_kinds(&[TokenKind::LEFT_PAREN]) {
            let expr: Expr = self.expression()?;

            self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        self.leading_binary_operand()
    }

    /// Error production: a binary operator with no left operand.  Reports
    /// at the operator, then parses and discards the right operand at the
    /// operator's own precedence so recovery resumes cleanly.
    fn leading_binary_operand(&mut self) -> PResult<Expr> {
        let token: Token = self.peek().clone();

        match token.kind {
            TokenKind::COMMA => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                self.expression()
            }

            TokenKind::QUESTION => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                let discarded: Expr = self.expression()?;

                if self.match_kinds(&[TokenKind::COLON]) {
                    return self.conditional();
                }

                Ok(discarded)
            }

            TokenKind::BANG_EQUAL | TokenKind::EQUAL_EQUAL => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                self.equality()
            }

            TokenKind::GREATER
            | TokenKind::GREATER_EQUAL
            | TokenKind::LESS
            | TokenKind::LESS_EQUAL => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                self.comparison()
            }

            // `-` is legal unary and never reaches this point.
            TokenKind::PLUS => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                self.term()
            }

            TokenKind::SLASH | TokenKind::STAR => {
                self.report(&token, "Expected a left operand.");
                self.advance();

                self.factor()
            }

            _ => Err(self.error(&token, "Expect expression.")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Error handling
    // ─────────────────────────────────────────────────────────────────────

    /// Report a diagnostic without unwinding.
    fn report<S: Into<String>>(&mut self, token: &Token, msg: S) {
        self.reporter.report(&RunicError::parse(token, msg));
    }

    /// Report a diagnostic and hand back the unwind marker.
    fn error<S: Into<String>>(&mut self, token: &Token, msg: S) -> ParseInterrupt {
        self.report(token, msg);

        ParseInterrupt
    }

    /// Discard tokens until just past a `;` or just before a keyword that
    /// starts a new statement.
    fn synchronize(&mut self) {
        debug!("Synchronizing at token {}", self.current);

        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::SEMICOLON {
                return;
            }

            match self.peek().kind {
                TokenKind::CLASS
                | TokenKind::FUN
                | TokenKind::VAR
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::PRINT
                | TokenKind::RETURN => return,

                _ => {}
            }

            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor helpers
    // ─────────────────────────────────────────────────────────────────────

    fn fresh_id(&mut self) -> ExprId {
        fresh_expr_id()
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn consume<S: Into<String>>(&mut self, kind: TokenKind, msg: S) -> PResult<Token> {
        if self.check(&kind) {
            return Ok(self.advance().clone());
        }

        let token: Token = self.peek().clone();

        Err(self.error(&token, msg))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }
}

use log::debug;
use std::fmt;
use std::mem;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum TokenKind {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,
    QUESTION,
    COLON,

    // One or two character tokens.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    BREAK,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    LAMBDA,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    // Special Characters
    EOF,
}

/// Literal payloads are ignored so the parser can match against sentinel
/// values like `TokenKind::NUMBER(0.0)`.
impl PartialEq for TokenKind {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl Eq for TokenKind {}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, line: usize) -> Self {
        debug!(
            "Creating token: kind={:?}, lexeme={}, line={}",
            kind, lexeme, line
        );

        Self { kind, lexeme, line }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal: String = match &self.kind {
            TokenKind::STRING(literal) => literal.clone(),

            TokenKind::NUMBER(num_literal) => {
                if num_literal.fract() == 0.0 {
                    format!("{:.1}", num_literal)
                } else {
                    format!("{}", num_literal)
                }
            }

            _ => "null".to_string(),
        };

        let tmp: String = format!("{:?}", self.kind);
        let kind_name: &str = tmp.split('(').next().unwrap_or(&tmp);

        write!(f, "{} {} {}", kind_name, self.lexeme, literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_compare_by_discriminant() {
        assert_eq!(TokenKind::NUMBER(1.0), TokenKind::NUMBER(42.0));
        assert_eq!(
            TokenKind::STRING("a".to_string()),
            TokenKind::STRING("b".to_string())
        );
        assert_ne!(TokenKind::NUMBER(1.0), TokenKind::STRING("1".to_string()));
    }

    #[test]
    fn display_includes_literal() {
        let token = Token::new(TokenKind::NUMBER(7.0), "7".to_string(), 1);
        assert_eq!(token.to_string(), "NUMBER 7 7.0");

        let token = Token::new(TokenKind::SEMICOLON, ";".to_string(), 1);
        assert_eq!(token.to_string(), "SEMICOLON ; null");
    }
}

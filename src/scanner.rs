//! Lexical scanner: source text to an EOF-terminated token list.
//!
//! Single forward pass over the raw bytes, tracking `start`, `current` and
//! `line`.  Errors are handed to the shared [`Reporter`] and scanning
//! continues, so one bad character cannot hide later diagnostics.

use log::{debug, info};
use phf::phf_map;

use crate::error::{Reporter, RunicError};
use crate::token::{Token, TokenKind};

static KEYWORDS: phf::Map<&'static [u8], TokenKind> = phf_map! {
    b"and" => TokenKind::AND,
    b"break" => TokenKind::BREAK,
    b"class" => TokenKind::CLASS,
    b"else" => TokenKind::ELSE,
    b"false" => TokenKind::FALSE,
    b"fun" => TokenKind::FUN,
    b"for" => TokenKind::FOR,
    b"if" => TokenKind::IF,
    b"lambda" => TokenKind::LAMBDA,
    b"nil" => TokenKind::NIL,
    b"or" => TokenKind::OR,
    b"print" => TokenKind::PRINT,
    b"return" => TokenKind::RETURN,
    b"super" => TokenKind::SUPER,
    b"this" => TokenKind::THIS,
    b"true" => TokenKind::TRUE,
    b"var" => TokenKind::VAR,
    b"while" => TokenKind::WHILE,
};

#[derive(Debug)]
pub struct Scanner {
    source: Vec<u8>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        info!("Initializing Scanner with {} bytes", source.len());

        Self {
            source: source.as_bytes().to_vec(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scan the whole source, reporting errors to `reporter` as they occur.
    ///
    /// Always returns a complete token list terminated by `EOF`; the caller
    /// must consult `reporter.had_error()` before executing anything.
    pub fn scan_tokens(mut self, reporter: &mut Reporter) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(reporter);
        }

        self.tokens
            .push(Token::new(TokenKind::EOF, String::new(), self.line));

        info!("Scanned {} token(s)", self.tokens.len());

        self.tokens
    }

    fn scan_token(&mut self, reporter: &mut Reporter) {
        let byte: u8 = self.advance();

        match byte {
            b'(' => self.add_token(TokenKind::LEFT_PAREN),

            b')' => self.add_token(TokenKind::RIGHT_PAREN),

            b'{' => self.add_token(TokenKind::LEFT_BRACE),

            b'}' => self.add_token(TokenKind::RIGHT_BRACE),

            b',' => self.add_token(TokenKind::COMMA),

            b'.' => self.add_token(TokenKind::DOT),

            b'-' => self.add_token(TokenKind::MINUS),

            b'+' => self.add_token(TokenKind::PLUS),

            b';' => self.add_token(TokenKind::SEMICOLON),

            b'*' => self.add_token(TokenKind::STAR),

            b'?' => self.add_token(TokenKind::QUESTION),

            b':' => self.add_token(TokenKind::COLON),

            b'!' => {
                let kind: TokenKind = if self.match_byte(b'=') {
                    TokenKind::BANG_EQUAL
                } else {
                    TokenKind::BANG
                };

                self.add_token(kind);
            }

            b'=' => {
                let kind: TokenKind = if self.match_byte(b'=') {
                    TokenKind::EQUAL_EQUAL
                } else {
                    TokenKind::EQUAL
                };

                self.add_token(kind);
            }

            b'<' => {
                let kind: TokenKind = if self.match_byte(b'=') {
                    TokenKind::LESS_EQUAL
                } else {
                    TokenKind::LESS
                };

                self.add_token(kind);
            }

            b'>' => {
                let kind: TokenKind = if self.match_byte(b'=') {
                    TokenKind::GREATER_EQUAL
                } else {
                    TokenKind::GREATER
                };

                self.add_token(kind);
            }

            b' ' | b'\r' | b'\t' => {
                debug!("Skipping whitespace");
            }

            b'\n' => {
                self.line += 1;
            }

            b'/' => {
                if self.match_byte(b'/') {
                    debug!("Line comment, skipping until newline");

                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_byte(b'*') {
                    debug!("Block comment, skipping until '*/'");

                    self.skip_block_comment();
                } else {
                    self.add_token(TokenKind::SLASH);
                }
            }

            b'"' => self.scan_string(reporter),

            b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                debug!(
                    "Unexpected character '{}' at line {}",
                    byte as char, self.line
                );

                reporter.report(&RunicError::lex(self.line, "Unexpected character."));
            }
        }
    }

    /// Block comments do not nest; an unterminated one is consumed to EOF.
    fn skip_block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance();
                self.advance();
                return;
            }

            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.advance();
        }
    }

    fn scan_string(&mut self, reporter: &mut Reporter) {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            reporter.report(&RunicError::lex(self.line, "Unterminated string."));
            return;
        }

        // The closing quote.
        self.advance();

        // Slice boundaries are the ASCII quote bytes, so the interior is
        // whole UTF-8 sequences.
        let literal: String = unsafe {
            String::from_utf8_unchecked(self.source[self.start + 1..self.current - 1].to_vec())
        };

        debug!("Scanned string literal: {}", literal);

        self.add_token(TokenKind::STRING(literal));
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A '.' is only part of the number when followed by a digit, so
        // `140.abs` scans as NUMBER DOT IDENTIFIER.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str =
            unsafe { std::str::from_utf8_unchecked(&self.source[self.start..self.current]) };

        let number: f64 = text.parse().unwrap_or(0.0);

        debug!("Scanned number: {}", number);

        self.add_token(TokenKind::NUMBER(number));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &[u8] = &self.source[self.start..self.current];

        match KEYWORDS.get(text) {
            Some(kind) => self.add_token(kind.clone()),

            None => self.add_token(TokenKind::IDENTIFIER),
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: &str =
            unsafe { std::str::from_utf8_unchecked(&self.source[self.start..self.current]) };

        self.tokens
            .push(Token::new(kind, lexeme.to_string(), self.line));
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.source[self.current];

        self.current += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

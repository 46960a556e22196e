//! SQL tokenizer.
//!
//! Lexes query source into a token stream. Keywords are case-insensitive,
//! identifiers are case-sensitive, whitespace separates tokens. String
//! literals are double-quoted without escapes; numbers are signed decimal
//! integers. Anything unrecognized is a syntax error carrying its byte
//! position.

use crate::ast::CmpOp;
use alloc::string::String;
use alloc::vec::Vec;
use rill_core::{Error, Result};

/// A lexical token kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    StringLit(String),
    Number(i64),
    Select,
    From,
    Where,
    As,
    And,
    True,
    False,
    Dot,
    Comma,
    Star,
    LParen,
    RParen,
    Cmp(CmpOp),
    Eof,
}

/// A token with the byte position it starts at.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn number(&mut self) -> Result<i64> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.src[start..self.pos]
            .parse()
            .map_err(|_| Error::syntax("invalid number literal", start))
    }

    fn string_literal(&mut self) -> Result<String> {
        let start = self.pos;
        self.advance(); // opening quote
        let content_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                let content = self.src[content_start..self.pos].into();
                self.advance();
                return Ok(content);
            }
            self.advance();
        }
        Err(Error::syntax("unterminated string literal", start))
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let pos = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    pos,
                })
            }
        };

        let kind = match c {
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '.' => {
                self.advance();
                TokenKind::Dot
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Cmp(CmpOp::Eq)
                } else {
                    return Err(Error::syntax("expected '==' for equality", pos));
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Cmp(CmpOp::Ne)
                } else {
                    return Err(Error::syntax("expected '!=' after '!'", pos));
                }
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Cmp(CmpOp::Le)
                } else {
                    TokenKind::Cmp(CmpOp::Lt)
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Cmp(CmpOp::Ge)
                } else {
                    TokenKind::Cmp(CmpOp::Gt)
                }
            }
            '"' => TokenKind::StringLit(self.string_literal()?),
            '-' => TokenKind::Number(self.number()?),
            c if c.is_ascii_digit() => TokenKind::Number(self.number()?),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.word();
                if word.eq_ignore_ascii_case("select") {
                    TokenKind::Select
                } else if word.eq_ignore_ascii_case("from") {
                    TokenKind::From
                } else if word.eq_ignore_ascii_case("where") {
                    TokenKind::Where
                } else if word.eq_ignore_ascii_case("as") {
                    TokenKind::As
                } else if word.eq_ignore_ascii_case("and") {
                    TokenKind::And
                } else if word.eq_ignore_ascii_case("true") {
                    TokenKind::True
                } else if word.eq_ignore_ascii_case("false") {
                    TokenKind::False
                } else {
                    TokenKind::Ident(word.into())
                }
            }
            other => {
                return Err(Error::syntax(
                    alloc::format!("unknown character '{}'", other),
                    pos,
                ))
            }
        };

        Ok(Token { kind, pos })
    }
}

/// Lexes query source into tokens, ending with `Eof`.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokenizer = Tokenizer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

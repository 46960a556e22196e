//! SQL parser.
//!
//! Recursive descent over the token stream:
//!
//! ```text
//! select    := SELECT selected (, selected)* FROM ident
//!              (WHERE predicate (AND predicate)*)?
//! selected  := expr (AS ident)?
//! expr      := ident . ident | literal | * | ( select )
//! predicate := expr cmp expr
//! ```

use crate::ast::{Expr, Select, SelectedValue, WherePredicate};
use crate::tokenizer::{Token, TokenKind};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use rill_core::{Error, Result, Value};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        // The token stream always ends with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_pos(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].pos
    }

    fn advance(&mut self) -> TokenKind {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].kind.clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        if self.peek() == &kind {
            self.advance();
            Ok(())
        } else {
            Err(Error::syntax(
                alloc::format!("expected {}, found {:?}", what, self.peek()),
                self.peek_pos(),
            ))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            TokenKind::Ident(_) => match self.advance() {
                TokenKind::Ident(name) => Ok(name),
                _ => unreachable!(),
            },
            other => Err(Error::syntax(
                alloc::format!("expected {}, found {:?}", what, other),
                self.peek_pos(),
            )),
        }
    }

    fn select(&mut self) -> Result<Select> {
        self.expect(TokenKind::Select, "SELECT")?;

        let mut selected = Vec::new();
        loop {
            selected.push(self.selected_value()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::From, "FROM")?;
        let table = self.ident("table name")?;

        let mut wheres = Vec::new();
        if self.eat(&TokenKind::Where) {
            loop {
                wheres.push(self.predicate()?);
                if !self.eat(&TokenKind::And) {
                    break;
                }
            }
        }

        Ok(Select {
            table,
            selected,
            wheres,
        })
    }

    fn selected_value(&mut self) -> Result<SelectedValue> {
        let expr = self.expr()?;
        let alias = if self.eat(&TokenKind::As) {
            Some(self.ident("alias")?)
        } else {
            None
        };
        Ok(SelectedValue { expr, alias })
    }

    fn expr(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.select()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Subquery(Box::new(inner)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(n)))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Str(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Star)
            }
            TokenKind::Ident(_) => {
                let table = self.ident("table name")?;
                self.expect(TokenKind::Dot, "'.'")?;
                let column = self.ident("column name")?;
                Ok(Expr::TableAccess { table, column })
            }
            other => Err(Error::syntax(
                alloc::format!("expected expression, found {:?}", other),
                self.peek_pos(),
            )),
        }
    }

    fn predicate(&mut self) -> Result<WherePredicate> {
        let left = self.expr()?;
        let op = match self.peek().clone() {
            TokenKind::Cmp(op) => {
                self.advance();
                op
            }
            other => {
                return Err(Error::syntax(
                    alloc::format!("expected comparison operator, found {:?}", other),
                    self.peek_pos(),
                ))
            }
        };
        let right = self.expr()?;
        Ok(WherePredicate { left, op, right })
    }
}

/// Parses one `SELECT` statement from a token stream.
pub fn parse_select(tokens: Vec<Token>) -> Result<Select> {
    if tokens.is_empty() {
        return Err(Error::syntax("empty token stream", 0));
    }
    let mut parser = Parser::new(tokens);
    let select = parser.select()?;
    parser.expect(TokenKind::Eof, "end of input")?;
    Ok(select)
}

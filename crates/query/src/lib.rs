//! rill-query - Query compiler and runtime operators for the rill engine.
//!
//! A `SELECT` string flows through three stages:
//!
//! 1. `tokenizer`: lexes the source into a token stream
//! 2. `parser`: builds the `Select` AST, including nested subqueries
//! 3. `planner`: lowers the AST into a graph of runtime operators rooted at
//!    a live observable
//!
//! The runtime operators (`Mapper`, `Filter`, `IndexedEqLookup`,
//! `CorrelatedSubquery`) each subscribe to their upstream and republish
//! transformed events downstream, so any base-table mutation propagates to
//! the query result incrementally.
//!
//! # Example
//!
//! ```ignore
//! let live = rill_query::compile(
//!     "SELECT person.name, person.age FROM person WHERE person.age >= 3",
//!     &catalog,
//! )?;
//! let rows = live.observable().borrow_mut().snapshot();
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod operators;
pub mod parser;
pub mod planner;
pub mod tokenizer;

pub use ast::{CmpOp, Expr, Select, SelectedValue, WherePredicate};
pub use parser::parse_select;
pub use planner::{build_query, compile, LiveQuery};
pub use tokenizer::{tokenize, Token, TokenKind};

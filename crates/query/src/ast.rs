//! Query AST definitions.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use rill_core::Value;

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Returns whether an ordering between two values satisfies this
    /// operator.
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }

    /// Returns the source-level spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// An expression in select or predicate position.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `table.column`
    TableAccess { table: String, column: String },
    /// A literal value.
    Literal(Value),
    /// A parenthesized nested select.
    Subquery(Box<Select>),
    /// `*`; valid only as a top-level selected value.
    Star,
}

impl Expr {
    /// Convenience constructor for a table access.
    pub fn access(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::TableAccess {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// One item of the select list, with its optional alias.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedValue {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectedValue {
    /// Creates an unaliased selected value.
    pub fn plain(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Creates an aliased selected value.
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// One `WHERE` predicate; predicates are AND-joined.
#[derive(Clone, Debug, PartialEq)]
pub struct WherePredicate {
    pub left: Expr,
    pub op: CmpOp,
    pub right: Expr,
}

/// A parsed `SELECT` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub table: String,
    pub selected: Vec<SelectedValue>,
    pub wheres: Vec<WherePredicate>,
}

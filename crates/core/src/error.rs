//! Error types for the rill engine.

use crate::types::DataType;
use alloc::string::String;
use core::fmt;

/// Result type alias for rill operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for engine operations.
///
/// All of these signal programmer errors (bad schema usage, malformed
/// queries, planning against missing objects), not runtime conditions; the
/// engine never retries or recovers from them.
#[derive(Debug)]
pub enum Error {
    /// A row value does not match the column's declared type.
    TypeMismatch {
        table: String,
        column: String,
        expected: DataType,
        got: DataType,
    },
    /// A row has the wrong number of values for its table.
    ArityMismatch {
        table: String,
        expected: usize,
        got: usize,
    },
    /// Column not found.
    ColumnNotFound { table: String, column: String },
    /// Table not found in the catalog.
    TableNotFound { name: String },
    /// A table with this name already exists.
    DuplicateTable { name: String },
    /// The column's type cannot back an index.
    NotIndexable { table: String, column: String },
    /// A query references a table that is not in scope.
    UnboundReference { table: String, column: String },
    /// Malformed query text.
    Syntax { message: String, position: usize },
    /// Invalid operation.
    InvalidOperation { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                table,
                column,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Type mismatch on {}.{}: expected {:?}, got {:?}",
                    table, column, expected, got
                )
            }
            Error::ArityMismatch {
                table,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Rows in table {} must have {} columns, got {}",
                    table, expected, got
                )
            }
            Error::ColumnNotFound { table, column } => {
                write!(f, "Column {} not found in table {}", column, table)
            }
            Error::TableNotFound { name } => {
                write!(f, "Table not found: {}", name)
            }
            Error::DuplicateTable { name } => {
                write!(f, "Table already exists: {}", name)
            }
            Error::NotIndexable { table, column } => {
                write!(f, "Column {}.{} cannot be indexed", table, column)
            }
            Error::UnboundReference { table, column } => {
                write!(f, "Reference {}.{} is not in scope", table, column)
            }
            Error::Syntax { message, position } => {
                write!(f, "Syntax error at byte {}: {}", position, message)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(
        table: impl Into<String>,
        column: impl Into<String>,
        expected: DataType,
        got: DataType,
    ) -> Self {
        Error::TypeMismatch {
            table: table.into(),
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates an arity mismatch error.
    pub fn arity_mismatch(table: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityMismatch {
            table: table.into(),
            expected,
            got,
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates a duplicate table error.
    pub fn duplicate_table(name: impl Into<String>) -> Self {
        Error::DuplicateTable { name: name.into() }
    }

    /// Creates a not indexable error.
    pub fn not_indexable(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::NotIndexable {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an unbound reference error.
    pub fn unbound_reference(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnboundReference {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}

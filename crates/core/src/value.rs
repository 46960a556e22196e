//! Value type definitions for the rill engine.
//!
//! This module defines the `Value` enum which represents any value that can
//! be stored in a row cell.

use crate::observe::ObservableRef;
use crate::types::DataType;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// A value stored in a row cell.
///
/// The variant set is closed. `Observable` holds a handle to a nested
/// reactive result set; it compares and hashes by handle identity.
#[derive(Clone)]
pub enum Value {
    /// UTF-8 string
    Str(String),
    /// 64-bit signed integer
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// Handle to a nested reactive result set
    Observable(ObservableRef),
}

impl Value {
    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Str(_) => DataType::String,
            Value::Int(_) => DataType::Int,
            Value::Bool(_) => DataType::Bool,
            Value::Observable(_) => DataType::Observable,
        }
    }

    /// Returns a reference to the string if this is a `Str`, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the integer value if this is an `Int`, None otherwise.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a `Bool`, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the nested observable handle if this is an `Observable`.
    pub fn as_observable(&self) -> Option<&ObservableRef> {
        match self {
            Value::Observable(v) => Some(v),
            _ => None,
        }
    }

    /// Renders this value as a path segment for patch addressing.
    ///
    /// Observable handles have no path rendering.
    pub fn path_segment(&self) -> Option<String> {
        match self {
            Value::Str(v) => Some(v.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::Bool(v) => Some(if *v { "true".into() } else { "false".into() }),
            Value::Observable(_) => None,
        }
    }

    /// Compares two values of the same scalar type.
    ///
    /// Returns None for mismatched types and for observable handles; the
    /// planner rejects cross-type comparisons before they can reach here.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn handle_addr(obs: &ObservableRef) -> usize {
        Rc::as_ptr(obs) as *const () as usize
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(v) => write!(f, "Str({:?})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Observable(obs) => write!(f, "Observable({:#x})", Value::handle_addr(obs)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Observable(a), Value::Observable(b)) => {
                Value::handle_addr(a) == Value::handle_addr(b)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Str(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Observable(obs) => Value::handle_addr(obs).hash(state),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<ObservableRef> for Value {
    fn from(v: ObservableRef) -> Self {
        Value::Observable(v)
    }
}

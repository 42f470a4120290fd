//! Runtime value representation
//!
//! This module defines the [`Value`] enum, the dynamically typed values that
//! flow through variables, heap fields and container element sequences.
//!
//! # Value Types
//!
//! - [`Value::Int`] / [`Value::Float`]: numbers; arithmetic stays integral
//!   until a float is involved
//! - [`Value::Bool`], [`Value::Char`], [`Value::Str`]
//! - [`Value::Address`]: an opaque heap token, see [`Address`]
//! - [`Value::Null`]: the null pointer (`nullptr` / `NULL`)
//! - [`Value::Array`]: an ordered sequence of values
//! - [`Value::Undefined`]: the marker reported for names that have no value yet
//!
//! # Serialization
//!
//! Values serialize to plain JSON: addresses become their hexadecimal token
//! string and both `undefined` and `nullptr` become `null`.

use serde::{Serialize, Serializer};
use std::fmt;

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Address(Address),
    Null,
    Array(Vec<Value>),
    #[default]
    Undefined,
}

/// Opaque heap address token
///
/// Issued monotonically by the heap arena and never reused within one run, so
/// a stale pointer never aliases a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u64);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Value {
    /// Check if this value is defined
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Get the address, returns None if not an Address
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(addr) => Some(*addr),
            _ => None,
        }
    }

    /// Get the integer value; chars and bools promote the way C promotes them
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Char(c) => Some(*c as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Get the numeric value as a float, returns None for non-numbers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            other => other.as_int().map(|n| n as f64),
        }
    }

    /// Truthiness used by conditions, `!`, `&&` and `||`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Bool(b) => *b,
            Value::Char(c) => *c != '\0',
            Value::Str(s) => !s.is_empty(),
            Value::Address(_) | Value::Array(_) => true,
            Value::Null | Value::Undefined => false,
        }
    }

    /// Check if this value is a pointer (including null)
    pub fn is_pointer(&self) -> bool {
        matches!(self, Value::Address(_) | Value::Null)
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "double",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Address(_) => "pointer",
            Value::Null => "nullptr",
            Value::Array(_) => "array",
            Value::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => write!(f, "{}", s),
            Value::Address(addr) => write!(f, "{}", addr),
            Value::Null => write!(f, "nullptr"),
            Value::Undefined => write!(f, "undefined"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Address(addr) => addr.serialize(serializer),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Null | Value::Undefined => serializer.serialize_unit(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Address> for Value {
    fn from(addr: Address) -> Self {
        Value::Address(addr)
    }
}

//! Host runtime values as seen by the call adapter.
//!
//! Bindings translate their native terms into [`HostValue`] before calling the
//! adapter, so the conversion rules live in one place:
//!
//! - [`Strictness::Strict`] is used for identifiers (driver names, data source
//!   names, statement text). Only string values are accepted and they must be
//!   valid UTF-8; anything else is an ordinary recoverable error.
//! - [`Strictness::Lenient`] is used for statement parameters. Every value is
//!   coerced to text, and invalid UTF-8 is replaced rather than rejected.

use crate::error::{BridgeError, Result};

/// How hard to be on a host value that should become a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// A value handed over by the host runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// String data with no encoding guarantee (BEAM binaries, byte strings).
    Bytes(Vec<u8>),
    /// Interned name: an atom or symbol.
    Symbol(String),
    /// Any other host term, carried as its printed form.
    Other(String),
}

impl HostValue {
    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Bool(_) => "boolean",
            HostValue::Int(_) => "integer",
            HostValue::Float(_) => "float",
            HostValue::Bytes(_) => "string",
            HostValue::Symbol(_) => "symbol",
            HostValue::Other(_) => "term",
        }
    }

    /// Convert to a foreign string under the given strictness.
    ///
    /// `argument` names the parameter in error messages.
    pub fn to_foreign_string(&self, argument: &str, strictness: Strictness) -> Result<String> {
        match strictness {
            Strictness::Strict => self.to_strict_string(argument),
            Strictness::Lenient => Ok(self.to_lenient_string()),
        }
    }

    fn to_strict_string(&self, argument: &str) -> Result<String> {
        match self {
            HostValue::Bytes(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|e| BridgeError::Encoding {
                    argument: argument.to_string(),
                    message: e.utf8_error().to_string(),
                })
            }
            other => Err(BridgeError::InvalidArgument {
                argument: argument.to_string(),
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }

    fn to_lenient_string(&self) -> String {
        match self {
            HostValue::Nil => String::new(),
            HostValue::Bool(b) => b.to_string(),
            HostValue::Int(i) => i.to_string(),
            // Debug keeps the fractional part: 5.0 -> "5.0", 1e20 -> "1e20"
            HostValue::Float(f) => format!("{:?}", f),
            HostValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            HostValue::Symbol(name) | HostValue::Other(name) => name.clone(),
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(bytes: Vec<u8>) -> Self {
        HostValue::Bytes(bytes)
    }
}

impl From<&[u8]> for HostValue {
    fn from(bytes: &[u8]) -> Self {
        HostValue::Bytes(bytes.to_vec())
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Nil, Into::into)
    }
}

//! Error types for SQLBridge.
//!
//! Two classes of failure cross the bridge:
//! - Recoverable, data-dependent failures (bad SQL, unknown driver, a strict
//!   argument that is not valid UTF-8). These are ordinary [`BridgeError`]
//!   values that bindings hand back on the host's error channel.
//! - [`ContractViolation`]: a handle that resolves to nothing, or to the wrong
//!   kind of object. This means the host's lifetime management is broken and
//!   bindings must fail fast instead of returning an error value.

use crate::handle::{Handle, ObjectKind};
use thiserror::Error;

/// Main error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // Driver errors
    #[error("{message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("sql: unknown driver \"{name}\" (forgotten import?)")]
    UnknownDriver { name: String },

    #[error("{driver}: {operation} is not supported by this driver")]
    Unsupported {
        driver: String,
        operation: &'static str,
    },

    // Argument conversion errors
    #[error("invalid encoding for {argument}: {message}")]
    Encoding { argument: String, message: String },

    #[error("wrong argument type for {argument} (expected {expected}, got {actual})")]
    InvalidArgument {
        argument: String,
        expected: &'static str,
        actual: &'static str,
    },

    // Lifetime contract
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// A handle that did not resolve to an object of the expected kind.
///
/// "Never allocated" and "already released" are the same
/// outcome: `found` is `None` in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("contract violation: handle {handle} {}", describe_found(.expected, .found))]
pub struct ContractViolation {
    pub handle: Handle,
    pub expected: ObjectKind,
    pub found: Option<ObjectKind>,
}

fn describe_found(expected: &ObjectKind, found: &Option<ObjectKind>) -> String {
    match found {
        Some(actual) => format!("refers to a {} where a {} was expected", actual, expected),
        None => format!("is not registered (expected a {})", expected),
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<rusqlite::Error> for BridgeError {
    fn from(err: rusqlite::Error) -> Self {
        BridgeError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BridgeError {
    /// Create a driver error that carries only a message.
    pub fn database(message: impl Into<String>) -> Self {
        BridgeError::Database {
            message: message.into(),
            source: None,
        }
    }

    /// True for errors that indicate a host-side lifetime bug.
    ///
    /// Bindings must not hand these back as ordinary error values.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Contract(_))
    }

    /// The contract violation, if this is one.
    pub fn as_contract_violation(&self) -> Option<&ContractViolation> {
        match self {
            BridgeError::Contract(violation) => Some(violation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_driver_display() {
        let err = BridgeError::UnknownDriver {
            name: "oracle".into(),
        };
        assert_eq!(
            err.to_string(),
            "sql: unknown driver \"oracle\" (forgotten import?)"
        );
    }

    #[test]
    fn test_contract_violation_display() {
        let missing = ContractViolation {
            handle: Handle::new(7),
            expected: ObjectKind::Connection,
            found: None,
        };
        assert_eq!(
            missing.to_string(),
            "contract violation: handle 7 is not registered (expected a connection)"
        );

        let wrong = ContractViolation {
            handle: Handle::new(3),
            expected: ObjectKind::Result,
            found: Some(ObjectKind::Connection),
        };
        assert!(wrong.to_string().contains("refers to a connection"));
    }

    #[test]
    fn test_only_contract_errors_are_fatal() {
        let violation = ContractViolation {
            handle: Handle::new(1),
            expected: ObjectKind::Connection,
            found: None,
        };
        assert!(BridgeError::from(violation).is_fatal());
        assert!(!BridgeError::database("no such table: t").is_fatal());
        assert!(!BridgeError::Encoding {
            argument: "driver_name".into(),
            message: "invalid utf-8".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_database_error_keeps_driver_message() {
        let err = BridgeError::database("near \"SELEC\": syntax error");
        assert_eq!(err.to_string(), "near \"SELEC\": syntax error");
    }
}

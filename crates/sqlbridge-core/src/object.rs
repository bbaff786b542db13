//! Foreign objects stored in the handle registry.
//!
//! The registry stores a closed sum type, [`ForeignObject`]. Typed access goes
//! through [`RegisteredObject`], which each variant payload implements so that
//! `resolve::<Connection>` and `resolve::<ExecResult>` check the variant instead
//! of casting.

use crate::driver::{DriverConnection, DriverResult};
use crate::error::Result;
use crate::handle::ObjectKind;
use std::fmt;
use std::sync::{Arc, Mutex};

/// An open driver connection.
pub struct Connection {
    driver: String,
    inner: Mutex<Box<dyn DriverConnection>>,
}

impl Connection {
    pub fn new(driver: impl Into<String>, inner: Box<dyn DriverConnection>) -> Self {
        Self {
            driver: driver.into(),
            inner: Mutex::new(inner),
        }
    }

    /// Name the connection was opened with.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Execute a statement, serialized against other calls on this connection.
    pub fn exec(&self, statement: &str, params: &[String]) -> Result<ExecResult> {
        // A panic inside a previous exec leaves the driver connection usable
        // from the bridge's point of view; the driver reports its own state.
        let mut conn = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let result = conn.exec(statement, params)?;
        Ok(ExecResult::new(self.driver.clone(), result))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

/// Outcome of an executed statement.
pub struct ExecResult {
    driver: String,
    inner: Box<dyn DriverResult>,
}

impl ExecResult {
    pub fn new(driver: impl Into<String>, inner: Box<dyn DriverResult>) -> Self {
        Self {
            driver: driver.into(),
            inner,
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn last_insert_id(&self) -> Result<i64> {
        self.inner.last_insert_id()
    }

    pub fn rows_affected(&self) -> Result<i64> {
        self.inner.rows_affected()
    }
}

impl fmt::Debug for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecResult")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

/// A registry entry's payload.
///
/// Payloads are reference counted so a call can keep using an object after
/// releasing the registry lock; the registry entry stays the only long-lived
/// owner.
#[derive(Debug, Clone)]
pub enum ForeignObject {
    Connection(Arc<Connection>),
    Result(Arc<ExecResult>),
}

impl ForeignObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ForeignObject::Connection(_) => ObjectKind::Connection,
            ForeignObject::Result(_) => ObjectKind::Result,
        }
    }
}

impl From<Connection> for ForeignObject {
    fn from(conn: Connection) -> Self {
        ForeignObject::Connection(Arc::new(conn))
    }
}

impl From<ExecResult> for ForeignObject {
    fn from(result: ExecResult) -> Self {
        ForeignObject::Result(Arc::new(result))
    }
}

/// Typed view of one [`ForeignObject`] variant.
pub trait RegisteredObject: Sized {
    const KIND: ObjectKind;

    /// Borrow the payload if `object` is this variant.
    fn from_object(object: &ForeignObject) -> Option<&Arc<Self>>;
}

impl RegisteredObject for Connection {
    const KIND: ObjectKind = ObjectKind::Connection;

    fn from_object(object: &ForeignObject) -> Option<&Arc<Self>> {
        match object {
            ForeignObject::Connection(conn) => Some(conn),
            _ => None,
        }
    }
}

impl RegisteredObject for ExecResult {
    const KIND: ObjectKind = ObjectKind::Result;

    fn from_object(object: &ForeignObject) -> Option<&Arc<Self>> {
        match object {
            ForeignObject::Result(result) => Some(result),
            _ => None,
        }
    }
}

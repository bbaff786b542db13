//! Driver abstraction and the named driver table.
//!
//! A [`Driver`] turns a data source name into a [`DriverConnection`]; a
//! connection executes statements and yields a [`DriverResult`]. These are the
//! foreign operations the bridge proxies; the bridge itself never looks past
//! these traits.

use crate::error::{BridgeError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A named SQL driver.
pub trait Driver: Send + Sync {
    /// Open a connection for the given data source name.
    fn open(&self, data_source_name: &str) -> Result<Box<dyn DriverConnection>>;
}

/// A live driver connection.
///
/// Connections may keep state between calls (temporary tables, pragmas), so
/// `exec` takes `&mut self`. The bridge serializes calls per connection.
pub trait DriverConnection: Send {
    /// Execute a statement with positional text parameters.
    fn exec(&mut self, statement: &str, params: &[String]) -> Result<Box<dyn DriverResult>>;
}

/// Outcome of an executed statement.
///
/// Either accessor may legitimately fail for a given driver or statement
/// kind; such failures are driver errors, not bridge errors.
pub trait DriverResult: Send + Sync {
    fn last_insert_id(&self) -> Result<i64>;

    fn rows_affected(&self) -> Result<i64>;
}

/// Table of drivers by name.
///
/// Names are kept sorted so [`DriverRegistry::names`] is stable.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<BTreeMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// Create an empty driver table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding the drivers compiled into this crate.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::sqlite::register(&registry);
        registry
    }

    /// Register a driver under `name`, replacing any previous driver of that name.
    pub fn register(&self, name: impl Into<String>, driver: Arc<dyn Driver>) {
        let name = name.into();
        debug!("Registering SQL driver: {}", name);
        self.write().insert(name, driver);
    }

    /// Names of all registered drivers, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Look up a driver by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Driver>> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownDriver {
                name: name.to_string(),
            })
    }

    // The map is only ever touched by single insert/get calls, so a poisoned
    // lock still guards a consistent table.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<dyn Driver>>> {
        self.drivers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn Driver>>> {
        self.drivers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}

//! Call adapter: one thin function per operation exposed to the host.
//!
//! Every operation follows the same shape:
//! 1. convert host arguments (strict for identifiers, lenient for parameters),
//! 2. resolve handle arguments through the registry,
//! 3. call the driver without holding the registry lock,
//! 4. register new foreign objects, or return scalars directly.
//!
//! Argument conversion always happens before any lookup or driver call, so a
//! rejected argument never reaches the driver and never allocates a handle.

use crate::driver::DriverRegistry;
use crate::error::Result;
use crate::handle::Handle;
use crate::object::{Connection, ExecResult};
use crate::registry::{RegistrySnapshot, SharedRegistry};
use crate::value::{HostValue, Strictness};
use std::sync::LazyLock;
use tracing::{debug, instrument};

static GLOBAL: LazyLock<Bridge> = LazyLock::new(Bridge::new);

/// Registry plus driver table; the state behind every binding.
///
/// The adapter itself keeps nothing between calls: all state lives in the
/// registry and in the foreign objects it owns.
#[derive(Debug)]
pub struct Bridge {
    registry: SharedRegistry,
    drivers: DriverRegistry,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Create a bridge with the built-in drivers and an empty registry.
    pub fn new() -> Self {
        Self::with_drivers(DriverRegistry::with_builtin())
    }

    pub fn with_drivers(drivers: DriverRegistry) -> Self {
        Self::with_parts(SharedRegistry::new(), drivers)
    }

    pub fn with_parts(registry: SharedRegistry, drivers: DriverRegistry) -> Self {
        Self { registry, drivers }
    }

    /// The process-wide bridge used by the host bindings.
    pub fn global() -> &'static Bridge {
        &GLOBAL
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// Names of the available drivers, sorted.
    pub fn driver_names(&self) -> Vec<String> {
        self.drivers.names()
    }

    /// Open a connection and return its handle.
    #[instrument(level = "debug", skip_all)]
    pub fn open(&self, driver_name: &HostValue, data_source_name: &HostValue) -> Result<Handle> {
        let driver_name = driver_name.to_foreign_string("driver_name", Strictness::Strict)?;
        let data_source_name =
            data_source_name.to_foreign_string("data_source_name", Strictness::Strict)?;

        let driver = self.drivers.get(&driver_name)?;
        let conn = driver.open(&data_source_name)?;

        let handle = self.registry.allocate(Connection::new(driver_name, conn));
        debug!("Opened connection {}", handle);
        Ok(handle)
    }

    /// Execute `statement` on a connection and return the result's handle.
    #[instrument(level = "debug", skip(self, statement, params))]
    pub fn exec(&self, conn: Handle, statement: &HostValue, params: &[HostValue]) -> Result<Handle> {
        let statement = statement.to_foreign_string("sql", Strictness::Strict)?;
        let params = params
            .iter()
            .map(|param| param.to_foreign_string("param", Strictness::Lenient))
            .collect::<Result<Vec<_>>>()?;

        let conn = self.registry.resolve::<Connection>(conn)?;
        let result = conn.exec(&statement, &params)?;
        Ok(self.registry.allocate(result))
    }

    /// Last inserted row identifier reported by a result.
    pub fn last_insert_id(&self, result: Handle) -> Result<i64> {
        self.registry.resolve::<ExecResult>(result)?.last_insert_id()
    }

    /// Number of rows changed by the statement behind a result.
    pub fn rows_affected(&self, result: Handle) -> Result<i64> {
        self.registry.resolve::<ExecResult>(result)?.rows_affected()
    }

    /// Release entry point for host finalizers. Idempotent.
    pub fn release(&self, handle: Handle) {
        self.registry.release(handle);
    }

    pub fn live_handles(&self) -> usize {
        self.registry.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }
}

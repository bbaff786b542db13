//! SQLBridge Core - handle registry and call adapter for host-runtime bindings.
//!
//! This crate lets a host runtime with its own garbage collector (the BEAM,
//! or any UniFFI host language) drive SQL drivers that live on the Rust side
//! without ever handing out a pointer. Every connection or exec result the
//! host needs to reference is parked in a process-wide [`HandleRegistry`]
//! under a 32-bit [`Handle`]; the host keeps only that integer inside one of
//! its own objects and calls [`Bridge::release`] from that object's
//! finalizer.
//!
//! Binding crates (`sqlbridge-rustler`, `sqlbridge-uniffi`) are thin glue over
//! [`Bridge`].
//!
//! # Example
//!
//! ```rust
//! use sqlbridge_core::{Bridge, HostValue};
//!
//! # fn main() -> sqlbridge_core::Result<()> {
//! let bridge = Bridge::new();
//!
//! let db = bridge.open(&HostValue::from("sqlite"), &HostValue::from("file::memory:"))?;
//! bridge.exec(db, &HostValue::from("CREATE TABLE t(x)"), &[])?;
//! let res = bridge.exec(db, &HostValue::from("INSERT INTO t VALUES (?)"), &[HostValue::Int(5)])?;
//! assert_eq!(bridge.rows_affected(res)?, 1);
//!
//! // Called by the host's finalizers
//! bridge.release(res);
//! bridge.release(db);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod driver;
pub mod error;
pub mod handle;
pub mod logging;
pub mod object;
pub mod registry;
pub mod sqlite;
pub mod value;

// Re-export commonly used types
pub use adapter::Bridge;
pub use driver::{Driver, DriverConnection, DriverRegistry, DriverResult};
pub use error::{BridgeError, ContractViolation, Result};
pub use handle::{Handle, ObjectKind};
pub use object::{Connection, ExecResult, ForeignObject};
pub use registry::{HandleRegistry, RegistrySnapshot, SharedRegistry};
pub use sqlite::SqliteDriver;
pub use value::{HostValue, Strictness};

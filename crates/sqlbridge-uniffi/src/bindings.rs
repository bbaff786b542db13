use sqlbridge_core::{Bridge, BridgeError, Handle, HostValue};
use std::sync::Arc;

// =============================================================================
// FfiError - error type for the FFI boundary
// =============================================================================

/// FFI-friendly error type.
///
/// Driver failures keep the driver's message verbatim. Contract violations
/// cannot normally happen through these bindings, because a host object holds
/// its handle until it is collected, but they are reported distinctly.
#[derive(Debug, Clone, uniffi::Error, thiserror::Error)]
pub enum FfiError {
    #[error("{message}")]
    Driver { message: String },

    #[error("Invalid argument: {message}")]
    Argument { message: String },

    #[error("Contract violation: {message}")]
    ContractViolation { message: String },
}

impl From<BridgeError> for FfiError {
    fn from(err: BridgeError) -> Self {
        let message = err.to_string();
        match err {
            BridgeError::Contract(_) => FfiError::ContractViolation { message },
            BridgeError::Encoding { .. } | BridgeError::InvalidArgument { .. } => {
                FfiError::Argument { message }
            }
            BridgeError::Database { .. }
            | BridgeError::UnknownDriver { .. }
            | BridgeError::Unsupported { .. }
            | BridgeError::Other(_) => FfiError::Driver { message },
        }
    }
}

// =============================================================================
// FfiValue - statement parameters
// =============================================================================

/// A statement parameter. Parameters are coerced to text before binding.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiValue {
    Null,
    Bool { value: bool },
    Int { value: i64 },
    Float { value: f64 },
    Text { value: String },
    Bytes { value: Vec<u8> },
}

impl From<FfiValue> for HostValue {
    fn from(value: FfiValue) -> Self {
        match value {
            FfiValue::Null => HostValue::Nil,
            FfiValue::Bool { value } => HostValue::Bool(value),
            FfiValue::Int { value } => HostValue::Int(value),
            FfiValue::Float { value } => HostValue::Float(value),
            FfiValue::Text { value } => HostValue::from(value),
            FfiValue::Bytes { value } => HostValue::Bytes(value),
        }
    }
}

// =============================================================================
// Host-side wrappers
// =============================================================================

/// Releases its handle when the owning host object is collected.
struct HandleWrapper {
    handle: Handle,
    bridge: &'static Bridge,
}

impl Drop for HandleWrapper {
    fn drop(&mut self) {
        self.bridge.release(self.handle);
    }
}

/// An open database connection.
///
/// # Example (Python)
///
/// ```python
/// db = open("sqlite", "file::memory:")
/// res = db.exec("INSERT INTO t VALUES (?)", [FfiValue.TEXT(value="5")])
/// ```
#[derive(uniffi::Object)]
pub struct FfiConnection {
    inner: HandleWrapper,
}

/// The outcome of [`FfiConnection::exec`].
#[derive(uniffi::Object)]
pub struct FfiResult {
    inner: HandleWrapper,
}

fn open_with(
    bridge: &'static Bridge,
    driver_name: String,
    data_source_name: String,
) -> Result<Arc<FfiConnection>, FfiError> {
    let handle = bridge.open(&driver_name.into(), &data_source_name.into())?;
    Ok(Arc::new(FfiConnection {
        inner: HandleWrapper { handle, bridge },
    }))
}

#[uniffi::export]
impl FfiConnection {
    /// Open a connection with the named driver.
    #[uniffi::constructor]
    pub fn new(driver_name: String, data_source_name: String) -> Result<Arc<Self>, FfiError> {
        open_with(Bridge::global(), driver_name, data_source_name)
    }

    /// Execute a statement with positional parameters.
    pub fn exec(&self, sql: String, params: Vec<FfiValue>) -> Result<Arc<FfiResult>, FfiError> {
        let bridge = self.inner.bridge;
        let params: Vec<HostValue> = params.into_iter().map(HostValue::from).collect();
        let handle = bridge.exec(self.inner.handle, &sql.into(), &params)?;
        Ok(Arc::new(FfiResult {
            inner: HandleWrapper { handle, bridge },
        }))
    }

    /// The registry handle backing this connection.
    pub fn handle(&self) -> u32 {
        self.inner.handle.raw()
    }
}

#[uniffi::export]
impl FfiResult {
    pub fn last_insert_id(&self) -> Result<i64, FfiError> {
        Ok(self.inner.bridge.last_insert_id(self.inner.handle)?)
    }

    pub fn rows_affected(&self) -> Result<i64, FfiError> {
        Ok(self.inner.bridge.rows_affected(self.inner.handle)?)
    }

    /// The registry handle backing this result.
    pub fn handle(&self) -> u32 {
        self.inner.handle.raw()
    }
}

// =============================================================================
// Module functions
// =============================================================================

/// Get the version of the sqlbridge-uniffi bindings.
#[uniffi::export]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// List the available driver names.
#[uniffi::export]
pub fn drivers() -> Vec<String> {
    Bridge::global().driver_names()
}

/// Open a connection with the named driver.
#[uniffi::export]
pub fn open(driver_name: String, data_source_name: String) -> Result<Arc<FfiConnection>, FfiError> {
    open_with(Bridge::global(), driver_name, data_source_name)
}

/// Number of handles currently registered.
#[uniffi::export]
pub fn live_handles() -> u64 {
    Bridge::global().live_handles() as u64
}

/// Registry occupancy as a JSON object.
#[uniffi::export]
pub fn registry_snapshot_json() -> String {
    serde_json::to_string(&Bridge::global().snapshot()).unwrap_or_else(|_| "{}".to_string())
}

/// Install the default stderr logger (filtered by `SQLBRIDGE_LOG`).
///
/// Returns false if the process already has a logger.
#[uniffi::export]
pub fn init_logging() -> bool {
    sqlbridge_core::logging::init()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaked_bridge() -> &'static Bridge {
        Box::leak(Box::new(Bridge::new()))
    }

    #[test]
    fn test_ffi_error_conversion() {
        let err = BridgeError::UnknownDriver {
            name: "nosuchdb".to_string(),
        };
        let ffi_err: FfiError = err.into();
        assert!(matches!(ffi_err, FfiError::Driver { ref message } if message.contains("nosuchdb")));

        let err = BridgeError::Encoding {
            argument: "sql".to_string(),
            message: "invalid utf-8 sequence".to_string(),
        };
        assert!(matches!(FfiError::from(err), FfiError::Argument { .. }));
    }

    #[test]
    fn test_ffi_value_conversion() {
        assert_eq!(HostValue::from(FfiValue::Null), HostValue::Nil);
        assert_eq!(
            HostValue::from(FfiValue::Text {
                value: "5".to_string()
            }),
            HostValue::from("5")
        );
        assert_eq!(
            HostValue::from(FfiValue::Int { value: 7 }),
            HostValue::Int(7)
        );
    }

    #[test]
    fn test_connection_roundtrip() {
        let bridge = leaked_bridge();
        let db = open_with(bridge, "sqlite".into(), "file::memory:".into()).unwrap();
        let created = db.exec("CREATE TABLE t(x)".into(), vec![]).unwrap();
        assert_eq!(created.rows_affected().unwrap(), 0);

        let inserted = db
            .exec(
                "INSERT INTO t VALUES (?)".into(),
                vec![FfiValue::Text {
                    value: "5".to_string(),
                }],
            )
            .unwrap();
        assert_eq!(inserted.rows_affected().unwrap(), 1);
        assert!(inserted.last_insert_id().unwrap() >= 0);
        assert_ne!(db.handle(), inserted.handle());
    }

    #[test]
    fn test_dropping_objects_releases_handles() {
        let bridge = leaked_bridge();
        let db = open_with(bridge, "sqlite".into(), "file::memory:".into()).unwrap();
        let res = db.exec("CREATE TABLE t(x)".into(), vec![]).unwrap();
        assert_eq!(bridge.live_handles(), 2);

        drop(db);
        assert_eq!(bridge.live_handles(), 1);
        // The result stays usable after its connection is collected
        assert_eq!(res.rows_affected().unwrap(), 0);

        drop(res);
        assert_eq!(bridge.live_handles(), 0);
    }

    #[test]
    fn test_open_unknown_driver() {
        let bridge = leaked_bridge();
        let err = open_with(bridge, "nosuchdb".into(), String::new()).err().unwrap();
        assert!(matches!(err, FfiError::Driver { .. }));
        assert_eq!(bridge.live_handles(), 0);
    }

    #[test]
    fn test_registry_snapshot_json_is_object() {
        let json: serde_json::Value = serde_json::from_str(&registry_snapshot_json()).unwrap();
        assert!(json.get("live").is_some());
    }
}

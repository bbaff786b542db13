//! Rustler NIFs for sqlbridge-core.
//!
//! This crate exposes the bridge to Elixir/Erlang. Connections and exec
//! results stay on the Rust side; the BEAM only ever holds a resource whose
//! sole payload is the registry handle. When the BEAM garbage collector frees
//! that resource, its destructor releases the handle.
//!
//! # Usage in Elixir
//!
//! ```elixir
//! defmodule SqlBridge.Native do
//!   use Rustler, otp_app: :sqlbridge, crate: "sqlbridge_rustler"
//!
//!   def version(), do: :erlang.nif_error(:nif_not_loaded)
//!   def drivers(), do: :erlang.nif_error(:nif_not_loaded)
//!   def open(_driver, _dsn), do: :erlang.nif_error(:nif_not_loaded)
//!   def exec(_db, _sql, _params), do: :erlang.nif_error(:nif_not_loaded)
//!   def last_insert_id(_result), do: :erlang.nif_error(:nif_not_loaded)
//!   def rows_affected(_result), do: :erlang.nif_error(:nif_not_loaded)
//!   def live_handles(), do: :erlang.nif_error(:nif_not_loaded)
//! end
//!
//! {:ok, db} = SqlBridge.Native.open("sqlite", "file::memory:")
//! {:ok, _} = SqlBridge.Native.exec(db, "CREATE TABLE t(x)", [])
//! {:ok, res} = SqlBridge.Native.exec(db, "INSERT INTO t VALUES (?)", [5])
//! {:ok, 1} = SqlBridge.Native.rows_affected(res)
//! ```
//!
//! Driver failures come back as `{:error, message}`. Using a resource whose
//! handle is no longer registered raises `{:contract_violation, message}`.

// The NIF entry points and resource registration are macro-generated FFI;
// this crate contains no handwritten unsafe code.
#![allow(unsafe_code)]

use rustler::{Atom, Binary, Env, NifResult, ResourceArc, Term};
use sqlbridge_core::{Bridge, BridgeError, Handle, HostValue};
use tracing::error;

mod atoms {
    rustler::atoms! {
        ok,
        contract_violation,
    }
}

// ============================================================================
// Host-side wrappers (NIF resources)
// ============================================================================

/// A handle owned by one BEAM resource; released when the resource is freed.
struct HandleWrapper {
    handle: Handle,
    bridge: &'static Bridge,
}

impl HandleWrapper {
    fn new(bridge: &'static Bridge, handle: Handle) -> Self {
        Self { handle, bridge }
    }
}

impl Drop for HandleWrapper {
    fn drop(&mut self) {
        self.bridge.release(self.handle);
    }
}

/// BEAM resource wrapping a connection handle.
pub struct DbResource(HandleWrapper);

/// BEAM resource wrapping an exec result handle.
pub struct ResultResource(HandleWrapper);

#[rustler::resource_impl]
impl rustler::Resource for DbResource {}

#[rustler::resource_impl]
impl rustler::Resource for ResultResource {}

// ============================================================================
// Pure Logic (testable without NIF runtime)
// ============================================================================

/// How a bridge error reaches the BEAM.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// Returned as `{:error, message}`.
    Error(String),
    /// Raised; the caller's handle bookkeeping is broken.
    ContractViolation(String),
}

impl From<BridgeError> for Failure {
    fn from(err: BridgeError) -> Self {
        if err.is_fatal() {
            Failure::ContractViolation(err.to_string())
        } else {
            Failure::Error(err.to_string())
        }
    }
}

impl Failure {
    fn into_nif_error(self) -> rustler::Error {
        match self {
            Failure::Error(message) => rustler::Error::Term(Box::new(message)),
            Failure::ContractViolation(message) => {
                error!("Raising contract violation in BEAM caller: {}", message);
                rustler::Error::RaiseTerm(Box::new((atoms::contract_violation(), message)))
            }
        }
    }
}

fn version_impl() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn open_impl(
    bridge: &Bridge,
    driver_name: &HostValue,
    data_source_name: &HostValue,
) -> Result<Handle, Failure> {
    Ok(bridge.open(driver_name, data_source_name)?)
}

fn exec_impl(
    bridge: &Bridge,
    db: Handle,
    sql: &HostValue,
    params: &[HostValue],
) -> Result<Handle, Failure> {
    Ok(bridge.exec(db, sql, params)?)
}

fn last_insert_id_impl(bridge: &Bridge, result: Handle) -> Result<i64, Failure> {
    Ok(bridge.last_insert_id(result)?)
}

fn rows_affected_impl(bridge: &Bridge, result: Handle) -> Result<i64, Failure> {
    Ok(bridge.rows_affected(result)?)
}

/// Translate an Erlang term into the bridge's host value model.
fn host_value(term: Term) -> HostValue {
    if let Ok(binary) = term.decode::<Binary>() {
        return HostValue::Bytes(binary.as_slice().to_vec());
    }
    if let Ok(i) = term.decode::<i64>() {
        return HostValue::Int(i);
    }
    if let Ok(f) = term.decode::<f64>() {
        return HostValue::Float(f);
    }
    if term.is_atom() {
        if let Ok(name) = term.atom_to_string() {
            return atom_value(name);
        }
    }
    HostValue::Other(format!("{:?}", term))
}

fn atom_value(name: String) -> HostValue {
    match name.as_str() {
        "nil" | "undefined" => HostValue::Nil,
        "true" => HostValue::Bool(true),
        "false" => HostValue::Bool(false),
        _ => HostValue::Symbol(name),
    }
}

// ============================================================================
// NIF Wrappers (delegate to pure logic)
// ============================================================================

/// Get the version of the sqlbridge-rustler bindings.
#[rustler::nif]
fn version() -> String {
    version_impl()
}

/// List the available driver names.
#[rustler::nif]
fn drivers() -> Vec<String> {
    Bridge::global().driver_names()
}

/// Open a connection. Returns `{:ok, db}` or `{:error, message}`.
#[rustler::nif(schedule = "DirtyIo")]
fn open<'a>(
    driver_name: Term<'a>,
    data_source_name: Term<'a>,
) -> NifResult<(Atom, ResourceArc<DbResource>)> {
    let bridge = Bridge::global();
    let handle = open_impl(bridge, &host_value(driver_name), &host_value(data_source_name))
        .map_err(Failure::into_nif_error)?;
    let wrapper = HandleWrapper::new(bridge, handle);
    Ok((atoms::ok(), ResourceArc::new(DbResource(wrapper))))
}

/// Execute a statement. Returns `{:ok, result}` or `{:error, message}`.
#[rustler::nif(schedule = "DirtyIo")]
fn exec<'a>(
    db: ResourceArc<DbResource>,
    sql: Term<'a>,
    params: Vec<Term<'a>>,
) -> NifResult<(Atom, ResourceArc<ResultResource>)> {
    let bridge = Bridge::global();
    let params: Vec<HostValue> = params.into_iter().map(host_value).collect();
    let handle = exec_impl(bridge, db.0.handle, &host_value(sql), &params)
        .map_err(Failure::into_nif_error)?;
    let wrapper = HandleWrapper::new(bridge, handle);
    Ok((atoms::ok(), ResourceArc::new(ResultResource(wrapper))))
}

/// Last inserted row id of a result. Returns `{:ok, id}` or `{:error, message}`.
#[rustler::nif]
fn last_insert_id(result: ResourceArc<ResultResource>) -> NifResult<(Atom, i64)> {
    let id = last_insert_id_impl(Bridge::global(), result.0.handle)
        .map_err(Failure::into_nif_error)?;
    Ok((atoms::ok(), id))
}

/// Rows changed by a result's statement. Returns `{:ok, n}` or `{:error, message}`.
#[rustler::nif]
fn rows_affected(result: ResourceArc<ResultResource>) -> NifResult<(Atom, i64)> {
    let rows = rows_affected_impl(Bridge::global(), result.0.handle)
        .map_err(Failure::into_nif_error)?;
    Ok((atoms::ok(), rows))
}

/// Number of handles currently registered.
#[rustler::nif]
fn live_handles() -> usize {
    Bridge::global().live_handles()
}

// ============================================================================
// Rustler Init
// ============================================================================

fn load(_env: Env, _info: Term) -> bool {
    sqlbridge_core::logging::init();
    true
}

rustler::init!("Elixir.SqlBridge.Native", load = load);

#[cfg(test)]
mod tests {
    use super::*;

    fn leaked_bridge() -> &'static Bridge {
        Box::leak(Box::new(Bridge::new()))
    }

    fn text(s: &str) -> HostValue {
        HostValue::from(s)
    }

    #[test]
    fn test_version() {
        assert!(!version_impl().is_empty());
    }

    #[test]
    fn test_atom_values() {
        assert_eq!(atom_value("nil".into()), HostValue::Nil);
        assert_eq!(atom_value("true".into()), HostValue::Bool(true));
        assert_eq!(atom_value("false".into()), HostValue::Bool(false));
        assert_eq!(
            atom_value("sqlite".into()),
            HostValue::Symbol("sqlite".into())
        );
    }

    #[test]
    fn test_driver_error_is_returned_not_raised() {
        let bridge = leaked_bridge();
        let failure = open_impl(bridge, &text("nosuchdb"), &text("")).unwrap_err();
        assert!(matches!(failure, Failure::Error(ref msg) if msg.contains("nosuchdb")));
    }

    #[test]
    fn test_stale_handle_is_raised() {
        let bridge = leaked_bridge();
        let db = open_impl(bridge, &text("sqlite"), &text("file::memory:")).unwrap();
        bridge.release(db);

        let failure = exec_impl(bridge, db, &text("SELECT 1"), &[]).unwrap_err();
        assert!(matches!(failure, Failure::ContractViolation(_)));
    }

    #[test]
    fn test_scenario_through_pure_layer() {
        let bridge = leaked_bridge();
        let db = open_impl(bridge, &text("sqlite"), &text("file::memory:")).unwrap();
        exec_impl(bridge, db, &text("CREATE TABLE t(x)"), &[]).unwrap();
        let res = exec_impl(bridge, db, &text("INSERT INTO t VALUES (?)"), &[HostValue::Int(5)])
            .unwrap();
        assert_eq!(rows_affected_impl(bridge, res).unwrap(), 1);
        assert!(last_insert_id_impl(bridge, res).unwrap() >= 0);
    }

    #[test]
    fn test_dropping_wrapper_releases_handle() {
        let bridge = leaked_bridge();
        let db = open_impl(bridge, &text("sqlite"), &text("file::memory:")).unwrap();
        let wrapper = HandleWrapper::new(bridge, db);
        assert_eq!(bridge.live_handles(), 1);

        drop(wrapper);
        assert_eq!(bridge.live_handles(), 0);
        assert!(matches!(
            rows_affected_impl(bridge, db),
            Err(Failure::ContractViolation(_))
        ));
    }
}

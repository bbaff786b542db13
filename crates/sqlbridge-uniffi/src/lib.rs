//! UniFFI bindings for sqlbridge-core.
//!
//! This crate exposes the bridge to every language UniFFI can target
//! (Python, Kotlin, Swift, Ruby; C# and Go through third-party generators).
//! Host objects returned by these bindings carry only a registry handle.
//! When the host language's collector frees one, UniFFI drops the Rust side
//! and the handle is released.
//!
//! # Usage
//!
//! Generate bindings using `--library` mode:
//!
//! ```bash
//! # Build the cdylib
//! cargo build -p sqlbridge-uniffi --release
//!
//! # Generate Python bindings
//! sqlbridge-uniffi-bindgen generate --library --language python \
//!     --out-dir ./bindings/python target/release/libsqlbridge_uniffi.so
//! ```
//!
//! ```python
//! db = sqlbridge_uniffi.open("sqlite", "file::memory:")
//! db.exec("CREATE TABLE t(x)", [])
//! res = db.exec("INSERT INTO t VALUES (?)", [FfiValue.INT(value=5)])
//! assert res.rows_affected() == 1
//! ```

// UniFFI scaffolding - this generates the FFI glue code
#[cfg(feature = "bindings")]
uniffi::setup_scaffolding!();

#[cfg(feature = "bindings")]
mod bindings;

#[cfg(feature = "bindings")]
pub use bindings::*;

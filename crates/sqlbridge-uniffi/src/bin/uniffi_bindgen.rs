/// uniffi-bindgen entry point for the sqlbridge cdylib.
///
/// Generates Python/Kotlin/Swift modules whose `FfiConnection` and
/// `FfiResult` classes release their registry handle when the host language
/// collects them.
///
/// Usage:
///   cargo run -p sqlbridge-uniffi --features cli --bin sqlbridge-uniffi-bindgen -- \
///     generate --library -l python -o bindings/python \
///     target/release/libsqlbridge_uniffi.so
fn main() {
    uniffi::uniffi_bindgen_main();
}

fn main() {
    // The enif_* symbols come from the BEAM process that dlopens the NIF
    // library. Linking on macOS fails on undefined symbols unless they are
    // deferred to load time.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
        println!("cargo:rustc-link-arg=-undefined");
        println!("cargo:rustc-link-arg=dynamic_lookup");
    }
}

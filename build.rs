use std::env;

fn main() {
    // Version string shared by the CLI and the C bindings
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=RALLY_VERSION={version}");

    // Set linking information for C libraries
    if env::var_os("CARGO_FEATURE_C_BINDINGS").is_some() {
        // Ensure we link against the C runtime
        println!("cargo:rustc-link-lib=c");
    }

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

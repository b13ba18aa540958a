use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    // The C header is a by-product; failing to produce it must not fail the
    // Rust build, so every problem below ends in a warning.
    if let Err(msg) = write_header() {
        println!("cargo:warning=forge.h not generated: {msg}");
    }
}

fn write_header() -> Result<(), String> {
    let crate_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").map_err(|e| format!("CARGO_MANIFEST_DIR: {e}"))?,
    );
    let include_dir = crate_dir.join("include");
    fs::create_dir_all(&include_dir)
        .map_err(|e| format!("cannot create {}: {e}", include_dir.display()))?;

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))?;
    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
        .map_err(|e| e.to_string())?;

    bindings.write_to_file(include_dir.join("forge.h"));
    Ok(())
}

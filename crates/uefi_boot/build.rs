use std::env;
use std::path::PathBuf;

// The stub jumps into `ferros_loader_main`, which lives in the loader's static
// library. Point FERROS_LOADER_LIB at that archive when building for UEFI.
fn main() {
    println!("cargo:rerun-if-env-changed=FERROS_LOADER_LIB");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "uefi" {
        return;
    }

    match env::var_os("FERROS_LOADER_LIB").map(PathBuf::from) {
        Some(lib) if lib.is_file() => {
            println!("cargo:rerun-if-changed={}", lib.display());
            println!("cargo:rustc-link-arg-bins={}", lib.display());
        }
        Some(lib) => {
            println!("cargo:warning=FERROS_LOADER_LIB={} does not exist; link will fail", lib.display());
        }
        None => {
            println!("cargo:warning=FERROS_LOADER_LIB not set; ferros_loader_main must come from the linker command line");
        }
    }
}

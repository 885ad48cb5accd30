//! Building the stub and laying it out on the ESP.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::command;
use crate::config::LauncherConfig;
use crate::error::LauncherError;

pub const PACKAGE: &str = "ferros-uefi-boot";
pub const BIN_NAME: &str = "ferros-boot";

/// Where x86_64 firmware looks for a removable-media boot loader.
pub const FALLBACK_BOOT_PATH: &str = "EFI/BOOT/BOOTX64.EFI";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build with the debugger gate (`debug-wait` feature).
    pub debug_wait: bool,
    pub release: bool,
}

impl BuildOptions {
    fn profile_dir(&self) -> &'static str {
        if self.release {
            "release"
        } else {
            "debug"
        }
    }
}

pub fn cargo_build_args(config: &LauncherConfig, opts: BuildOptions) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--package".to_string(),
        PACKAGE.to_string(),
        "--target".to_string(),
        config.target.clone(),
        "--target-dir".to_string(),
        config.cargo_target_dir.display().to_string(),
    ];
    if opts.release {
        args.push("--release".to_string());
    }
    if opts.debug_wait {
        args.push("--features".to_string());
        args.push("debug-wait".to_string());
    }
    args
}

/// The .efi cargo produces for `opts`.
pub fn efi_artifact(config: &LauncherConfig, opts: BuildOptions) -> PathBuf {
    config
        .cargo_target_dir
        .join(&config.target)
        .join(opts.profile_dir())
        .join(format!("{}.efi", BIN_NAME))
}

pub fn boot_file(config: &LauncherConfig) -> PathBuf {
    config.esp_dir().join(FALLBACK_BOOT_PATH)
}

/// Builds the stub and installs it as the ESP's fallback boot loader.
pub fn build(config: &LauncherConfig, opts: BuildOptions) -> Result<PathBuf, LauncherError> {
    let mut cargo = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()));
    cargo.args(cargo_build_args(config, opts));
    if let Some(lib) = &config.loader_lib {
        cargo.env("FERROS_LOADER_LIB", lib);
    }
    command::run(&mut cargo)?;

    let artifact = efi_artifact(config, opts);
    if !artifact.is_file() {
        return Err(LauncherError::MissingArtifact(artifact));
    }
    install_into_esp(&artifact, config)
}

pub fn install_into_esp(artifact: &Path, config: &LauncherConfig) -> Result<PathBuf, LauncherError> {
    let dest = boot_file(config);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(artifact, &dest)?;
    log::info!("installed {} -> {}", artifact.display(), dest.display());
    Ok(dest)
}

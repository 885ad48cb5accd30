use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::LauncherError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ferros.toml";

/// Launcher settings. Every field is optional in `ferros.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Rust target the stub is built for.
    pub target: String,
    /// Cargo's target directory (where `cargo build` leaves the .efi).
    pub cargo_target_dir: PathBuf,
    /// Where the launcher assembles the ESP and writes gdb scripts.
    pub out_dir: PathBuf,
    /// Static library providing `ferros_loader_main`, exported as FERROS_LOADER_LIB.
    pub loader_lib: Option<PathBuf>,
    pub qemu: String,
    /// OVMF firmware image handed to QEMU as `-bios`.
    pub ovmf: PathBuf,
    pub gdb_port: u16,
    /// Appended to the generated QEMU command line.
    pub qemu_args: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            target: "x86_64-unknown-uefi".to_string(),
            cargo_target_dir: PathBuf::from("target"),
            out_dir: PathBuf::from("target/ferros"),
            loader_lib: None,
            qemu: "qemu-system-x86_64".to_string(),
            ovmf: PathBuf::from("OVMF/OVMF.fd"),
            gdb_port: 1234,
            qemu_args: Vec::new(),
        }
    }
}

impl LauncherConfig {
    /// Explicit path must exist; otherwise `ferros.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LauncherError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    log::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, LauncherError> {
        let text = fs::read_to_string(path).map_err(|source| LauncherError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| LauncherError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// EFI System Partition directory exposed to QEMU as a FAT drive.
    pub fn esp_dir(&self) -> PathBuf {
        self.out_dir.join("esp")
    }
}

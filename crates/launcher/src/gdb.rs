//! gdb command files for releasing the debug-wait gate.
//!
//! The stub prints `Waiting for GDB (release flag at 0x...)` when it parks.
//! That address goes into the generated script, which connects to QEMU's gdb
//! server and writes zero to the flag.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LauncherConfig;
use crate::error::LauncherError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachScript {
    pub port: u16,
    pub flag_addr: u64,
    /// PE/COFF image with debug info, loaded at `image_base` if given.
    pub symbols: Option<(PathBuf, u64)>,
    /// Breakpoints set before the gate is released.
    pub breakpoints: Vec<String>,
    /// Resume the target after releasing the gate.
    pub resume: bool,
}

impl AttachScript {
    pub fn render(&self) -> String {
        let mut s = String::new();
        s.push_str("# ferros: attach to the boot stub and release its debug-wait gate\n");
        s.push_str("set architecture i386:x86-64\n");
        let _ = writeln!(s, "target remote localhost:{}", self.port);
        if let Some((path, base)) = &self.symbols {
            let _ = writeln!(s, "add-symbol-file {} -o {:#x}", path.display(), base);
        }
        for bp in &self.breakpoints {
            let _ = writeln!(s, "break {}", bp);
        }
        let _ = writeln!(s, "set {{unsigned char}}{:#x} = 0", self.flag_addr);
        if self.resume {
            s.push_str("continue\n");
        }
        s
    }

    pub fn default_path(config: &LauncherConfig) -> PathBuf {
        config.out_dir.join("attach.gdb")
    }

    pub fn write(&self, path: &Path) -> Result<(), LauncherError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        log::info!("wrote {} (run: gdb -x {})", path.display(), path.display());
        Ok(())
    }
}

/// Accepts `0x`-prefixed or bare hex, with `_` separators.
pub fn parse_address(text: &str) -> Result<u64, LauncherError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .replace('_', "");
    if digits.is_empty() {
        return Err(LauncherError::InvalidAddress(text.to_string()));
    }
    u64::from_str_radix(&digits, 16).map_err(|_| LauncherError::InvalidAddress(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_printed_pointer() {
        assert_eq!(parse_address("0x3e6a5010").unwrap(), 0x3e6a_5010);
        assert_eq!(parse_address("3E6A5010").unwrap(), 0x3e6a_5010);
        assert_eq!(parse_address(" 0x3e6a_5010 ").unwrap(), 0x3e6a_5010);
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(parse_address("0x"), Err(LauncherError::InvalidAddress(_))));
        assert!(matches!(parse_address("flag"), Err(LauncherError::InvalidAddress(_))));
    }

    #[test]
    fn release_comes_after_breakpoints() {
        let script = AttachScript {
            port: 1234,
            flag_addr: 0x3e6a_5010,
            symbols: Some((PathBuf::from("target/ferros-boot.debug"), 0x3e6a_0000)),
            breakpoints: vec!["ferros_loader_main".into()],
            resume: true,
        }
        .render();

        let lines: Vec<&str> = script.lines().collect();
        assert!(lines.contains(&"target remote localhost:1234"));
        assert!(lines.contains(&"add-symbol-file target/ferros-boot.debug -o 0x3e6a0000"));
        let bp = lines.iter().position(|l| *l == "break ferros_loader_main").unwrap();
        let release = lines.iter().position(|l| *l == "set {unsigned char}0x3e6a5010 = 0").unwrap();
        assert!(bp < release);
        assert_eq!(lines.last(), Some(&"continue"));
    }

    #[test]
    fn no_resume_leaves_target_stopped() {
        let script = AttachScript {
            port: 1234,
            flag_addr: 0x10,
            symbols: None,
            breakpoints: Vec::new(),
            resume: false,
        }
        .render();
        assert!(!script.contains("continue"));
        assert!(!script.contains("add-symbol-file"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/attach.gdb");
        let script = AttachScript {
            port: 1,
            flag_addr: 0x20,
            symbols: None,
            breakpoints: Vec::new(),
            resume: true,
        };
        script.write(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), script.render());
    }
}

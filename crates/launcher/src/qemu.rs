//! Running the ESP under QEMU + OVMF.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::command;
use crate::config::LauncherConfig;
use crate::error::LauncherError;

pub fn qemu_args(config: &LauncherConfig, esp: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-cpu",
        "qemu64",
        "-smp",
        "cores=2,threads=1,sockets=1",
        "-bios",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(config.ovmf.display().to_string());
    args.push("-drive".to_string());
    args.push(format!("format=raw,file=fat:rw:{}", esp.display()));
    args.extend(
        [
            "-nographic",
            "-monitor",
            "null",
            "-serial",
            "stdio",
            "-d",
            "cpu_reset",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    // gdb stub; the debug-wait gate keeps the stub parked until it is used.
    args.push("-gdb".to_string());
    args.push(format!("tcp::{}", config.gdb_port));
    args.extend(config.qemu_args.iter().cloned());
    args
}

/// Drops console lines that start with an ESC byte.
///
/// OVMF clears and repaints the screen with escape sequences; on a serial
/// console those show up as garbage lines. Line state carries across
/// `filter` calls, so reads may split lines anywhere.
#[derive(Debug)]
pub struct ConsoleFilter {
    start_of_line: bool,
    dropping: bool,
}

impl Default for ConsoleFilter {
    fn default() -> Self {
        Self {
            start_of_line: true,
            dropping: false,
        }
    }
}

impl ConsoleFilter {
    pub fn filter(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.start_of_line {
                self.dropping = b == 0x1b;
                self.start_of_line = false;
            }
            if b == b'\n' {
                self.start_of_line = true;
            }
            if !self.dropping {
                out.push(b);
            }
        }
    }
}

/// Boots the ESP and streams QEMU's filtered serial output to stdout until it exits.
pub fn run(config: &LauncherConfig) -> Result<(), LauncherError> {
    let esp = config.esp_dir();
    if !esp.is_dir() {
        return Err(LauncherError::MissingArtifact(esp));
    }

    let mut qemu = Command::new(&config.qemu);
    qemu.args(qemu_args(config, &esp)).stdout(Stdio::piped());
    let mut child = command::spawn(&mut qemu)?;
    log::info!("gdb server on localhost:{}", config.gdb_port);

    stream_console(&mut child, &mut io::stdout().lock())?;

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(LauncherError::CommandFailed {
            program: config.qemu.clone(),
            status,
        })
    }
}

/// Forwards the child's filtered stdout to `out` until it closes.
///
/// On a read or write error the child is killed and reaped before the error
/// is returned.
fn stream_console(child: &mut Child, out: &mut impl Write) -> io::Result<()> {
    let Some(serial) = child.stdout.take() else {
        return Ok(());
    };
    if let Err(err) = forward(serial, out) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(err);
    }
    Ok(())
}

fn forward(mut serial: impl Read, out: &mut impl Write) -> io::Result<()> {
    let mut filter = ConsoleFilter::default();
    let mut input = [0u8; 512];
    let mut output = Vec::with_capacity(input.len());
    loop {
        let n = serial.read(&mut input)?;
        if n == 0 {
            return Ok(());
        }
        output.clear();
        filter.filter(&input[..n], &mut output);
        out.write_all(&output)?;
        out.flush()?;
    }
}

//! FerrOS launcher
//!
//! Host-side companion to the boot stub: builds it for UEFI, lays it out on
//! an ESP directory, boots that under QEMU/OVMF with a gdb server, and writes
//! the gdb script that releases a `--debug-wait` build.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

mod command;
mod config;
mod error;
mod gdb;
mod image;
mod qemu;

use config::LauncherConfig;
use gdb::AttachScript;
use image::BuildOptions;

#[derive(Parser, Debug)]
#[command(name = "ferros")]
#[command(about = "Build, boot and debug the FerrOS UEFI stub", long_about = None)]
struct Cli {
    /// Launcher config (default: ./ferros.toml if present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct BuildArgs {
    /// Park the stub until a debugger clears FERROS_DEBUG_WAIT
    #[arg(long)]
    debug_wait: bool,

    #[arg(long)]
    release: bool,
}

impl From<BuildArgs> for BuildOptions {
    fn from(args: BuildArgs) -> Self {
        BuildOptions {
            debug_wait: args.debug_wait,
            release: args.release,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the stub and install it as EFI/BOOT/BOOTX64.EFI on the ESP
    Build(BuildArgs),

    /// Build (unless --no-build) and boot the ESP under QEMU
    Run {
        #[command(flatten)]
        build: BuildArgs,

        /// Boot whatever is already on the ESP
        #[arg(long)]
        no_build: bool,
    },

    /// Write a gdb script that attaches to QEMU and releases the gate
    GdbScript {
        /// Flag address printed by the stub ("release flag at 0x...")
        #[arg(long, value_name = "ADDR")]
        flag_addr: String,

        /// Debug-info image to load, as PATH@BASE (BASE = loaded image base)
        #[arg(long, value_name = "PATH@BASE")]
        symbols: Option<String>,

        /// Breakpoint to set before releasing (repeatable)
        #[arg(long = "break", value_name = "LOCATION")]
        breakpoints: Vec<String>,

        /// Leave the target stopped after releasing the gate
        #[arg(long)]
        no_continue: bool,

        /// Output path (default: <out_dir>/attach.gdb)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Remove launcher output and cargo build artifacts
    Clean,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = LauncherConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build(args) => {
            let installed = image::build(&config, args.into())?;
            println!("{}", installed.display());
        }
        Commands::Run { build, no_build } => {
            if !no_build {
                image::build(&config, build.into())?;
            }
            if build.debug_wait {
                log::info!("stub will wait for gdb; see `ferros gdb-script --help`");
            }
            qemu::run(&config)?;
        }
        Commands::GdbScript {
            flag_addr,
            symbols,
            breakpoints,
            no_continue,
            output,
        } => {
            let symbols = symbols.map(|arg| parse_symbols(&arg)).transpose()?;
            let script = AttachScript {
                port: config.gdb_port,
                flag_addr: gdb::parse_address(&flag_addr)?,
                symbols,
                breakpoints,
                resume: !no_continue,
            };
            let path = output.unwrap_or_else(|| AttachScript::default_path(&config));
            script.write(&path)?;
            println!("{}", path.display());
        }
        Commands::Clean => clean(&config)?,
    }

    Ok(())
}

fn parse_symbols(arg: &str) -> Result<(PathBuf, u64)> {
    let (path, base) = arg
        .rsplit_once('@')
        .with_context(|| format!("--symbols expects PATH@BASE, got {:?}", arg))?;
    Ok((PathBuf::from(path), gdb::parse_address(base)?))
}

fn clean(config: &LauncherConfig) -> Result<()> {
    if config.out_dir.exists() {
        fs::remove_dir_all(&config.out_dir)
            .with_context(|| format!("failed to remove {}", config.out_dir.display()))?;
        log::info!("removed {}", config.out_dir.display());
    }

    let mut cargo = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()));
    cargo
        .arg("clean")
        .arg("--target-dir")
        .arg(&config.cargo_target_dir);
    command::run(&mut cargo)?;
    Ok(())
}

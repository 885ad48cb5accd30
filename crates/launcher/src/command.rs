use std::process::{Child, Command};

use crate::error::LauncherError;

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Runs `cmd` to completion; a non-zero exit is an error.
pub fn run(cmd: &mut Command) -> Result<(), LauncherError> {
    let program = program_name(cmd);
    log::info!("running {:?}", cmd);

    let status = cmd
        .status()
        .map_err(|source| LauncherError::Spawn { program: program.clone(), source })?;
    if status.success() {
        Ok(())
    } else {
        Err(LauncherError::CommandFailed { program, status })
    }
}

pub fn spawn(cmd: &mut Command) -> Result<Child, LauncherError> {
    log::info!("starting {:?}", cmd);
    cmd.spawn().map_err(|source| LauncherError::Spawn {
        program: program_name(cmd),
        source,
    })
}

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },

    #[error("expected build output at {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("invalid address {0:?}: expected hex such as 0x3e6a5010")]
    InvalidAddress(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

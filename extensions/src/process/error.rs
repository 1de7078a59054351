use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Engine executable '{0:?}' not found")]
    ExecutableNotFound(PathBuf),

    #[error("Engine working directory '{0:?}' not found")]
    WorkingDirNotFound(PathBuf),

    #[error("Failed to spawn engine process '{0:?}': {1}")]
    Spawn(PathBuf, std::io::Error),

    #[error("Engine process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Failed to wait for engine process: {0}")]
    Wait(std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

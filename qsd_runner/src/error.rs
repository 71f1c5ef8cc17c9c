use std::path::PathBuf;

use qsd_solver::QSDError;
use thiserror::Error;

/// Returned from the runner before or during a solve.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// [`QSDError`]
    #[error(transparent)]
    Solve(#[from] QSDError),
}

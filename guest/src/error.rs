use crate::rlimits::RlimitParseError;
use krun_mount::MountError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("mount error: {0}")]
    Mount(#[from] MountError),

    #[error("invalid rlimits: {0}")]
    RlimitParse(#[from] RlimitParseError),

    #[error("setting rlimit for resource {resource} failed: {source}")]
    Rlimit {
        resource: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("exec {path:?} failed: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

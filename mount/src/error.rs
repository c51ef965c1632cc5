use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("mount {fs_type} on {target:?} failed: {source}")]
    MountFailed {
        fs_type: String,
        target: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("symlink {link:?} -> {original:?} failed: {source}")]
    LinkFailed {
        original: PathBuf,
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MountError {
    /// True when a symlink could not be created because the link path
    /// is already taken.
    pub fn is_already_exists(&self) -> bool {
        match self {
            MountError::LinkFailed { source, .. } | MountError::Io(source) => {
                source.kind() == std::io::ErrorKind::AlreadyExists
            }
            MountError::MountFailed { .. } => false,
        }
    }
}

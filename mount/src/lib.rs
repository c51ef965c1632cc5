//! Filesystem bring-up primitives for the guest init.

mod error;
mod fs;

pub use error::MountError;
pub use fs::{link_alias, mount_fs};
pub use nix::mount::MsFlags;

/// Where the process information filesystem lives in the guest.
pub const PROC_TARGET: &str = "/proc";

/// Conventional alias for the per-process descriptor directory.
pub const FD_LINK: &str = "/dev/fd";
pub const FD_LINK_TARGET: &str = "/proc/self/fd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub fs_type: String,
    pub source: String,
    pub flags: MsFlags,
}

impl MountSpec {
    pub fn new(fs_type: &str, source: &str, flags: MsFlags) -> Self {
        Self {
            fs_type: fs_type.to_string(),
            source: source.to_string(),
            flags,
        }
    }

    /// procfs without device nodes, setuid binaries or exec, relatime.
    pub fn proc() -> Self {
        Self::new(
            "proc",
            "proc",
            MsFlags::MS_NODEV | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC | MsFlags::MS_RELATIME,
        )
    }
}

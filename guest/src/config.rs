//! Guest configuration handed over by the host through the environment.

use std::ffi::OsString;
use std::path::PathBuf;

pub const HOSTNAME_VAR: &str = "HOSTNAME";
pub const RLIMITS_VAR: &str = "KRUN_RLIMITS";
pub const WORKDIR_VAR: &str = "KRUN_WORKDIR";
pub const INIT_VAR: &str = "KRUN_INIT";

/// Configuration passed from host to guest.
///
/// Every field is optional; an absent value means the matching bring-up
/// stage is skipped (or, for `init`, that the default target is used).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestConfig {
    pub hostname: Option<OsString>,
    pub rlimits: Option<String>,
    pub workdir: Option<PathBuf>,
    pub init: Option<PathBuf>,
}

impl GuestConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<OsString>,
    {
        Self {
            hostname: lookup(HOSTNAME_VAR),
            rlimits: lookup(RLIMITS_VAR)
                .map(|v| v.to_string_lossy().into_owned())
                .filter(|v| !v.is_empty()),
            workdir: lookup(WORKDIR_VAR).map(PathBuf::from),
            init: lookup(INIT_VAR).map(PathBuf::from),
        }
    }
}

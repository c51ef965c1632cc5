//! Resolution of the workload the init process hands over to.

use crate::error::InitError;
use std::ffi::{CStr, CString, OsString};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

/// Exec target used when `KRUN_INIT` is not set.
pub const DEFAULT_INIT: &str = "/iwasm";

/// The program image that replaces init, and its argument vector.
///
/// `argv[0]` is always the resolved path; the remaining arguments are the
/// ones init was started with. The environment is inherited untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecTarget {
    path: PathBuf,
    program: CString,
    argv: Vec<CString>,
}

impl ExecTarget {
    /// Resolve the target from an optional override and init's own argv.
    pub fn resolve<I>(init: Option<&Path>, args: I) -> Result<Self, InitError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let path = init.unwrap_or(Path::new(DEFAULT_INIT)).to_path_buf();
        let program = to_cstring(path.clone().into_os_string())?;

        let mut argv = vec![program.clone()];
        for arg in args.into_iter().skip(1) {
            argv.push(to_cstring(arg)?);
        }

        Ok(Self {
            path,
            program,
            argv,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn program(&self) -> &CStr {
        &self.program
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }
}

fn to_cstring(value: OsString) -> Result<CString, InitError> {
    CString::new(value.into_vec()).map_err(|e| {
        let position = e.nul_position();
        let bytes = e.into_vec();
        InitError::InvalidArgument(format!(
            "interior NUL byte at position {} in {:?}",
            position,
            String::from_utf8_lossy(&bytes)
        ))
    })
}

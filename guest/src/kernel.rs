//! The kernel boundary of the init process.
//!
//! Every side effect bring-up has on the guest goes through [`Kernel`], so
//! the boot sequence can run against a recording fake in tests.

use crate::exec::ExecTarget;
use crate::rlimits::Rlimit;
use crate::{net, tty};
use krun_mount::{MountError, MountSpec};
use std::convert::Infallible;
use std::ffi::OsStr;
use std::io;
use std::os::fd::RawFd;
use std::path::Path;

pub trait Kernel {
    fn mount(&mut self, spec: &MountSpec, target: &Path) -> Result<(), MountError>;

    fn symlink(&mut self, original: &Path, link: &Path) -> Result<(), MountError>;

    fn set_hostname(&mut self, hostname: &OsStr) -> io::Result<()>;

    fn new_session(&mut self) -> io::Result<()>;

    fn set_controlling_tty(&mut self, fd: RawFd) -> io::Result<()>;

    fn bring_up_interface(&mut self, name: &str) -> io::Result<()>;

    fn set_rlimit(&mut self, limit: &Rlimit) -> io::Result<()>;

    fn chdir(&mut self, dir: &Path) -> io::Result<()>;

    /// Replace the process image. Returns only on failure.
    fn exec(&mut self, target: &ExecTarget) -> io::Result<Infallible>;
}

/// The running Linux kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxKernel;

impl Kernel for LinuxKernel {
    fn mount(&mut self, spec: &MountSpec, target: &Path) -> Result<(), MountError> {
        krun_mount::mount_fs(spec, target)
    }

    fn symlink(&mut self, original: &Path, link: &Path) -> Result<(), MountError> {
        krun_mount::link_alias(original, link)
    }

    fn set_hostname(&mut self, hostname: &OsStr) -> io::Result<()> {
        nix::unistd::sethostname(hostname)?;
        Ok(())
    }

    fn new_session(&mut self) -> io::Result<()> {
        tty::new_session()
    }

    fn set_controlling_tty(&mut self, fd: RawFd) -> io::Result<()> {
        tty::set_controlling_tty(fd)
    }

    fn bring_up_interface(&mut self, name: &str) -> io::Result<()> {
        net::bring_up_interface(name)
    }

    fn set_rlimit(&mut self, limit: &Rlimit) -> io::Result<()> {
        let rlim = libc::rlimit {
            rlim_cur: limit.soft as libc::rlim_t,
            rlim_max: limit.hard as libc::rlim_t,
        };
        // The resource id is passed through unchecked; the kernel rejects
        // unknown ones with EINVAL.
        let ret = unsafe { libc::setrlimit(limit.resource as _, &rlim) };
        nix::errno::Errno::result(ret)?;
        Ok(())
    }

    fn chdir(&mut self, dir: &Path) -> io::Result<()> {
        nix::unistd::chdir(dir)?;
        Ok(())
    }

    fn exec(&mut self, target: &ExecTarget) -> io::Result<Infallible> {
        Ok(nix::unistd::execv(target.program(), target.argv())?)
    }
}

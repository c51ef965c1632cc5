//! Session and controlling terminal setup for the init process.
//!
//! NOTE: This module is Linux-only and must be cross-compiled for the guest VM.

use nix::errno::Errno;
use std::os::fd::RawFd;

/// Start a new session with the calling process as its leader.
pub fn new_session() -> std::io::Result<()> {
    let sid = nix::unistd::setsid()?;
    tracing::debug!("new session {}", sid);
    Ok(())
}

/// Make the terminal open on `fd` the controlling terminal of the session.
///
/// Only meaningful for a session leader without a controlling terminal,
/// so call [`new_session`] first.
pub fn set_controlling_tty(fd: RawFd) -> std::io::Result<()> {
    // A non-zero argument steals the terminal from another session when
    // running as root.
    let ret = unsafe { libc::ioctl(fd, libc::TIOCSCTTY as _, 1) };
    Errno::result(ret)?;
    Ok(())
}

//! Network interface flag handling for guest loopback bring-up.

use nix::errno::Errno;
use nix::sys::socket::{AddressFamily, SockFlag, SockType, socket};
use std::io;
use std::os::fd::AsRawFd;

pub const LOOPBACK: &str = "lo";

/// A zeroed `ifreq` naming `name`.
fn ifreq(name: &str) -> io::Result<libc::ifreq> {
    // The name must leave room for the terminating NUL.
    if name.is_empty() || name.len() >= libc::IFNAMSIZ || name.contains('\0') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid interface name {:?}", name),
        ));
    }

    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(name.bytes()) {
        *dst = src as libc::c_char;
    }
    Ok(ifr)
}

/// Set `IFF_UP` on the named interface.
///
/// A datagram socket is opened only as an ioctl handle and closed again
/// when this returns.
pub fn bring_up_interface(name: &str) -> io::Result<()> {
    let mut ifr = ifreq(name)?;

    let sock = socket(
        AddressFamily::Inet,
        SockType::Datagram,
        SockFlag::SOCK_CLOEXEC,
        None,
    )?;
    let fd = sock.as_raw_fd();

    let ret = unsafe { libc::ioctl(fd, libc::SIOCGIFFLAGS as _, &mut ifr) };
    Errno::result(ret)?;

    unsafe { ifr.ifr_ifru.ifru_flags |= libc::IFF_UP as libc::c_short };

    let ret = unsafe { libc::ioctl(fd, libc::SIOCSIFFLAGS as _, &ifr) };
    Errno::result(ret)?;

    tracing::debug!("interface {} up", name);
    Ok(())
}

//! Raw ICMP socket I/O over direct libc calls.

use crate::error::ProbeError;
use std::io;
use std::mem;
use std::net::Ipv4Addr;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

/// Bounded-wait receive seam between the wait loop and the raw socket, so
/// the reply-matching logic can be driven without privilege in tests.
pub trait ReplySource {
    /// Waits up to `timeout` for one datagram. `Ok(None)` means the wait
    /// timed out with nothing to read.
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// An `AF_INET`/`SOCK_RAW`/`IPPROTO_ICMP` socket. Opened fresh for every
/// probe attempt and closed on drop, so kernel-buffered replies from one
/// attempt cannot leak into the next.
pub struct RawIcmpSocket {
    fd: RawFd,
}

impl RawIcmpSocket {
    pub fn new() -> Result<Self, ProbeError> {
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_ICMP) };
        if fd < 0 {
            return Err(ProbeError::SocketCreation(io::Error::last_os_error()));
        }
        Ok(Self { fd })
    }

    /// Sends an ICMP packet to `dst`. The sockaddr port is zero; ports carry
    /// no meaning for raw ICMP.
    pub fn send_to(&self, buf: &[u8], dst: Ipv4Addr) -> io::Result<()> {
        let mut sockaddr: libc::sockaddr_in = unsafe { mem::zeroed() };
        sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
        sockaddr.sin_port = 0;
        sockaddr.sin_addr = libc::in_addr {
            s_addr: u32::from_be_bytes(dst.octets()).to_be(),
        };
        loop {
            let rc = unsafe {
                libc::sendto(
                    self.fd,
                    buf.as_ptr() as *const libc::c_void,
                    buf.len(),
                    0,
                    &sockaddr as *const _ as *const libc::sockaddr,
                    mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                )
            };
            if rc >= 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => continue,
                _ => return Err(err),
            }
        }
    }
}

impl ReplySource for RawIcmpSocket {
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let mut fds = libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            };
            let timeout_ms = left.as_millis().min(i32::MAX as u128) as i32;
            let rc = unsafe { libc::poll(&mut fds as *mut _, 1, timeout_ms) };
            if rc == 0 {
                return Ok(None);
            }
            if rc < 0 {
                let err = io::Error::last_os_error();
                // A termination signal lands here; re-poll with whatever
                // budget is left and let the probe loop see the stop flag.
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            let rc = unsafe {
                libc::recvfrom(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                )
            };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    continue;
                }
                return Err(err);
            }
            return Ok(Some(rc as usize));
        }
    }
}

impl Drop for RawIcmpSocket {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe { libc::close(self.fd) };
            self.fd = -1;
        }
    }
}

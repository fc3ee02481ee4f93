//! Target resolution. The prober looks the name up fresh before every send:
//! DNS can change or flap while the gate is waiting.

use crate::error::ProbeError;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

/// Resolves `host` to an IPv4 address. Literal addresses parse without a
/// lookup. A failed lookup, or one that yields only IPv6 addresses, is a
/// [`ProbeError::DnsLookupFailed`].
pub fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, ProbeError> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }
    let addrs = (host, 0u16)
        .to_socket_addrs()
        .map_err(|err| ProbeError::DnsLookupFailed {
            host: host.to_string(),
            source: err,
        })?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ProbeError::DnsLookupFailed {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no IPv4 addresses"),
        })
}

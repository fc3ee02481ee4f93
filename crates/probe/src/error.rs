use std::io;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors that abort a probe run.
///
/// A probe that simply gets no reply within its timeout is not an error; it
/// is the normal retry case and never surfaces here. DNS and send failures
/// point at a persistent environment problem, so they end the whole run and
/// carry their own exit codes.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to create raw ICMP socket: {0} (raw ICMP requires root or CAP_NET_RAW)")]
    SocketCreation(#[source] io::Error),

    #[error("DNS lookup for {host} failed: {source}")]
    DnsLookupFailed {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("sendto {target} failed: {source}")]
    SendFailed {
        target: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("failed to receive reply: {0}")]
    ReceiveFailed(#[source] io::Error),

    #[error("invalid probe params: {0}")]
    InvalidParams(String),
}

impl ProbeError {
    /// Process exit code for a run aborted by this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProbeError::DnsLookupFailed { .. } => 2,
            ProbeError::SendFailed { .. } => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let dns = ProbeError::DnsLookupFailed {
            host: "nowhere.invalid".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
        };
        assert_eq!(dns.exit_code(), 2);

        let send = ProbeError::SendFailed {
            target: Ipv4Addr::LOCALHOST,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(send.exit_code(), 3);

        let sock = ProbeError::SocketCreation(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(sock.exit_code(), 1);
    }
}

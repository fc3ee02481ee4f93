//! Raw-ICMP "wait until a host answers ping" probe library.
//!
//! Sends ICMP Echo Requests over a raw socket at a fixed cadence and waits
//! for a matching Echo Reply, until it gets one or an overall deadline
//! passes. Intended as the engine behind a service-precondition gate: the
//! caller only looks at the run outcome and maps it to an exit code.

mod checksum;
mod error;
mod packet;
mod prober;
mod resolve;
mod sock;

pub use checksum::checksum16;
pub use error::ProbeError;
pub use packet::{
    EchoReply, EchoRequest, SequenceCounter, ICMP_ECHO_REPLY, ICMP_ECHO_REQUEST, ICMP_HEADER_LEN,
    ICMP_MAX_RECV, IPV4_HEADER_LEN,
};
pub use prober::{wait_for_reply, ProbeParams, Prober, RunFlags, RunOutcome};
pub use resolve::resolve_ipv4;
pub use sock::{RawIcmpSocket, ReplySource};

pub const DEFAULT_TARGET: &str = "google.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PING_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_PING_SIZE: usize = 1;

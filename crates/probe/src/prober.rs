//! The probe state machine: send, bounded wait, retry, until a reply
//! arrives, a fatal error ends the run, a stop is requested, or the overall
//! deadline passes.

use crate::error::ProbeError;
use crate::packet::{EchoReply, EchoRequest, SequenceCounter, ICMP_MAX_RECV};
use crate::resolve::resolve_ipv4;
use crate::sock::{RawIcmpSocket, ReplySource};
use crate::{
    DEFAULT_PING_DELAY_SECS, DEFAULT_PING_SIZE, DEFAULT_PING_TIMEOUT_MS, DEFAULT_TARGET,
    DEFAULT_TIMEOUT_SECS,
};
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Granularity of the inter-probe sleep; bounds how long a stop request can
/// go unnoticed while the prober idles between attempts.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ProbeParams {
    /// Hostname or IPv4 address to ping.
    pub target: String,
    /// Overall deadline for the whole run.
    pub timeout: Duration,
    /// Delay between probe attempts.
    pub ping_delay: Duration,
    /// How long one attempt waits for a matching reply.
    pub ping_timeout: Duration,
    /// Payload bytes per Echo Request.
    pub ping_size: usize,
    /// Enables per-probe diagnostics and the kill-ping fault injection hook.
    pub debug: bool,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ping_delay: Duration::from_secs_f64(DEFAULT_PING_DELAY_SECS),
            ping_timeout: Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
            ping_size: DEFAULT_PING_SIZE,
            debug: false,
        }
    }
}

impl ProbeParams {
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.target.is_empty() {
            return Err(ProbeError::InvalidParams("empty target".into()));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidParams("timeout must be positive".into()));
        }
        if self.ping_timeout.is_zero() {
            return Err(ProbeError::InvalidParams(
                "ping_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Run context shared with the caller's signal handlers. Passed in
/// explicitly; the library holds no globals of its own.
#[derive(Clone, Copy)]
pub struct RunFlags<'a> {
    /// Set by a termination signal; checked at the top of the probe loop.
    pub stop: &'a AtomicBool,
    /// Debug-only fault injection: each pending count is consumed by one
    /// attempt and reports it as a timeout.
    pub kill_ping: &'a AtomicU32,
}

/// How a run ended. Fatal errors travel separately as [`ProbeError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success { target: String, attempts: u32 },
    DeadlineExceeded,
    Cancelled,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Success { .. } => 0,
            RunOutcome::DeadlineExceeded | RunOutcome::Cancelled => 1,
        }
    }
}

/// Outcome of a single attempt that did not abort the run.
enum Attempt {
    Reply(EchoReply, Duration),
    NoReply,
}

pub struct Prober {
    params: ProbeParams,
    ident: u16,
    seq: SequenceCounter,
}

impl Prober {
    pub fn new(params: ProbeParams) -> Result<Self, ProbeError> {
        params.validate()?;
        Ok(Self {
            ident: (process::id() & 0xffff) as u16,
            seq: SequenceCounter::new(),
            params,
        })
    }

    /// Runs probe attempts until one succeeds, the deadline passes, a stop
    /// is requested, or an attempt fails fatally.
    ///
    /// The deadline is only checked after a failed attempt, never
    /// preemptively mid-attempt, so a reply that arrives just before the
    /// deadline still wins.
    pub fn run(&mut self, flags: RunFlags<'_>) -> Result<RunOutcome, ProbeError> {
        let deadline = Instant::now() + self.params.timeout;
        let mut attempts = 0u32;
        loop {
            if flags.stop.load(Ordering::SeqCst) {
                return Ok(RunOutcome::Cancelled);
            }
            attempts += 1;
            match self.one_ping(flags)? {
                Attempt::Reply(reply, rtt) => {
                    debug!(
                        "{} bytes from {}: icmp_seq={} ttl={} time={} ms",
                        reply.payload_len,
                        reply.src,
                        reply.seq,
                        reply.ttl,
                        rtt.as_millis()
                    );
                    return Ok(RunOutcome::Success {
                        target: self.params.target.clone(),
                        attempts,
                    });
                }
                Attempt::NoReply => debug!("request timed out"),
            }
            self.sleep_between(flags);
            if Instant::now() >= deadline {
                return Ok(RunOutcome::DeadlineExceeded);
            }
        }
    }

    /// One probe: fresh socket, fresh DNS lookup, one send, one bounded
    /// wait. The socket is closed when this returns, on every path.
    fn one_ping(&mut self, flags: RunFlags<'_>) -> Result<Attempt, ProbeError> {
        let mut socket = RawIcmpSocket::new()?;
        let dst = resolve_ipv4(&self.params.target)?;
        let request = EchoRequest {
            ident: self.ident,
            seq: self.seq.next(),
            payload_len: self.params.ping_size,
        };
        debug!(%dst, seq = request.seq, "sending echo request");
        let sent_at = Instant::now();
        socket
            .send_to(&request.encode(), dst)
            .map_err(|err| ProbeError::SendFailed {
                target: dst,
                source: err,
            })?;
        let attempt = match wait_for_reply(&mut socket, self.ident, self.params.ping_timeout)? {
            Some(reply) => Attempt::Reply(reply, sent_at.elapsed()),
            None => Attempt::NoReply,
        };
        Ok(apply_kill_ping(self.params.debug, flags.kill_ping, attempt))
    }

    /// Sleeps `ping_delay` in slices, bailing out early on a stop request.
    fn sleep_between(&self, flags: RunFlags<'_>) {
        let mut remaining = self.params.ping_delay;
        while !remaining.is_zero() && !flags.stop.load(Ordering::SeqCst) {
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }
}

/// Waits for an Echo Reply carrying `ident`. Anything else seen on the raw
/// socket (unrelated ICMP traffic, another process's replies) is discarded,
/// and the wait continues on the *remaining* budget rather than restarting.
/// `Ok(None)` when the budget runs out with no match.
///
/// Sequence numbers are deliberately not compared: a stale reply with our
/// ident still counts, matching the legacy tool.
pub fn wait_for_reply<S: ReplySource + ?Sized>(
    source: &mut S,
    ident: u16,
    timeout: Duration,
) -> Result<Option<EchoReply>, ProbeError> {
    let mut buf = [0u8; ICMP_MAX_RECV];
    let mut time_left = timeout;
    loop {
        let wait_started = Instant::now();
        let n = match source
            .recv_timeout(&mut buf, time_left)
            .map_err(ProbeError::ReceiveFailed)?
        {
            Some(n) => n,
            None => return Ok(None),
        };
        if let Some(reply) = EchoReply::parse(&buf[..n]) {
            if reply.ident == ident && reply.is_echo_reply() {
                return Ok(Some(reply));
            }
        }
        time_left = time_left.saturating_sub(wait_started.elapsed());
        if time_left.is_zero() {
            return Ok(None);
        }
    }
}

/// Applies the debug kill switch to a finished attempt. While the counter is
/// nonzero it drains by one on every attempt, replies and timeouts alike,
/// and a reply is reported as a timeout.
fn apply_kill_ping(debug: bool, kill_ping: &AtomicU32, attempt: Attempt) -> Attempt {
    if debug && consume_kill_ping(kill_ping) {
        debug!("ping killed");
        return Attempt::NoReply;
    }
    attempt
}

fn consume_kill_ping(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#![cfg(target_os = "linux")]

//! Integration tests that need a raw-socket-capable environment (root or
//! CAP_NET_RAW) and working name resolution. Run with `--ignored`.

use std::sync::atomic::{AtomicBool, AtomicU32};
use std::time::{Duration, Instant};
use wait_until_pingable_probe::{ProbeError, ProbeParams, Prober, RunFlags, RunOutcome};

const UNREACHABLE_TARGET: &str = "192.0.2.1"; // TEST-NET-1, never answers
const UNRESOLVABLE_TARGET: &str = "this-host-does-not-exist.invalid";

fn run(params: ProbeParams) -> Result<RunOutcome, ProbeError> {
    static STOP: AtomicBool = AtomicBool::new(false);
    static KILL: AtomicU32 = AtomicU32::new(0);
    let mut prober = Prober::new(params)?;
    prober.run(RunFlags {
        stop: &STOP,
        kill_ping: &KILL,
    })
}

#[test]
#[ignore]
fn loopback_succeeds_within_one_delay() {
    let params = ProbeParams {
        target: "127.0.0.1".into(),
        timeout: Duration::from_secs(5),
        ..ProbeParams::default()
    };
    let started = Instant::now();
    let outcome = run(params).expect("loopback probe");
    assert!(matches!(outcome, RunOutcome::Success { ref target, .. } if target == "127.0.0.1"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
#[ignore]
fn unresolvable_target_fails_fast_with_dns_code() {
    let params = ProbeParams {
        target: UNRESOLVABLE_TARGET.into(),
        timeout: Duration::from_secs(30),
        ..ProbeParams::default()
    };
    let started = Instant::now();
    let err = run(params).expect_err("lookup must fail");
    assert!(matches!(err, ProbeError::DnsLookupFailed { .. }));
    assert_eq!(err.exit_code(), 2);
    // Fails on the first attempt, long before the overall timeout.
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
#[ignore]
fn unreachable_target_exhausts_the_deadline() {
    let params = ProbeParams {
        target: UNREACHABLE_TARGET.into(),
        timeout: Duration::from_secs(3),
        ping_delay: Duration::from_secs(1),
        ..ProbeParams::default()
    };
    let started = Instant::now();
    let outcome = run(params).expect("probe run");
    assert_eq!(outcome, RunOutcome::DeadlineExceeded);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3));
    // Never overshoots by more than one probe timeout plus one delay.
    assert!(elapsed < Duration::from_millis(5500));
}

//! Termination-signal handling.
//!
//! Exactly the conventional terminating set is installed (SIGHUP, SIGINT,
//! SIGQUIT, SIGTERM), each setting a stop flag the probe loop polls between
//! attempts. With `--debug`, SIGTSTP instead increments the kill-ping
//! counter, the fault-injection hook that makes the next successful probe
//! look like a timeout. Handlers touch nothing but lock-free atomics.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use wait_until_pingable_probe::RunFlags;

static STOP: AtomicBool = AtomicBool::new(false);
static KILL_PING: AtomicU32 = AtomicU32::new(0);

const TERM_SIGNALS: [libc::c_int; 4] =
    [libc::SIGHUP, libc::SIGINT, libc::SIGQUIT, libc::SIGTERM];

extern "C" fn handle_term(_signum: libc::c_int) {
    STOP.store(true, Ordering::SeqCst);
}

extern "C" fn handle_kill_ping(_signum: libc::c_int) {
    KILL_PING.fetch_add(1, Ordering::SeqCst);
}

/// Installs the handlers and returns the run flags they feed.
pub fn install(debug: bool) -> io::Result<RunFlags<'static>> {
    for signum in TERM_SIGNALS {
        install_handler(signum, handle_term)?;
    }
    if debug {
        install_handler(libc::SIGTSTP, handle_kill_ping)?;
    }
    Ok(RunFlags {
        stop: &STOP,
        kill_ping: &KILL_PING,
    })
}

fn install_handler(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) -> io::Result<()> {
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    // No SA_RESTART: a blocked poll must wake up so the stop flag is seen.
    action.sa_sigaction = handler as usize;
    unsafe { libc::sigemptyset(&mut action.sa_mask) };
    let rc = unsafe { libc::sigaction(signum, &action, std::ptr::null_mut()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

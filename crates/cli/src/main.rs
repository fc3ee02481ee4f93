//! CLI entrypoint for wait-until-pingable.
//!
//! Designed for `ExecStartPre=` lines of systemd units: exit 0 means the
//! target answered a ping, non-zero means it did not. Logs go to stderr,
//! which the service manager captures into the journal.

mod signals;

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wait_until_pingable_probe::{
    ProbeParams, Prober, RunOutcome, DEFAULT_PING_DELAY_SECS, DEFAULT_PING_SIZE,
    DEFAULT_PING_TIMEOUT_MS, DEFAULT_TARGET, DEFAULT_TIMEOUT_SECS,
};

#[derive(Debug, Parser)]
#[command(name = "wait-until-pingable", version, disable_version_flag = true)]
#[command(about = "Wait until a ping response is received or a timeout occurs")]
struct Args {
    /// Print version information.
    #[arg(short = 'V', short_alias = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Name or IPv4 address to ping. IPv6 is not supported.
    #[arg(value_name = "ping_target", default_value = DEFAULT_TARGET)]
    ping_target: String,

    /// Maximum time to keep trying to get a ping response (seconds).
    #[arg(value_name = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Delay between pings (seconds).
    #[arg(short = 'd', long = "ping_delay", default_value_t = DEFAULT_PING_DELAY_SECS)]
    ping_delay: f64,

    /// Time to wait for a ping response (milliseconds).
    #[arg(short = 'p', long = "ping_timeout", default_value_t = DEFAULT_PING_TIMEOUT_MS)]
    ping_timeout: u64,

    /// Number of payload bytes to send in each ping.
    #[arg(short = 's', long = "ping_size", default_value_t = DEFAULT_PING_SIZE)]
    ping_size: usize,

    /// Enable debug output to the console. Do not use this option when
    /// running under a service manager.
    #[arg(long = "debug", default_value_t = false)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ping_delay = match Duration::try_from_secs_f64(args.ping_delay) {
        Ok(delay) => delay,
        Err(_) => {
            error!("invalid --ping_delay {}", args.ping_delay);
            return ExitCode::FAILURE;
        }
    };

    let flags = match signals::install(args.debug) {
        Ok(flags) => flags,
        Err(err) => {
            error!("failed to install signal handlers: {err}");
            return ExitCode::FAILURE;
        }
    };

    let params = ProbeParams {
        target: args.ping_target,
        timeout: Duration::from_secs(args.timeout),
        ping_delay,
        ping_timeout: Duration::from_millis(args.ping_timeout),
        ping_size: args.ping_size,
        debug: args.debug,
    };

    info!("Starting");
    let code = match Prober::new(params) {
        Ok(mut prober) => match prober.run(flags) {
            Ok(outcome) => {
                match &outcome {
                    RunOutcome::Success { target, attempts } => {
                        info!("ping of {target} succeeded (attempt {attempts})");
                    }
                    RunOutcome::DeadlineExceeded => {
                        info!("no ping response within the timeout");
                    }
                    RunOutcome::Cancelled => {
                        info!("stopped before a ping response was received");
                    }
                }
                outcome.exit_code()
            }
            Err(err) => {
                error!("{err}");
                err.exit_code()
            }
        },
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    };
    info!("Exiting");
    ExitCode::from(code)
}

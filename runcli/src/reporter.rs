//! Operator-facing progress reporting.
//!
//! Sessions and the orchestrator never reach for a global logger directly
//! for run events; they are handed a [`Reporter`]. [`LogReporter`] forwards
//! to the `log` facade, tests substitute a recorder.

use log::{debug, error, info, warn};

use crate::batch::RunReport;
use crate::error::{Error, LogError};
use crate::login::ConnectedVia;

/// Receiver for per-host run events.
pub trait Reporter: Send + Sync {
    /// Work on `host` is starting.
    fn host_started(&self, host: &str);

    /// Login finished and the session is ready.
    fn connected(&self, host: &str, via: ConnectedVia);

    /// A command is about to be written.
    fn command_sent(&self, host: &str, command: &str);

    /// Output collected for a batch.
    fn output(&self, host: &str, output: &str);

    /// A log file could not be used. The session carries on without it.
    fn log_unavailable(&self, host: &str, error: &LogError);

    /// The host failed and was added to the failed-host list.
    fn host_failed(&self, host: &str, error: &Error);

    /// The host's session was torn down.
    fn host_closed(&self, host: &str);

    /// The run is complete.
    fn run_finished(&self, report: &RunReport);
}

/// Default reporter: everything goes to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn host_started(&self, host: &str) {
        debug!("Processing {}", host);
    }

    fn connected(&self, host: &str, via: ConnectedVia) {
        debug!("{} ready ({:?})", host, via);
    }

    fn command_sent(&self, host: &str, command: &str) {
        info!("{}: Executing: {}", host, command);
    }

    fn output(&self, host: &str, output: &str) {
        debug!("{}:\n{}", host, output);
    }

    fn log_unavailable(&self, host: &str, error: &LogError) {
        error!("{}: {}", host, error);
        error!("Continuing to execute without log");
    }

    fn host_failed(&self, host: &str, error: &Error) {
        error!("{}: {}", host, error);
    }

    fn host_closed(&self, host: &str) {
        info!("Closing connection to {}", host);
    }

    fn run_finished(&self, report: &RunReport) {
        for host in report.failed_hosts() {
            error!("Could not connect to {}", host);
        }
        if report.interrupted() {
            warn!(
                "Run interrupted; {} host(s) not attempted",
                report.not_attempted().len()
            );
        }
    }
}

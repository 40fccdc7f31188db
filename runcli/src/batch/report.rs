//! Per-host results and the run summary.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{BatchError, DriverError, Error, LoginError, PlatformError};

/// What a host produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Host name or address.
    pub host: String,

    /// Device type the host was driven as.
    pub device_type: String,

    /// Output of every completed command, concatenated in order. On a
    /// failed batch, whatever was read before the failure.
    pub raw_output: String,

    /// Files written in per-command mode, in command order.
    pub per_command_files: Vec<PathBuf>,

    /// Session transcript, if logging was available.
    pub transcript: Option<PathBuf>,

    /// Whether every command completed.
    pub succeeded: bool,
}

/// Why a host failed, coarsely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UnsupportedDeviceType,
    NoCommandsDefined,
    MissingDeviceType,
    Connect,
    LoginTimeout,
    BadCredentials,
    HostKeyChanged,
    ConnectionClosed,
    CommandTimeout,
    Interrupted,
    Other,
}

impl FailureKind {
    /// Classify an error.
    pub fn of(error: &Error) -> Self {
        match error {
            Error::Platform(PlatformError::UnsupportedDeviceType { .. }) => Self::UnsupportedDeviceType,
            Error::Batch(BatchError::NoCommandsDefined { .. }) => Self::NoCommandsDefined,
            Error::Batch(BatchError::MissingDeviceType { .. }) => Self::MissingDeviceType,
            Error::Batch(BatchError::Interrupted { .. }) => Self::Interrupted,
            Error::Transport(_) => Self::Connect,
            Error::Login(LoginError::Timeout { .. }) => Self::LoginTimeout,
            Error::Login(LoginError::BadCredentials { .. }) => Self::BadCredentials,
            Error::Login(LoginError::HostKeyChanged { .. }) => Self::HostKeyChanged,
            Error::Login(LoginError::Closed { .. })
            | Error::Driver(DriverError::Disconnected { .. }) => Self::ConnectionClosed,
            Error::Driver(DriverError::CommandTimeout { .. }) => Self::CommandTimeout,
            _ => Self::Other,
        }
    }
}

/// A recorded host failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a whole run.
///
/// A host is in at most one of: succeeded, failed, not attempted. Failure
/// wins if a host shows up more than once.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    results: Vec<ExecutionResult>,
    failed: IndexMap<String, HostFailure>,
    not_attempted: Vec<String>,
    interrupted: bool,
}

impl RunReport {
    /// Record a host that ran every command.
    pub fn record_success(&mut self, result: ExecutionResult) {
        self.results.push(result);
    }

    /// Record a failed host, keeping its partial result if there is one.
    ///
    /// The first failure recorded for a host is the one kept.
    pub fn record_failure(&mut self, host: &str, error: &Error, partial: Option<ExecutionResult>) {
        if let Some(result) = partial {
            self.results.push(result);
        }
        self.failed
            .entry(host.to_string())
            .or_insert_with(|| HostFailure {
                kind: FailureKind::of(error),
                message: error.to_string(),
            });
    }

    pub(crate) fn record_not_attempted(&mut self, host: String) {
        self.not_attempted.push(host);
    }

    /// Put results in the order their hosts appear in `plan`.
    pub(crate) fn order_results(&mut self, plan: &[String]) {
        let position = |host: &str| plan.iter().position(|h| h == host).unwrap_or(usize::MAX);
        self.results.sort_by_key(|r| position(&r.host));
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Check if anything is known about `host`.
    pub fn contains(&self, host: &str) -> bool {
        self.failed.contains_key(host) || self.results.iter().any(|r| r.host == host)
    }

    /// Every result, successful or partial. After a run, in plan order.
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// The last result recorded for `host`.
    pub fn result(&self, host: &str) -> Option<&ExecutionResult> {
        self.results.iter().rev().find(|r| r.host == host)
    }

    /// Hosts that ran every command and never failed.
    pub fn succeeded_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = Vec::new();
        for result in &self.results {
            if result.succeeded
                && !self.failed.contains_key(&result.host)
                && !hosts.contains(&result.host.as_str())
            {
                hosts.push(&result.host);
            }
        }
        hosts
    }

    /// Failed hosts, in the order they failed.
    pub fn failed_hosts(&self) -> impl Iterator<Item = &str> {
        self.failed.keys().map(String::as_str)
    }

    /// Failure recorded for `host`.
    pub fn failure(&self, host: &str) -> Option<&HostFailure> {
        self.failed.get(host)
    }

    /// Check if `host` failed.
    pub fn is_failed(&self, host: &str) -> bool {
        self.failed.contains_key(host)
    }

    /// Hosts never started because the run was interrupted.
    pub fn not_attempted(&self) -> &[String] {
        &self.not_attempted
    }

    /// Whether the run was cut short.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// No failures and no interruption.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(host: &str, succeeded: bool) -> ExecutionResult {
        ExecutionResult {
            host: host.to_string(),
            device_type: "arista".to_string(),
            succeeded,
            ..Default::default()
        }
    }

    fn unsupported() -> Error {
        PlatformError::UnsupportedDeviceType {
            device_type: "ios-xr".to_string(),
        }
        .into()
    }

    #[test]
    fn test_failure_wins_over_success() {
        let mut report = RunReport::default();
        report.record_success(result("sw1", true));
        report.record_failure("sw1", &unsupported(), None);
        report.record_success(result("sw2", true));

        assert_eq!(report.succeeded_hosts(), ["sw2"]);
        assert_eq!(report.failed_hosts().collect::<Vec<_>>(), ["sw1"]);
        assert!(!report.is_success());
    }

    #[test]
    fn test_first_failure_kept() {
        let mut report = RunReport::default();
        report.record_failure("sw1", &unsupported(), None);
        let interrupted: Error = BatchError::Interrupted {
            host: "sw1".to_string(),
        }
        .into();
        report.record_failure("sw1", &interrupted, None);

        let failure = report.failure("sw1").unwrap();
        assert_eq!(failure.kind, FailureKind::UnsupportedDeviceType);
        assert_eq!(failure.message, "Platform error: ios-xr not yet supported");
        assert_eq!(report.failed_hosts().count(), 1);
    }

    #[test]
    fn test_partial_result_kept_for_failed_host() {
        let mut report = RunReport::default();
        let error: Error = DriverError::CommandTimeout {
            command: "show tech".to_string(),
            timeout: std::time::Duration::from_secs(180),
            partial_output: "page 1".to_string(),
        }
        .into();
        let mut partial = result("sw1", false);
        partial.raw_output = "page 1".to_string();
        report.record_failure("sw1", &error, Some(partial));

        assert!(report.succeeded_hosts().is_empty());
        assert_eq!(report.result("sw1").unwrap().raw_output, "page 1");
        assert_eq!(report.failure("sw1").unwrap().kind, FailureKind::CommandTimeout);
        assert!(report.contains("sw1"));
        assert!(!report.contains("sw2"));
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = RunReport::default();
        assert!(report.is_success());
        assert!(!report.interrupted());
        assert!(report.not_attempted().is_empty());
    }
}

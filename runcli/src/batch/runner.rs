//! Running one host: connect, log in, send commands, close.

use std::future::Future;
use std::path::Path;
use std::slice;
use std::sync::Arc;

use log::debug;

use super::inventory::HostTarget;
use super::report::ExecutionResult;
use super::sanitize::sanitize_output_name;
use crate::driver::{Session, SessionBuilder, SessionOptions};
use crate::error::{Error, Result};
use crate::logging::LogLayout;
use crate::platform::ProfileTable;
use crate::reporter::Reporter;
use crate::transport::{Connector, Credentials, Transport};

/// How command output is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// All commands as one batch; the transcript is the only log.
    #[default]
    Combined,

    /// One batch per command, each written to its own output file.
    PerCommand,
}

/// Result of running one host.
#[derive(Debug)]
pub enum HostOutcome {
    /// Every command completed.
    Succeeded(ExecutionResult),

    /// The host failed. `partial` holds whatever was collected first.
    Failed {
        error: Error,
        partial: Option<ExecutionResult>,
    },
}

impl HostOutcome {
    /// Failure with nothing collected.
    pub fn failed(error: impl Into<Error>) -> Self {
        Self::Failed {
            error: error.into(),
            partial: None,
        }
    }
}

/// Something that can process a single host.
///
/// The orchestrator only schedules; everything host-specific happens
/// behind this trait.
pub trait HostRunner: Send + Sync {
    /// Process `target` to completion. Must release every resource it
    /// acquired before returning, or when the future is dropped.
    fn run(&self, target: HostTarget) -> impl Future<Output = HostOutcome> + Send;
}

/// Runs hosts over real sessions.
pub struct SessionRunner<C> {
    connector: C,
    profiles: ProfileTable,
    credentials: Credentials,
    options: SessionOptions,
    logs: Option<LogLayout>,
    mode: OutputMode,
    reporter: Arc<dyn Reporter>,
}

impl<C: Connector> SessionRunner<C> {
    /// Create a runner using the built-in profile table.
    pub fn new(
        connector: C,
        credentials: Credentials,
        options: SessionOptions,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            connector,
            profiles: ProfileTable::builtin().clone(),
            credentials,
            options,
            logs: None,
            mode: OutputMode::default(),
            reporter,
        }
    }

    /// Write transcripts and output files under `logs`.
    pub fn with_logs(mut self, logs: LogLayout) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Choose how output is written.
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the profile table.
    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = profiles;
        self
    }

    /// The connector in use.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Log layout, if logging is enabled.
    pub fn logs(&self) -> Option<&LogLayout> {
        self.logs.as_ref()
    }

    async fn open(&self, target: &HostTarget) -> Result<Session<C::Transport>> {
        let profile = self.profiles.lookup(&target.device_type)?.clone();
        let transport = self.connector.connect(&target.host)?;

        let mut builder = SessionBuilder::new(target.host.as_str(), profile)
            .options(self.options.clone())
            .reporter(Arc::clone(&self.reporter));
        if let Some(logs) = &self.logs {
            builder = builder.logs(logs.clone());
        }
        builder.open(transport, &self.credentials).await
    }
}

impl<C: Connector> HostRunner for SessionRunner<C> {
    async fn run(&self, target: HostTarget) -> HostOutcome {
        let mut session = match self.open(&target).await {
            Ok(session) => session,
            Err(error) => return HostOutcome::failed(error),
        };

        let mut result = ExecutionResult {
            host: target.host.clone(),
            device_type: target.device_type.clone(),
            transcript: session.transcript_path().map(Path::to_path_buf),
            ..Default::default()
        };

        let sent = match self.mode {
            OutputMode::Combined => send_combined(&mut session, &target.commands, &mut result).await,
            OutputMode::PerCommand => send_each(&mut session, &target.commands, &mut result).await,
        };
        session.close();

        match sent {
            Ok(()) => {
                debug!("{}: all commands completed", target.host);
                result.succeeded = true;
                HostOutcome::Succeeded(result)
            }
            Err(error) => HostOutcome::Failed {
                error,
                partial: Some(result),
            },
        }
    }
}

async fn send_combined<T: Transport>(
    session: &mut Session<T>,
    commands: &[String],
    result: &mut ExecutionResult,
) -> Result<()> {
    match session.send(commands, None).await {
        Ok(batch) => {
            result.raw_output = batch.output;
            Ok(())
        }
        Err(error) => {
            keep_partial(&error, result);
            Err(error)
        }
    }
}

async fn send_each<T: Transport>(
    session: &mut Session<T>,
    commands: &[String],
    result: &mut ExecutionResult,
) -> Result<()> {
    for command in commands.iter().filter(|c| !c.is_empty()) {
        let name = sanitize_output_name(command);
        match session.send(slice::from_ref(command), Some(&name)).await {
            Ok(batch) => {
                result.raw_output.push_str(&batch.output);
                result.per_command_files.extend(batch.output_file);
            }
            Err(error) => {
                keep_partial(&error, result);
                return Err(error);
            }
        }
    }
    Ok(())
}

fn keep_partial(error: &Error, result: &mut ExecutionResult) {
    if let Error::Driver(e) = error {
        if let Some(partial) = e.partial_output() {
            result.raw_output.push_str(partial);
        }
    }
}

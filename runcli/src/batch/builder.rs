//! Run options and the orchestrator builder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::warn;
use serde::{Deserialize, Deserializer};

use super::orchestrator::{Orchestrator, Schedule};
use super::runner::{OutputMode, SessionRunner};
use crate::channel::ChannelConfig;
use crate::driver::SessionOptions;
use crate::error::Result;
use crate::logging::LogLayout;
use crate::platform::ProfileTable;
use crate::reporter::{LogReporter, Reporter};
use crate::transport::{ConnectMethod, Connector, Credentials, SshCommand, SshConnector};

/// Settings for one run.
///
/// Deserialises from any serde format. Durations are given in seconds and
/// may be fractional:
///
/// ```
/// use runcli::batch::RunOptions;
///
/// let options: RunOptions = serde_json::from_str(r#"{
///     "username": "netops",
///     "command_timeout": 60,
///     "send_delay": 0.05,
///     "concurrency": 4
/// }"#).unwrap();
/// assert_eq!(options.command_timeout.as_secs(), 60);
/// assert_eq!(options.login_timeout.as_secs(), 30);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Login username; defaults to the invoking user.
    pub username: String,

    /// Private key file. When set, no password is used.
    pub ssh_key: Option<PathBuf>,

    /// Connection method. Only `ssh` is supported.
    pub method: String,

    /// Wait for the prompt after each command.
    #[serde(deserialize_with = "seconds")]
    pub command_timeout: Duration,

    /// Wait for each step of the login handshake.
    #[serde(deserialize_with = "seconds")]
    pub login_timeout: Duration,

    /// Pause before each write to the device.
    #[serde(deserialize_with = "seconds")]
    pub send_delay: Duration,

    /// Log directory; `~/logs` when unset.
    pub log_dir: Option<PathBuf>,

    /// Write each command's output to its own file.
    pub write_individual_files: bool,

    /// Hosts processed at once.
    pub concurrency: usize,

    /// ssh client to spawn.
    pub ssh_program: String,

    /// Remote port, passed as `-p`.
    pub port: Option<u16>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            username: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_default(),
            ssh_key: None,
            method: "ssh".to_string(),
            command_timeout: Duration::from_secs(180),
            login_timeout: Duration::from_secs(30),
            send_delay: Duration::from_millis(25),
            log_dir: None,
            write_individual_files: false,
            concurrency: 1,
            ssh_program: "ssh".to_string(),
            port: None,
        }
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Builder for an [`Orchestrator`] over ssh sessions.
///
/// # Example
///
/// ```rust,no_run
/// use runcli::batch::{HostPlan, OrchestratorBuilder};
///
/// # async fn example() -> Result<(), runcli::Error> {
/// let orchestrator = OrchestratorBuilder::new("admin")
///     .password("secret")
///     .write_individual_files(true)
///     .concurrency(4)
///     .build()?;
///
/// let plan = HostPlan::uniform(["sw1", "sw2"], "arista", ["show version"]);
/// let report = orchestrator.run(&plan).await;
/// for host in report.failed_hosts() {
///     eprintln!("{host} failed");
/// }
/// # Ok(())
/// # }
/// ```
pub struct OrchestratorBuilder {
    options: RunOptions,
    password: Option<String>,
    logging: bool,
    reporter: Arc<dyn Reporter>,
    profiles: Option<ProfileTable>,
}

impl OrchestratorBuilder {
    /// Start from default options for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self::from_options(RunOptions {
            username: username.into(),
            ..Default::default()
        })
    }

    /// Start from loaded options.
    pub fn from_options(options: RunOptions) -> Self {
        Self {
            options,
            password: None,
            logging: true,
            reporter: Arc::new(LogReporter),
            profiles: None,
        }
    }

    /// Use password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Use private key authentication. Takes precedence over a password.
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.ssh_key = Some(path.into());
        self
    }

    /// Set the connection method by name.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.options.method = method.into();
        self
    }

    /// Set the per-command timeout (default: 180 seconds).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Set the login timeout (default: 30 seconds).
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.options.login_timeout = timeout;
        self
    }

    /// Set the pause before each write (default: 25 ms).
    pub fn send_delay(mut self, delay: Duration) -> Self {
        self.options.send_delay = delay;
        self
    }

    /// Set the log directory.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.log_dir = Some(dir.into());
        self
    }

    /// Write no log files at all.
    pub fn without_logs(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Write each command's output to its own file.
    pub fn write_individual_files(mut self, enabled: bool) -> Self {
        self.options.write_individual_files = enabled;
        self
    }

    /// Process up to `limit` hosts at once (default: 1).
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.options.concurrency = limit;
        self
    }

    /// Spawn a different ssh client.
    pub fn ssh_program(mut self, program: impl Into<String>) -> Self {
        self.options.ssh_program = program.into();
        self
    }

    /// Connect to a non-default port.
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = Some(port);
        self
    }

    /// Send run events somewhere other than the `log` facade.
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the built-in profile table.
    pub fn profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Build an orchestrator that spawns the ssh client for each host.
    pub fn build(self) -> Result<Orchestrator<SessionRunner<SshConnector>>> {
        let credentials = self.credentials()?;
        let mut command = SshCommand::new(&credentials);
        command.program = self.options.ssh_program.clone();
        command.port = self.options.port;
        self.assemble(SshConnector::new(command), credentials)
    }

    /// Build an orchestrator over a custom connector.
    pub fn build_with<C: Connector>(self, connector: C) -> Result<Orchestrator<SessionRunner<C>>> {
        let credentials = self.credentials()?;
        self.assemble(connector, credentials)
    }

    fn credentials(&self) -> Result<Credentials> {
        self.options.method.parse::<ConnectMethod>()?;

        let credentials = Credentials::from_parts(
            self.options.username.clone(),
            self.password.clone(),
            self.options.ssh_key.clone(),
        )?;
        if let Err(e) = credentials.check_private_key() {
            warn!("{}", e);
            warn!("Continuing; ssh may still reject the key");
        }
        Ok(credentials)
    }

    fn assemble<C: Connector>(
        self,
        connector: C,
        credentials: Credentials,
    ) -> Result<Orchestrator<SessionRunner<C>>> {
        let options = SessionOptions {
            login_timeout: self.options.login_timeout,
            command_timeout: self.options.command_timeout,
            channel: ChannelConfig {
                send_delay: self.options.send_delay,
                ..Default::default()
            },
        };
        let mode = if self.options.write_individual_files {
            OutputMode::PerCommand
        } else {
            OutputMode::Combined
        };

        let mut runner = SessionRunner::new(connector, credentials, options, Arc::clone(&self.reporter))
            .with_output_mode(mode);
        if self.logging {
            let dir = self.options.log_dir.unwrap_or_else(LogLayout::default_dir);
            let layout = LogLayout::new(dir, &Local::now());
            if let Err(e) = layout.ensure_dir() {
                warn!("{}", e);
            }
            runner = runner.with_logs(layout);
        }
        if let Some(profiles) = self.profiles {
            runner = runner.with_profiles(profiles);
        }

        Ok(Orchestrator::new(runner, self.reporter).with_schedule(Schedule::with_limit(self.options.concurrency)))
    }
}

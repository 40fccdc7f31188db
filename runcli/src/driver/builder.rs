//! Builder for opening sessions.

use std::sync::Arc;
use std::time::Duration;

use super::session::{Session, SessionOptions};
use crate::channel::ChannelConfig;
use crate::error::Result;
use crate::logging::LogLayout;
use crate::platform::DeviceProfile;
use crate::reporter::{LogReporter, Reporter};
use crate::transport::{Credentials, Transport};

/// Builder for constructing a [`Session`].
///
/// # Example
///
/// ```rust,no_run
/// use runcli::driver::SessionBuilder;
/// use runcli::platform::ProfileTable;
/// use runcli::transport::{Connector, Credentials, SshCommand, SshConnector};
///
/// # async fn example() -> Result<(), runcli::Error> {
/// let credentials = Credentials::password("admin", "secret");
/// let connector = SshConnector::new(SshCommand::new(&credentials));
/// let profile = ProfileTable::builtin().lookup("arista")?.clone();
///
/// let mut session = SessionBuilder::new("sw1", profile)
///     .open(connector.connect("sw1")?, &credentials)
///     .await?;
/// let batch = session.send(&["show version".to_string()], None).await?;
/// println!("{}", batch.output);
/// session.close();
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    profile: DeviceProfile,
    options: SessionOptions,
    logs: Option<LogLayout>,
    reporter: Arc<dyn Reporter>,
}

impl SessionBuilder {
    /// Create a new session builder for `host` using `profile`.
    pub fn new(host: impl Into<String>, profile: DeviceProfile) -> Self {
        Self {
            host: host.into(),
            profile,
            options: SessionOptions::default(),
            logs: None,
            reporter: Arc::new(LogReporter),
        }
    }

    /// Replace all session options.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the login timeout (default: 30s).
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.options.login_timeout = timeout;
        self
    }

    /// Set the per-command timeout (default: 180s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Set the channel configuration.
    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.options.channel = channel;
        self
    }

    /// Log the transcript and batch output files under `logs`.
    pub fn logs(mut self, logs: LogLayout) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Report progress to `reporter` instead of the `log` facade.
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Log in over `transport`.
    pub async fn open<T: Transport>(self, transport: T, credentials: &Credentials) -> Result<Session<T>> {
        Session::open(
            transport,
            self.host,
            self.profile,
            credentials,
            &self.options,
            self.logs,
            self.reporter,
        )
        .await
    }
}

//! One authenticated session to one host.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::warn;
use regex::bytes::Regex;

use crate::channel::{ChannelConfig, PatternSet, PtyChannel};
use crate::error::Result;
use crate::logging::LogLayout;
use crate::login::{self, ConnectedVia};
use crate::platform::DeviceProfile;
use crate::reporter::Reporter;
use crate::transport::{Credentials, Transport};

/// Timeouts and channel settings for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on each read during login.
    pub login_timeout: Duration,

    /// Bound on the wait for the prompt after each command.
    pub command_timeout: Duration,

    /// Channel behavior.
    pub channel: ChannelConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            login_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(180),
            channel: ChannelConfig::default(),
        }
    }
}

/// An authenticated, prompt-ready session.
///
/// The session exclusively owns its transport and transcript. Both are
/// released exactly once: by [`close`](Self::close), by a failed login, or
/// on drop if the owner is cancelled mid-operation.
pub struct Session<T: Transport> {
    pub(super) host: String,
    pub(super) profile: DeviceProfile,
    pub(super) prompt: PatternSet<()>,
    pub(super) channel: PtyChannel<T>,
    pub(super) logs: Option<LogLayout>,
    pub(super) command_timeout: Duration,
    pub(super) reporter: Arc<dyn Reporter>,
    started_at: DateTime<Local>,
    connected_via: Option<ConnectedVia>,
    closed: bool,
}

impl<T: Transport> Session<T> {
    /// Wrap `transport` and run the login handshake.
    ///
    /// On failure the transport and transcript are already released when
    /// this returns.
    pub(super) async fn open(
        transport: T,
        host: String,
        profile: DeviceProfile,
        credentials: &Credentials,
        options: &SessionOptions,
        logs: Option<LogLayout>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let transcript = match logs.as_ref().map(|l| l.open_transcript(&host)) {
            Some(Ok(transcript)) => Some(transcript),
            Some(Err(e)) => {
                reporter.log_unavailable(&host, &e);
                None
            }
            None => None,
        };

        let prompt = PatternSet::new().with((), profile.prompt.clone());
        let hook_reporter = Arc::clone(&reporter);
        let hook_host = host.clone();
        let channel = PtyChannel::new(transport, &options.channel, transcript).on_log_failure(
            Box::new(move |e| hook_reporter.log_unavailable(&hook_host, e)),
        );

        let mut session = Self {
            host,
            profile,
            prompt,
            channel,
            logs,
            command_timeout: options.command_timeout,
            reporter,
            started_at: Local::now(),
            connected_via: None,
            closed: false,
        };

        match login::login(
            &mut session.channel,
            &session.host,
            &session.profile,
            credentials,
            options.login_timeout,
        )
        .await
        {
            Ok(via) => {
                session.connected_via = Some(via);
                session.reporter.connected(&session.host, via);
                Ok(session)
            }
            Err(e) => {
                session.close();
                Err(e)
            }
        }
    }

    /// Host this session is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Device profile in use.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Prompt pattern commands wait for.
    pub fn prompt_pattern(&self) -> &Regex {
        &self.profile.prompt
    }

    /// When the session was created.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// How login completed.
    pub fn connected_via(&self) -> Option<ConnectedVia> {
        self.connected_via
    }

    /// Transcript file, if logging is active.
    pub fn transcript_path(&self) -> Option<&Path> {
        self.channel.transcript_path()
    }

    /// Check if the session has not been torn down yet.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Terminate the transport and close the transcript.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.channel.close() {
            warn!("{}: error closing session: {}", self.host, e);
        }
        self.reporter.host_closed(&self.host);
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("session to {} dropped before close; tearing down", self.host);
            self.teardown();
        }
    }
}

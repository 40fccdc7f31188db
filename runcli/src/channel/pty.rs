//! Expect-style channel over an interactive transport.

use std::path::Path;
use std::time::Duration;

use log::{trace, warn};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::PatternSet;
use crate::error::{DriverError, LogError, Result};
use crate::logging::Transcript;
use crate::transport::Transport;

/// Configuration for channel behavior.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Pause before every write; some devices drop input typed too early.
    pub send_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            search_depth: 1000,
            send_delay: Duration::from_millis(25),
        }
    }
}

/// Outcome of [`PtyChannel::expect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect<K> {
    /// A candidate matched. `before` is the consumed output preceding it.
    Matched {
        key: K,
        before: String,
        matched: String,
    },

    /// Nothing matched before the deadline. The unconsumed output is
    /// returned but left in the buffer.
    Timeout { before: String },

    /// The remote side closed the stream. All buffered output is returned.
    Eof { before: String },
}

/// Called when the transcript stops being writable.
pub type LogFailureHook = Box<dyn Fn(&LogError) + Send + Sync>;

/// Interactive channel: writes lines, reads output, matches patterns.
///
/// Every byte read is tee'd to the transcript (if one is attached) before
/// it is searched, so a failed login still leaves a usable log.
pub struct PtyChannel<T> {
    transport: T,
    buffer: PatternBuffer,
    transcript: Option<Transcript>,
    on_log_failure: Option<LogFailureHook>,
    send_delay: Duration,
    open: bool,
}

impl<T: Transport> PtyChannel<T> {
    /// Wrap a freshly connected transport.
    pub fn new(transport: T, config: &ChannelConfig, transcript: Option<Transcript>) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::new(config.search_depth),
            transcript,
            on_log_failure: None,
            send_delay: config.send_delay,
            open: true,
        }
    }

    /// Report transcript failures through `hook` instead of the log.
    pub fn on_log_failure(mut self, hook: LogFailureHook) -> Self {
        self.on_log_failure = Some(hook);
        self
    }

    /// Send a line of text followed by a newline.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        if !self.open {
            return Err(DriverError::NotConnected.into());
        }
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.transport.send(&data).await
    }

    /// Read until one of `patterns` matches or `timeout` elapses.
    pub async fn expect<K: Copy>(
        &mut self,
        patterns: &PatternSet<K>,
        timeout: Duration,
    ) -> Result<Expect<K>> {
        if !self.open {
            return Err(DriverError::NotConnected.into());
        }
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(m) = self.buffer.search_tail(patterns) {
                let (before, matched) = self.buffer.consume_match(&m);
                return Ok(Expect::Matched {
                    key: m.key,
                    before: String::from_utf8_lossy(&before).into_owned(),
                    matched: String::from_utf8_lossy(&matched).into_owned(),
                });
            }

            let chunk = match tokio::time::timeout_at(deadline, self.transport.recv()).await {
                Err(_) => {
                    return Ok(Expect::Timeout {
                        before: self.buffer.as_str_lossy().into_owned(),
                    });
                }
                Ok(result) => result?,
            };

            let Some(chunk) = chunk else {
                let rest = self.buffer.take();
                return Ok(Expect::Eof {
                    before: String::from_utf8_lossy(&rest).into_owned(),
                });
            };

            trace!("read {} bytes, buffered {}", chunk.len(), self.buffer.len());
            self.record(&chunk);
            self.buffer.extend(&chunk);
        }
    }

    fn record(&mut self, data: &[u8]) {
        if let Some(transcript) = self.transcript.as_mut() {
            if let Err(e) = transcript.record(data) {
                self.transcript = None;
                self.log_failed(&e);
            }
        }
    }

    fn log_failed(&self, error: &LogError) {
        match &self.on_log_failure {
            Some(hook) => hook(error),
            None => warn!("{}; continuing without transcript", error),
        }
    }

    /// Path of the attached transcript, if any.
    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript.as_ref().map(Transcript::path)
    }

    /// Check if the channel is still open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Terminate the transport and flush the transcript.
    ///
    /// A transcript flush failure goes to the log-failure hook; only
    /// transport errors are returned.
    ///
    /// Safe to call more than once; only the first call does anything.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        if let Some(transcript) = self.transcript.take() {
            if let Err(e) = transcript.finish() {
                self.log_failed(&e);
            }
        }
        self.transport.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::ScriptedTransport;
    use regex::bytes::Regex;
    use tokio_test::{assert_err, assert_ok};

    fn config() -> ChannelConfig {
        ChannelConfig {
            search_depth: 1000,
            send_delay: Duration::ZERO,
        }
    }

    fn prompt() -> PatternSet<()> {
        PatternSet::new().with((), Regex::new(r"router#$").unwrap())
    }

    #[tokio::test]
    async fn test_expect_across_chunks() {
        let transport = ScriptedTransport::new(["uptime 3 da", "ys\r\nrou", "ter#"]);
        let mut channel = PtyChannel::new(transport, &config(), None);

        let outcome = channel
            .expect(&prompt(), Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Expect::Matched {
                key: (),
                before: "uptime 3 days\r\n".to_string(),
                matched: "router#".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_returns_partial_output() {
        let transport = ScriptedTransport::new(["partial output"]);
        let mut channel = PtyChannel::new(transport, &config(), None);

        let outcome = channel
            .expect(&prompt(), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Expect::Timeout {
                before: "partial output".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_eof() {
        let transport = ScriptedTransport::new(["Connection closed"]).with_eof();
        let mut channel = PtyChannel::new(transport, &config(), None);

        let outcome = channel
            .expect(&prompt(), Duration::from_millis(200))
            .await
            .unwrap();
        assert!(matches!(outcome, Expect::Eof { before } if before == "Connection closed"));
    }

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let transport = ScriptedTransport::new(Vec::<&str>::new());
        let written = transport.written();
        let mut channel = PtyChannel::new(transport, &config(), None);

        assert_ok!(channel.send_line("show version\r").await);
        assert_eq!(written.lines(), ["show version\r"]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_transcript_write_failure_reported() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let transcript = Transcript::create("/dev/full").unwrap();
        let failures = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&failures);
        let transport = ScriptedTransport::new(["router#"]);
        let mut channel = PtyChannel::new(transport, &config(), Some(transcript)).on_log_failure(
            Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let outcome = channel
            .expect(&prompt(), Duration::from_millis(200))
            .await
            .unwrap();
        assert!(matches!(outcome, Expect::Matched { .. }));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(channel.transcript_path().is_none());

        assert_ok!(channel.close());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_once() {
        let transport = ScriptedTransport::new(Vec::<&str>::new());
        let closes = transport.closes();
        let mut channel = PtyChannel::new(transport, &config(), None);

        assert_ok!(channel.close());
        assert_ok!(channel.close());
        assert_eq!(closes.count(), 1);
        assert!(!channel.is_open());
        assert_err!(channel.send_line("show version").await);
        assert_err!(channel.expect(&prompt(), Duration::from_millis(10)).await);
    }
}

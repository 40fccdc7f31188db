//! Command batches over an open session.

use std::path::PathBuf;

use log::{debug, error};

use super::session::Session;
use crate::channel::Expect;
use crate::error::{DriverError, Result};
use crate::transport::Transport;

/// Output of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    /// Everything read before each prompt, concatenated in command order.
    /// Command echoes and prompt fragments are kept exactly as sent by the
    /// device.
    pub output: String,

    /// Number of commands that completed.
    pub commands_run: usize,

    /// Output file written for this batch, if one was requested and could
    /// be written.
    pub output_file: Option<PathBuf>,
}

impl<T: Transport> Session<T> {
    /// Send `commands` in order, waiting for the prompt after each.
    ///
    /// Empty entries are skipped. The first command whose prompt does not
    /// come back within the command timeout aborts the batch with
    /// [`DriverError::CommandTimeout`], carrying everything read so far.
    ///
    /// When `output_name` is given, the accumulated output is written once
    /// to `<host>_<output_name>_<stamp>.txt` after the batch, or after the
    /// failure if it is cut short.
    pub async fn send(&mut self, commands: &[String], output_name: Option<&str>) -> Result<BatchOutput> {
        if !self.is_open() {
            return Err(DriverError::NotConnected.into());
        }

        let mut batch = BatchOutput::default();

        for command in commands {
            if command.is_empty() {
                continue;
            }

            self.reporter.command_sent(&self.host, command);
            self.channel
                .send_line(&self.profile.command_line(command))
                .await?;

            match self.channel.expect(&self.prompt, self.command_timeout).await? {
                Expect::Matched { before, .. } => {
                    batch.output.push_str(&before);
                    batch.commands_run += 1;
                }
                Expect::Timeout { before } => {
                    batch.output.push_str(&before);
                    error!("{}: no prompt after '{}'", self.host, command);
                    self.persist(output_name, &batch.output);
                    return Err(DriverError::CommandTimeout {
                        command: command.clone(),
                        timeout: self.command_timeout,
                        partial_output: batch.output,
                    }
                    .into());
                }
                Expect::Eof { before } => {
                    batch.output.push_str(&before);
                    self.persist(output_name, &batch.output);
                    return Err(DriverError::Disconnected {
                        command: command.clone(),
                        partial_output: batch.output,
                    }
                    .into());
                }
            }
        }

        batch.output_file = self.persist(output_name, &batch.output);
        self.reporter.output(&self.host, &batch.output);
        debug!("{}: {} command(s) completed", self.host, batch.commands_run);
        Ok(batch)
    }

    /// Write the batch output file, reporting (not failing on) errors.
    fn persist(&self, output_name: Option<&str>, output: &str) -> Option<PathBuf> {
        let name = output_name?;
        let logs = self.logs.as_ref()?;
        match logs.write_output(&self.host, name, output) {
            Ok(path) => Some(path),
            Err(e) => {
                self.reporter.log_unavailable(&self.host, &e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::Error;
    use crate::driver::{SessionBuilder, SessionOptions};
    use crate::channel::ChannelConfig;
    use crate::logging::LogLayout;
    use crate::platform::ProfileTable;
    use crate::reporter::recording::RecordingReporter;
    use crate::transport::Credentials;
    use crate::transport::mock::ScriptedTransport;

    fn options() -> SessionOptions {
        SessionOptions {
            login_timeout: Duration::from_millis(100),
            command_timeout: Duration::from_millis(100),
            channel: ChannelConfig {
                search_depth: 1000,
                send_delay: Duration::ZERO,
            },
        }
    }

    fn layout(tmp: &TempDir) -> LogLayout {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        LogLayout::new(tmp.path(), &started)
    }

    async fn open(
        device_type: &str,
        transport: ScriptedTransport,
        logs: Option<LogLayout>,
        reporter: Arc<RecordingReporter>,
    ) -> Session<ScriptedTransport> {
        let profile = ProfileTable::builtin().lookup(device_type).unwrap().clone();
        let mut builder = SessionBuilder::new("sw1", profile)
            .options(options())
            .reporter(reporter);
        if let Some(logs) = logs {
            builder = builder.logs(logs);
        }
        builder
            .open(transport, &Credentials::password("admin", "secret"))
            .await
            .unwrap()
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_output_in_order() {
        let transport = ScriptedTransport::new(["sw1#"])
            .respond(["show clock\r\n09:30:00 UTC\r\nsw1#"])
            .respond(["show users\r\nadmin vty0\r\nsw1#"]);
        let written = transport.written();
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("arista", transport, None, reporter.clone()).await;

        let batch = session
            .send(&commands(&["show clock", "", "show users"]), None)
            .await
            .unwrap();

        assert_eq!(batch.commands_run, 2);
        assert_eq!(
            batch.output,
            "show clock\r\n09:30:00 UTC\r\nsw1show users\r\nadmin vty0\r\nsw1"
        );
        assert_eq!(written.lines(), ["show clock", "show users"]);
        assert!(batch.output_file.is_none());
        session.close();
        assert_eq!(reporter.closes("sw1"), 1);
    }

    #[tokio::test]
    async fn test_extra_terminator_appended() {
        let transport = ScriptedTransport::new(["FTOS#"]).respond(["show vlan\r\nFTOS#"]);
        let written = transport.written();
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("force10", transport, None, reporter).await;

        session.send(&commands(&["show vlan"]), None).await.unwrap();
        assert_eq!(written.lines(), ["show vlan\r"]);
        session.close();
    }

    #[tokio::test]
    async fn test_timeout_aborts_remaining_commands() {
        let transport = ScriptedTransport::new(["sw1#"])
            .respond(["one\r\nsw1#"])
            .respond(["two\r\nstill running"])
            .respond(["three\r\nsw1#"]);
        let written = transport.written();
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("arista", transport, None, reporter).await;

        let err = session
            .send(&commands(&["one", "two", "three"]), None)
            .await
            .unwrap_err();
        match err {
            Error::Driver(DriverError::CommandTimeout {
                command,
                partial_output,
                ..
            }) => {
                assert_eq!(command, "two");
                assert_eq!(partial_output, "one\r\nsw1two\r\nstill running");
            }
            other => panic!("expected CommandTimeout, got {other:?}"),
        }
        assert_eq!(written.lines(), ["one", "two"]);
        session.close();
    }

    #[tokio::test]
    async fn test_output_file_written_once() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(["sw1#"]).respond(["show version\r\nEOS\r\nsw1#"]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("arista", transport, Some(layout(&tmp)), reporter).await;

        let batch = session
            .send(&commands(&["show version"]), Some("show_version"))
            .await
            .unwrap();
        let path = batch.output_file.unwrap();
        assert_eq!(
            path,
            tmp.path().join("sw1_show_version_2024-05-01-0930.txt")
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "show version\r\nEOS\r\nsw1\n"
        );

        let transcript = session.transcript_path().unwrap().to_path_buf();
        session.close();
        assert_eq!(
            std::fs::read_to_string(transcript).unwrap(),
            "sw1#show version\r\nEOS\r\nsw1#"
        );
    }

    #[tokio::test]
    async fn test_partial_output_persisted_on_timeout() {
        let tmp = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(["sw1#"]).respond(["show tech\r\npage 1"]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("arista", transport, Some(layout(&tmp)), reporter).await;

        let result = session
            .send(&commands(&["show tech"]), Some("show_tech"))
            .await;
        assert!(result.is_err());
        let path = tmp.path().join("sw1_show_tech_2024-05-01-0930.txt");
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "show tech\r\npage 1\n"
        );
        session.close();
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let transport = ScriptedTransport::new(["sw1#"]);
        let reporter = Arc::new(RecordingReporter::default());
        let mut session = open("arista", transport, None, reporter).await;

        let batch = session.send(&[], None).await.unwrap();
        assert_eq!(batch, BatchOutput::default());
        session.close();
    }
}

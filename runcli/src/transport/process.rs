//! ssh client spawned on a pseudo-terminal.
//!
//! The system ssh client only shows password and host-key prompts on a
//! terminal, so the child runs on a PTY. A reader thread forwards PTY output
//! into an async channel; writes run on the blocking pool so a full PTY
//! buffer never stalls the runtime.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use bytes::Bytes;
use log::{debug, trace, warn};
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;

use super::config::SshCommand;
use super::{Connector, Transport};
use crate::error::{Result, TransportError};

/// A spawned interactive process driven through a PTY.
pub struct PtyTransport {
    /// Keeps the PTY alive; dropping it hangs up the child.
    _master: Box<dyn MasterPty + Send>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    child: Box<dyn Child + Send + Sync>,
    output: mpsc::UnboundedReceiver<Bytes>,
}

impl PtyTransport {
    /// Spawn `program args...` on a new PTY of the given size.
    pub fn spawn(program: &str, args: &[String], width: u16, height: u16) -> Result<Self> {
        let spawn_error = |message: String| TransportError::Spawn {
            program: program.to_string(),
            message,
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: height,
                cols: width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_error(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_error(e.to_string()))?;
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_error(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_error(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name(format!("pty-{program}"))
            .spawn(move || pump(reader, tx))
            .map_err(TransportError::Io)?;

        debug!("spawned {} {:?}", program, args);

        Ok(Self {
            _master: pair.master,
            writer: Arc::new(Mutex::new(writer)),
            child,
            output: rx,
        })
    }
}

/// Forward PTY output until EOF or the receiver goes away.
fn pump(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Bytes>) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                    break;
                }
            }
            Err(e) => {
                // EIO is how Linux reports the slave side closing.
                trace!("pty read ended: {}", e);
                break;
            }
        }
    }
}

impl Transport for PtyTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let writer = Arc::clone(&self.writer);
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut writer = writer
                .lock()
                .map_err(|_| io::Error::other("pty writer poisoned"))?;
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(|e| TransportError::Io(io::Error::other(e)))?
        .map_err(TransportError::Io)?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Bytes>> {
        Ok(self.output.recv().await)
    }

    /// Kill the child if it is still running, then reap it.
    ///
    /// Reaping blocks the calling thread, but only after the kill signal,
    /// so the wait is short.
    fn close(&mut self) -> Result<()> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("ssh already exited: {:?}", status);
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => warn!("could not poll ssh child: {}", e),
        }
        self.child.kill().map_err(TransportError::Io)?;
        if let Err(e) = self.child.wait() {
            warn!("could not reap ssh child: {}", e);
        }
        self.output.close();
        Ok(())
    }
}

/// Connector that spawns one ssh client per host.
#[derive(Debug, Clone)]
pub struct SshConnector {
    command: SshCommand,
}

impl SshConnector {
    /// Create a connector from spawn settings.
    pub fn new(command: SshCommand) -> Self {
        Self { command }
    }

    /// Get the spawn settings.
    pub fn command(&self) -> &SshCommand {
        &self.command
    }
}

impl Connector for SshConnector {
    type Transport = PtyTransport;

    fn connect(&self, host: &str) -> Result<PtyTransport> {
        PtyTransport::spawn(
            &self.command.program,
            &self.command.args(host),
            self.command.terminal_width,
            self.command.terminal_height,
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_and_read_echo() {
        let mut transport =
            PtyTransport::spawn("echo", &["ready#".to_string()], 80, 24).unwrap();

        let mut seen = Vec::new();
        while let Ok(Some(chunk)) =
            tokio::time::timeout(Duration::from_secs(5), transport.recv())
                .await
                .unwrap()
        {
            seen.extend_from_slice(&chunk);
        }
        assert!(String::from_utf8_lossy(&seen).contains("ready#"));
        transport.close().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_reaches_child() {
        let mut transport = PtyTransport::spawn("cat", &[], 80, 24).unwrap();
        transport.send(b"show clock\n").await.unwrap();

        let mut seen = Vec::new();
        while !String::from_utf8_lossy(&seen).contains("show clock") {
            let chunk = tokio::time::timeout(Duration::from_secs(5), transport.recv())
                .await
                .unwrap()
                .unwrap()
                .expect("cat exited early");
            seen.extend_from_slice(&chunk);
        }
        transport.close().unwrap();
    }

    #[test]
    fn test_spawn_missing_program() {
        let result = PtyTransport::spawn("/nonexistent/ssh", &[], 80, 24);
        assert!(result.is_err());
    }
}

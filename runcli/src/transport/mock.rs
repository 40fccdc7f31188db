//! Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::{Connector, Transport};
use crate::error::{Result, TransportError};

/// Lines written to a [`ScriptedTransport`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Written(Arc<Mutex<Vec<String>>>);

impl Written {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Number of times `close()` reached the transport.
#[derive(Debug, Clone, Default)]
pub(crate) struct Closes(Arc<AtomicUsize>);

impl Closes {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replays device output. Initial chunks are available immediately; each
/// written line releases the next scripted response. With nothing left to
/// deliver, `recv` waits forever (or reports EOF if configured).
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    pending: VecDeque<Bytes>,
    responses: VecDeque<Vec<Bytes>>,
    eof: bool,
    written: Written,
    closes: Closes,
}

impl ScriptedTransport {
    pub(crate) fn new<S: AsRef<str>>(initial: impl IntoIterator<Item = S>) -> Self {
        Self {
            pending: initial
                .into_iter()
                .map(|s| Bytes::copy_from_slice(s.as_ref().as_bytes()))
                .collect(),
            ..Default::default()
        }
    }

    /// Queue the output produced by the next written line.
    pub(crate) fn respond<S: AsRef<str>>(mut self, chunks: impl IntoIterator<Item = S>) -> Self {
        self.responses.push_back(
            chunks
                .into_iter()
                .map(|s| Bytes::copy_from_slice(s.as_ref().as_bytes()))
                .collect(),
        );
        self
    }

    /// Report end of stream once all output is delivered.
    pub(crate) fn with_eof(mut self) -> Self {
        self.eof = true;
        self
    }

    pub(crate) fn written(&self) -> Written {
        self.written.clone()
    }

    pub(crate) fn closes(&self) -> Closes {
        self.closes.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let line = String::from_utf8_lossy(data);
        let line = line.strip_suffix('\n').unwrap_or(&line).to_string();
        self.written.0.lock().unwrap().push(line);
        if let Some(response) = self.responses.pop_front() {
            self.pending.extend(response);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Bytes>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        if self.eof {
            return Ok(None);
        }
        std::future::pending().await
    }

    fn close(&mut self) -> Result<()> {
        self.closes.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out pre-built scripted transports by host name.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    scripts: Mutex<HashMap<String, ScriptedTransport>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_host(self, host: &str, transport: ScriptedTransport) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), transport);
        self
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&self, host: &str) -> Result<ScriptedTransport> {
        self.scripts.lock().unwrap().remove(host).ok_or_else(|| {
            TransportError::Spawn {
                program: "ssh".to_string(),
                message: format!("no script for {host}"),
            }
            .into()
        })
    }
}

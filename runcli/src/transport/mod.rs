//! Transport layer: the interactive byte stream a session runs over.
//!
//! The remote-shell protocol itself is not implemented here. A transport is
//! anything that accepts written bytes and yields output chunks, normally
//! the system ssh client spawned on a pseudo-terminal.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod process;

pub use config::{AuthMethod, ConnectMethod, Credentials, SshCommand};
pub use process::{PtyTransport, SshConnector};

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// An interactive, bidirectional byte stream to one host.
pub trait Transport: Send {
    /// Write raw bytes to the remote side.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output. `Ok(None)` means end of stream.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Terminate the remote process and release the stream.
    fn close(&mut self) -> Result<()>;
}

/// Opens a [`Transport`] to a host.
pub trait Connector: Send + Sync {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Start a new transport to `host`.
    fn connect(&self, host: &str) -> Result<Self::Transport>;
}

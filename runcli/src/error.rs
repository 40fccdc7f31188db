//! Error types for runcli.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for runcli operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport errors (spawning or talking to the ssh process)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Login handshake errors
    #[error("Login error: {0}")]
    Login(#[from] LoginError),

    /// Command execution errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Device profile errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Host plan and run errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Log file errors
    #[error("Log error: {0}")]
    Log(#[from] LogError),
}

/// Transport layer errors (process spawn, PTY I/O, credentials).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The ssh child process could not be started
    #[error("Failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    /// Only `ssh` is implemented as a connection method
    #[error("Connection method '{method}' is not supported")]
    UnsupportedMethod { method: String },

    /// Neither a password nor a private key was supplied
    #[error("Invalid credentials for '{user}': {message}")]
    InvalidCredentials { user: String, message: String },

    /// Private key could not be read
    #[error("SSH key error for {path}: {message}")]
    Key { path: PathBuf, message: String },

    /// I/O error on the PTY
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Login handshake failures.
///
/// Each variant carries the output read so far, which is usually the
/// only clue to what the remote ssh client complained about.
#[derive(Error, Debug)]
pub enum LoginError {
    /// No recognised prompt arrived in time
    #[error("Login to {host} timed out after {timeout:?}")]
    Timeout {
        host: String,
        timeout: Duration,
        output: String,
    },

    /// A credential challenge was repeated after the password was sent
    #[error("Device credentials do not work for {host}")]
    BadCredentials { host: String, output: String },

    /// The remote host key does not match known_hosts
    #[error("SSH host key changed for {host}")]
    HostKeyChanged { host: String, output: String },

    /// The ssh process exited before the session was ready
    #[error("Connection to {host} closed during login")]
    Closed { host: String, output: String },
}

impl LoginError {
    /// Output captured before the failure.
    pub fn output(&self) -> &str {
        match self {
            Self::Timeout { output, .. }
            | Self::BadCredentials { output, .. }
            | Self::HostKeyChanged { output, .. }
            | Self::Closed { output, .. } => output,
        }
    }
}

/// Driver layer errors (command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// The device prompt did not come back after a command
    #[error("Command '{command}' timed out after {timeout:?}")]
    CommandTimeout {
        command: String,
        timeout: Duration,
        partial_output: String,
    },

    /// The remote side hung up while a command was running
    #[error("Connection closed while running '{command}'")]
    Disconnected {
        command: String,
        partial_output: String,
    },

    /// Session already torn down
    #[error("Session not connected")]
    NotConnected,
}

impl DriverError {
    /// Output gathered before the batch was cut short, if any.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Self::CommandTimeout { partial_output, .. }
            | Self::Disconnected { partial_output, .. } => Some(partial_output),
            Self::NotConnected => None,
        }
    }
}

/// Device profile errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Device type is not in the profile table
    #[error("{device_type} not yet supported")]
    UnsupportedDeviceType { device_type: String },

    /// Invalid profile definition
    #[error("Invalid device profile: {message}")]
    InvalidDefinition { message: String },
}

/// Host resolution and run errors.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Descriptor carries neither `commands` nor `global_commands`
    #[error("No commands defined for {host}: set commands or global_commands")]
    NoCommandsDefined { host: String },

    /// Descriptor carries no device type
    #[error("No device type defined for {host}")]
    MissingDeviceType { host: String },

    /// The run was cancelled while this host was in flight
    #[error("Interrupted while processing {host}")]
    Interrupted { host: String },
}

/// Log file errors. These never fail a host.
#[derive(Error, Debug)]
pub enum LogError {
    /// A log file or directory could not be created or written
    #[error("Could not open logfile {path} for writing: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using runcli's Error.
pub type Result<T> = std::result::Result<T, Error>;

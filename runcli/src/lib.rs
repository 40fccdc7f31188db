//! # runcli
//!
//! Run a list of CLI commands against many network devices over SSH and
//! collect their output.
//!
//! runcli drives the system `ssh` client on a pseudo-terminal, walks the
//! login handshake (host key confirmation, password prompt) with an explicit
//! state machine, then sends each command and waits for the device's
//! prompt. Raw output is logged per host, and per command on request.
//!
//! ## Features
//!
//! - Multi-vendor prompt recognition (Arista, Force10, HP APM, Unix root
//!   shells, Junos, Cisco)
//! - Password or private key authentication
//! - Per-host device types and command lists
//! - Per-host fault isolation: one unreachable device never stops a run
//! - Sequential or bounded-concurrency scheduling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runcli::{HostPlan, OrchestratorBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), runcli::Error> {
//!     let orchestrator = OrchestratorBuilder::new("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let plan = HostPlan::uniform(["sw1", "sw2"], "arista", ["show version"]);
//!     let report = orchestrator.run(&plan).await;
//!
//!     for result in report.results() {
//!         println!("{}:\n{}", result.host, result.raw_output);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod channel;
pub mod driver;
pub mod error;
pub mod logging;
pub mod login;
pub mod platform;
pub mod reporter;
pub mod transport;

// Re-export main types for convenience
pub use batch::{
    ExecutionResult, HostDescriptor, HostPlan, Orchestrator, OrchestratorBuilder, RunOptions,
    RunReport, Schedule,
};
pub use driver::{Session, SessionBuilder};
pub use error::{Error, Result};
pub use platform::{DeviceProfile, ProfileTable};
pub use reporter::{LogReporter, Reporter};
pub use transport::{AuthMethod, Credentials};

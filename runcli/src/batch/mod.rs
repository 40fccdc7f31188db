//! Batch runs over many hosts.
//!
//! A [`HostPlan`] lists the hosts and how their commands are chosen, an
//! [`Orchestrator`] runs each host through a [`HostRunner`] and folds the
//! outcomes into a [`RunReport`]. A failure on one host never affects
//! another.

mod builder;
mod inventory;
mod orchestrator;
mod report;
mod runner;
mod sanitize;

pub use builder::{OrchestratorBuilder, RunOptions};
pub use inventory::{DEFAULT_HOST, HostDescriptor, HostPlan, HostTarget, is_skipped};
pub use orchestrator::{Orchestrator, Schedule};
pub use report::{ExecutionResult, FailureKind, HostFailure, RunReport};
pub use runner::{HostOutcome, HostRunner, OutputMode, SessionRunner};
pub use sanitize::sanitize_output_name;

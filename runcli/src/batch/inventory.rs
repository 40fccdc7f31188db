//! Host lists and per-host command resolution.
//!
//! Host lists arrive already loaded, in one of two shapes: one device type
//! and command list for every host, or a mapping from host to its own
//! descriptor:
//!
//! ```yaml
//! default:
//!   global_commands: [show version]
//! sw1:
//!   type: arista
//!   global_commands: [terminal length 0]
//!   commands: [show ip bgp summary]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

/// Reserved key for fallback declarations; never treated as a host.
pub const DEFAULT_HOST: &str = "default";

/// Check if a host-list entry should be skipped.
pub fn is_skipped(host: &str) -> bool {
    host.trim().is_empty() || host.eq_ignore_ascii_case(DEFAULT_HOST)
}

/// Per-host settings in per-host mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    /// Device type identifier.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    /// Host-specific commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,

    /// Commands run before the host-specific ones.
    #[serde(
        default,
        alias = "globalCommands",
        skip_serializing_if = "Option::is_none"
    )]
    pub global_commands: Option<Vec<String>>,
}

impl HostDescriptor {
    /// The command list for this host.
    ///
    /// `global_commands` come first, then `commands`. Having neither is an
    /// error for this host only.
    pub fn effective_commands(&self, host: &str) -> Result<Vec<String>> {
        match (&self.global_commands, &self.commands) {
            (Some(global), Some(own)) => Ok(global.iter().chain(own).cloned().collect()),
            (Some(global), None) => Ok(global.clone()),
            (None, Some(own)) => Ok(own.clone()),
            (None, None) => Err(BatchError::NoCommandsDefined {
                host: host.to_string(),
            }
            .into()),
        }
    }
}

/// A host with everything needed to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    /// Host name or address.
    pub host: String,

    /// Device type identifier (not yet validated against the profile table).
    pub device_type: String,

    /// Commands in execution order.
    pub commands: Vec<String>,
}

/// The hosts of a run and how their commands are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPlan {
    /// Same device type and commands for every host.
    Uniform {
        hosts: Vec<String>,
        device_type: String,
        commands: Vec<String>,
    },

    /// Each host carries its own descriptor.
    PerHost(IndexMap<String, HostDescriptor>),
}

impl HostPlan {
    /// Uniform plan.
    pub fn uniform(
        hosts: impl IntoIterator<Item = impl Into<String>>,
        device_type: impl Into<String>,
        commands: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Uniform {
            hosts: hosts.into_iter().map(Into::into).collect(),
            device_type: device_type.into(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Per-host plan.
    pub fn per_host(descriptors: IndexMap<String, HostDescriptor>) -> Self {
        Self::PerHost(descriptors)
    }

    /// Hosts that will be processed, in order, without skipped entries.
    pub fn hosts(&self) -> Vec<&str> {
        let all: Box<dyn Iterator<Item = &String>> = match self {
            Self::Uniform { hosts, .. } => Box::new(hosts.iter()),
            Self::PerHost(map) => Box::new(map.keys()),
        };
        all.map(String::as_str).filter(|h| !is_skipped(h)).collect()
    }

    /// Resolve every processed host to a target, or to the error that
    /// keeps it from running.
    pub fn resolve(&self) -> Vec<(String, Result<HostTarget>)> {
        match self {
            Self::Uniform {
                hosts,
                device_type,
                commands,
            } => hosts
                .iter()
                .filter(|h| !is_skipped(h))
                .map(|host| {
                    let target = HostTarget {
                        host: host.clone(),
                        device_type: device_type.clone(),
                        commands: commands.clone(),
                    };
                    (host.clone(), Ok(target))
                })
                .collect(),
            Self::PerHost(map) => map
                .iter()
                .filter(|(h, _)| !is_skipped(h))
                .map(|(host, descriptor)| (host.clone(), resolve_descriptor(host, descriptor)))
                .collect(),
        }
    }
}

fn resolve_descriptor(host: &str, descriptor: &HostDescriptor) -> Result<HostTarget> {
    let device_type = descriptor
        .device_type
        .clone()
        .ok_or_else(|| BatchError::MissingDeviceType {
            host: host.to_string(),
        })?;
    let commands = descriptor.effective_commands(host)?;
    Ok(HostTarget {
        host: host.to_string(),
        device_type,
        commands,
    })
}

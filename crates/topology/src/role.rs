//! Roles and component keys.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of process an instance runs.
///
/// Variants are declared in start order, so the derived `Ord` is the
/// dependency order: coordination first, then storage, then compute, then
/// replication-log and auxiliary services. Stopping walks it in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Metadata and consensus nodes
    Coordinator,
    /// Nodes holding the primary replicated dataset
    Storage,
    /// Stateless SQL/compute nodes
    Compute,
    /// Replication-log collectors
    Pump,
    /// Replication-log relays streaming change data out
    Drainer,
    /// Metrics collection
    Monitor,
    /// Metrics dashboards
    Dashboard,
}

impl Role {
    /// Every role in start order.
    pub const START_ORDER: [Role; 7] = [
        Role::Coordinator,
        Role::Storage,
        Role::Compute,
        Role::Pump,
        Role::Drainer,
        Role::Monitor,
        Role::Dashboard,
    ];

    /// Lowercase identifier used in IDs, package names and service units.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Storage => "storage",
            Self::Compute => "compute",
            Self::Pump => "pump",
            Self::Drainer => "drainer",
            Self::Monitor => "monitor",
            Self::Dashboard => "dashboard",
        }
    }

    /// Ports used when an instance does not list its own.
    ///
    /// The first port is the instance's main port and part of its ID.
    pub fn default_ports(&self) -> &'static [u16] {
        match self {
            Self::Coordinator => &[2379, 2380],
            Self::Storage => &[20160, 20180],
            Self::Compute => &[4000, 10080],
            Self::Pump => &[8250],
            Self::Drainer => &[8249],
            Self::Monitor => &[9090],
            Self::Dashboard => &[3000],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::START_ORDER
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownRole(s.to_string()))
    }
}

/// A (component, version) pair.
///
/// Used as a set key so that instances sharing a component and version
/// trigger exactly one package download.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub component: Role,
    pub version: String,
}

impl ComponentInfo {
    pub fn new(component: Role, version: impl Into<String>) -> Self {
        Self {
            component,
            version: version.into(),
        }
    }
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.version)
    }
}

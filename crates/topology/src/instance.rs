//! A single process placement.

use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Rendered in place of the data directory when an instance has none.
pub const NO_DATA_DIR: &str = "none";

const DEFAULT_SSH_PORT: u16 = 22;

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// Source of liveness/membership tags for instances.
///
/// Implementations talk to the running cluster; the returned tag is passed
/// through unmodified (e.g. "Up", "Down", "Offline", "Tombstone", "Healthy|L").
pub trait StatusProbe: Send + Sync {
    /// Poll the status of `instance`, using `endpoints` (typically the
    /// coordinator client URLs) as reference.
    fn probe(&self, instance: &Instance, endpoints: &[String]) -> String;
}

/// One process placement: a role on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub role: Role,
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Role-specific ports; the first one is the main port.
    /// Empty means the role defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,

    /// Raw deploy directory, possibly relative to the user's deploy root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl Instance {
    /// Create an instance on the role's default ports and directories.
    pub fn new(role: Role, host: impl Into<String>) -> Self {
        Self {
            role,
            host: host.into(),
            ssh_port: DEFAULT_SSH_PORT,
            ports: Vec::new(),
            deploy_dir: None,
            data_dir: None,
        }
    }

    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_deploy_dir(mut self, dir: impl Into<String>) -> Self {
        self.deploy_dir = Some(dir.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<String>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Stable identifier: `host:main_port`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.host, self.main_port())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn component_name(&self) -> &'static str {
        self.role.name()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn main_port(&self) -> u16 {
        self.used_ports()[0]
    }

    /// Ports in role-specific order.
    pub fn used_ports(&self) -> Vec<u16> {
        if self.ports.is_empty() {
            self.role.default_ports().to_vec()
        } else {
            self.ports.clone()
        }
    }

    /// Raw deploy directory as written in the topology.
    pub fn deploy_dir(&self) -> String {
        self.deploy_dir
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.role, self.main_port()))
    }

    /// Deploy directory first, data directory second ([`NO_DATA_DIR`] if absent).
    pub fn used_dirs(&self) -> Vec<String> {
        vec![
            self.deploy_dir(),
            self.data_dir
                .clone()
                .unwrap_or_else(|| NO_DATA_DIR.to_string()),
        ]
    }

    /// Absolute deploy directory for `user`.
    ///
    /// Relative directories live under `/home/<user>/deploy/`.
    pub fn resolved_deploy_dir(&self, user: &str) -> String {
        let dir = self.deploy_dir();
        if dir.starts_with('/') {
            dir
        } else {
            format!("/home/{user}/deploy/{dir}")
        }
    }

    /// Absolute data directory for `user`, if the instance has one.
    ///
    /// Relative data directories live inside the deploy directory.
    pub fn resolved_data_dir(&self, user: &str) -> Option<String> {
        self.data_dir.as_ref().map(|dir| {
            if dir.starts_with('/') {
                dir.clone()
            } else {
                format!("{}/{dir}", self.resolved_deploy_dir(user))
            }
        })
    }

    /// The first configured directory that could resolve to a parent of
    /// its own placement: empty, the root, or stepping out through `..`.
    pub fn unsafe_dir(&self) -> Option<&str> {
        [self.deploy_dir.as_deref(), self.data_dir.as_deref()]
            .into_iter()
            .flatten()
            .find(|dir| !is_contained(dir))
    }

    /// Name of the systemd unit running this instance.
    pub fn service_name(&self) -> String {
        format!("{}-{}.service", self.role, self.main_port())
    }

    /// Poll this instance's status against the reference endpoints.
    pub fn status(&self, probe: &dyn StatusProbe, endpoints: &[String]) -> String {
        probe.probe(self, endpoints)
    }
}

/// A directory names something below its base: at least one real
/// component and no `..`.
fn is_contained(dir: &str) -> bool {
    let parts: Vec<&str> = dir
        .split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    !parts.is_empty() && !parts.contains(&"..")
}

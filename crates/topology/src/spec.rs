//! The cluster specification.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::role::Role;
use crate::set::NodeSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// All instances of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    role: Role,
    instances: Vec<Instance>,
}

impl Component {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// A distinct SSH destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAddr {
    pub host: String,
    pub ssh_port: u16,
}

/// On-disk shape of a specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpecFile {
    #[serde(default)]
    servers: Vec<Instance>,
}

/// Declarative description of every instance in a cluster.
///
/// Instance IDs are unique; this is checked on construction and on
/// deserialization, so every `Specification` value upholds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpecFile", into = "SpecFile")]
pub struct Specification {
    servers: Vec<Instance>,
}

impl Specification {
    /// Build a specification.
    ///
    /// Rejects duplicate IDs, empty hosts, directories that are empty, the
    /// root or climb out with `..`, and one host reached on two SSH ports.
    pub fn new(servers: Vec<Instance>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut ssh_ports: HashMap<&str, u16> = HashMap::new();
        for inst in &servers {
            if inst.host.trim().is_empty() {
                return Err(Error::EmptyHost(inst.role.to_string()));
            }
            if !seen.insert(inst.id()) {
                return Err(Error::DuplicateId(inst.id()));
            }
            if let Some(dir) = inst.unsafe_dir() {
                return Err(Error::UnsafeDir {
                    id: inst.id(),
                    dir: dir.to_string(),
                });
            }
            let first = *ssh_ports.entry(inst.host.as_str()).or_insert(inst.ssh_port);
            if first != inst.ssh_port {
                return Err(Error::ConflictingSshPort {
                    host: inst.host.clone(),
                    first,
                    second: inst.ssh_port,
                });
            }
        }
        Ok(Self { servers })
    }

    /// Components in start order, one per role, possibly empty.
    ///
    /// Within a component, instances keep their declaration order. Stop
    /// order is this order reversed.
    pub fn components_by_start_order(&self) -> Vec<Component> {
        Role::START_ORDER
            .into_iter()
            .map(|role| Component {
                role,
                instances: self
                    .servers
                    .iter()
                    .filter(|inst| inst.role == role)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Every instance, in start order.
    pub fn instances(&self) -> Vec<Instance> {
        self.components_by_start_order()
            .into_iter()
            .flat_map(|c| c.instances)
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Instance> {
        self.servers.iter().find(|inst| inst.id() == id)
    }

    pub fn count(&self, role: Role) -> usize {
        self.servers.iter().filter(|inst| inst.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Distinct SSH destinations, in first-seen start order.
    ///
    /// A host has a single SSH port, checked on construction.
    pub fn hosts(&self) -> Vec<HostAddr> {
        let mut seen = HashSet::new();
        self.instances()
            .into_iter()
            .filter(|inst| seen.insert(inst.host.clone()))
            .map(|inst| HostAddr {
                host: inst.host,
                ssh_port: inst.ssh_port,
            })
            .collect()
    }

    /// Client URLs of the coordinators, used as status reference endpoints.
    pub fn coordinator_endpoints(&self) -> Vec<String> {
        self.servers
            .iter()
            .filter(|inst| inst.role == Role::Coordinator)
            .map(|inst| format!("http://{}:{}", inst.host, inst.main_port()))
            .collect()
    }

    /// A copy of this specification without the given instances.
    pub fn without(&self, ids: &NodeSet) -> Self {
        Self {
            servers: self
                .servers
                .iter()
                .filter(|inst| !ids.contains(&inst.id()))
                .cloned()
                .collect(),
        }
    }
}

impl TryFrom<SpecFile> for Specification {
    type Error = Error;

    fn try_from(file: SpecFile) -> Result<Self> {
        Self::new(file.servers)
    }
}

impl From<Specification> for SpecFile {
    fn from(spec: Specification) -> Self {
        Self {
            servers: spec.servers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Specification {
        Specification::new(vec![
            Instance::new(Role::Compute, "10.0.0.3"),
            Instance::new(Role::Storage, "10.0.0.2"),
            Instance::new(Role::Coordinator, "10.0.0.1"),
            Instance::new(Role::Storage, "10.0.0.4"),
            Instance::new(Role::Monitor, "10.0.0.1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_components_by_start_order() {
        let spec = sample();
        let comps = spec.components_by_start_order();
        assert_eq!(comps.len(), Role::START_ORDER.len());

        let non_empty: Vec<(Role, usize)> = comps
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| (c.role(), c.instances().len()))
            .collect();
        assert_eq!(
            non_empty,
            vec![
                (Role::Coordinator, 1),
                (Role::Storage, 2),
                (Role::Compute, 1),
                (Role::Monitor, 1),
            ]
        );

        // declaration order kept within a component
        let storage = &comps[1];
        assert_eq!(storage.instances()[0].host, "10.0.0.2");
        assert_eq!(storage.instances()[1].host, "10.0.0.4");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = Specification::new(vec![
            Instance::new(Role::Storage, "h1"),
            Instance::new(Role::Storage, "h1"),
        ]);
        assert_eq!(result, Err(Error::DuplicateId("h1:20160".to_string())));
    }

    #[test]
    fn test_same_host_different_ports_allowed() {
        let spec = Specification::new(vec![
            Instance::new(Role::Storage, "h1"),
            Instance::new(Role::Storage, "h1").with_ports(vec![20161, 20181]),
        ])
        .unwrap();
        assert_eq!(spec.count(Role::Storage), 2);
        assert_eq!(spec.hosts().len(), 1);
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = Specification::new(vec![Instance::new(Role::Compute, " ")]);
        assert!(matches!(result, Err(Error::EmptyHost(_))));
    }

    #[test]
    fn test_unsafe_dirs_rejected() {
        let empty = Specification::new(vec![Instance::new(Role::Compute, "h1").with_deploy_dir("")]);
        assert_eq!(
            empty,
            Err(Error::UnsafeDir {
                id: "h1:4000".to_string(),
                dir: String::new(),
            })
        );

        let root_data = Specification::new(vec![Instance::new(Role::Storage, "h1").with_data_dir("/")]);
        assert!(matches!(root_data, Err(Error::UnsafeDir { dir, .. }) if dir == "/"));

        let climbing = Specification::new(vec![
            Instance::new(Role::Storage, "h1").with_deploy_dir("/data/../etc"),
        ]);
        assert!(matches!(climbing, Err(Error::UnsafeDir { .. })));

        let spaced = Specification::new(vec![
            Instance::new(Role::Compute, "h1").with_deploy_dir("/data/tidb deploy"),
        ]);
        assert!(spaced.is_ok());
    }

    #[test]
    fn test_conflicting_ssh_ports_rejected() {
        let mut other = Instance::new(Role::Compute, "h1");
        other.ssh_port = 2222;
        let result = Specification::new(vec![Instance::new(Role::Storage, "h1"), other]);
        assert_eq!(
            result,
            Err(Error::ConflictingSshPort {
                host: "h1".to_string(),
                first: 22,
                second: 2222,
            })
        );
    }

    #[test]
    fn test_unsafe_dir_rejected_from_toml() {
        let text = "[[servers]]\nrole = \"storage\"\nhost = \"h\"\ndata_dir = \"/\"\n";
        assert!(toml::from_str::<Specification>(text).is_err());
    }

    #[test]
    fn test_hosts_distinct_in_start_order() {
        let hosts: Vec<String> = sample().hosts().into_iter().map(|h| h.host).collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.4", "10.0.0.3"]);
    }

    #[test]
    fn test_coordinator_endpoints() {
        assert_eq!(
            sample().coordinator_endpoints(),
            vec!["http://10.0.0.1:2379".to_string()]
        );
    }

    #[test]
    fn test_without() {
        let spec = sample();
        let smaller = spec.without(&NodeSet::new(["10.0.0.2:20160"]));
        assert_eq!(smaller.len(), spec.len() - 1);
        assert!(smaller.find("10.0.0.2:20160").is_none());
        assert!(spec.find("10.0.0.2:20160").is_some());
    }

    #[test]
    fn test_toml_round_trip_validates() {
        let text = r#"
[[servers]]
role = "coordinator"
host = "10.0.0.1"

[[servers]]
role = "storage"
host = "10.0.0.2"
ports = [20161, 20181]
deploy_dir = "/data/storage"
data_dir = "db"
"#;
        let spec: Specification = toml::from_str(text).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.find("10.0.0.2:20161").unwrap().ssh_port, 22);

        let dup = "[[servers]]\nrole = \"compute\"\nhost = \"h\"\n[[servers]]\nrole = \"compute\"\nhost = \"h\"\n";
        assert!(toml::from_str::<Specification>(dup).is_err());
    }
}

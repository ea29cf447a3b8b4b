//! Persisted cluster metadata.

use crate::operation::Cluster;
use crate::paths::Profile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use topology::Specification;

/// Contents of `clusters/<name>/meta.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMeta {
    pub user: String,
    pub version: String,
    pub topology: Specification,
}

impl ClusterMeta {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read cluster metadata {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid cluster metadata in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Could not serialize cluster metadata")?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
    }

    /// Load the metadata of cluster `name` from `profile`
    pub fn load_cluster(profile: &Profile, name: &str) -> Result<Self> {
        let path = profile.meta_file(name);
        if !path.exists() {
            anyhow::bail!("Cluster '{name}' not found (no {})", path.display());
        }
        Self::load(&path)
    }

    pub fn into_cluster(self, profile: &Profile, name: &str) -> Cluster {
        Cluster {
            name: name.to_string(),
            user: self.user,
            version: self.version,
            topology: self.topology,
            keys: profile.key_pair(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::{Instance, Role};

    fn meta() -> ClusterMeta {
        ClusterMeta {
            user: "tidb".into(),
            version: "v4.0.0".into(),
            topology: Specification::new(vec![
                Instance::new(Role::Coordinator, "10.0.1.1"),
                Instance::new(Role::Storage, "10.0.2.1")
                    .with_deploy_dir("/data/deploy/storage")
                    .with_data_dir("data"),
            ])
            .unwrap(),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let profile = Profile::at(dir.path());
        let path = profile.meta_file("prod");

        meta().save(&path).unwrap();
        assert_eq!(ClusterMeta::load_cluster(&profile, "prod").unwrap(), meta());
    }

    #[test]
    fn test_reads_handwritten_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.toml");
        fs::write(
            &path,
            r#"
user = "tidb"
version = "v3.1.0"

[[topology.servers]]
role = "coordinator"
host = "10.0.1.1"

[[topology.servers]]
role = "compute"
host = "10.0.3.1"
ssh_port = 2222
ports = [4001, 10081]
"#,
        )
        .unwrap();

        let meta = ClusterMeta::load(&path).unwrap();
        assert_eq!(meta.version, "v3.1.0");
        assert!(meta.topology.find("10.0.3.1:4001").is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.toml");
        fs::write(
            &path,
            r#"
user = "tidb"
version = "v3.1.0"

[[topology.servers]]
role = "storage"
host = "10.0.2.1"

[[topology.servers]]
role = "storage"
host = "10.0.2.1"
"#,
        )
        .unwrap();
        assert!(ClusterMeta::load(&path).is_err());
    }

    #[test]
    fn test_missing_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClusterMeta::load_cluster(&Profile::at(dir.path()), "ghost").unwrap_err();
        assert!(err.to_string().contains("Cluster 'ghost' not found"));
    }

    #[test]
    fn test_into_cluster_uses_profile_keys() {
        let profile = Profile::at("/p");
        let cluster = meta().into_cluster(&profile, "prod");
        assert_eq!(cluster.name, "prod");
        assert_eq!(cluster.keys, profile.key_pair("prod"));
    }
}

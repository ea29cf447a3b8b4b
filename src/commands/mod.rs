pub mod destroy;
pub mod lifecycle;
pub mod scale_in;
pub mod status;
pub mod upgrade;

use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use taskgraph::{Context, PackageCache};

use crate::config::Settings;
use crate::meta::ClusterMeta;
use crate::operation::Cluster;
use crate::paths::Profile;
use crate::repository::MirrorSource;
use crate::runner;
use crate::ssh::SshConnector;

/// Everything a command needs from the profile
pub struct Runtime {
    pub profile: Profile,
    pub settings: Settings,
    jobs: Option<usize>,
}

impl Runtime {
    pub fn load(home: Option<&str>, jobs: Option<usize>) -> Result<Self> {
        let profile = Profile::resolve(home)?;
        let settings = Settings::load(&profile.config_file())?;
        Ok(Self {
            profile,
            settings,
            jobs,
        })
    }

    /// `--jobs` wins over `config.toml`
    pub fn jobs(&self) -> Option<usize> {
        self.jobs.or(self.settings.jobs)
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.ssh_timeout_secs())
    }

    /// Load a cluster and its metadata
    pub fn cluster(&self, name: &str) -> Result<(ClusterMeta, Cluster)> {
        let meta = ClusterMeta::load_cluster(&self.profile, name)?;
        let cluster = meta.clone().into_cluster(&self.profile, name);
        if !cluster.keys.private_key.exists() {
            bail!(
                "SSH key for cluster '{name}' not found at {}",
                cluster.keys.private_key.display()
            );
        }
        Ok((meta, cluster))
    }

    /// A fresh execution context talking to real hosts
    pub fn context(&self) -> Result<Context> {
        for binary in ["ssh", "scp"] {
            if !runner::command_exists(binary) {
                bail!("`{binary}` not found in PATH");
            }
        }
        let mirror = self.settings.mirror.clone().unwrap_or_default();
        let packages = PackageCache::new(
            self.settings.cache_dir(&self.profile),
            Arc::new(MirrorSource::new(mirror)),
        );
        let connector = SshConnector::new(self.settings.ssh_timeout_secs());
        Ok(Context::new(Arc::new(connector), packages))
    }

    /// Persist updated metadata for `name`
    pub fn save(&self, name: &str, meta: &ClusterMeta) -> Result<()> {
        meta.save(&self.profile.meta_file(name))
    }
}

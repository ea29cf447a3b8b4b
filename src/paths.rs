//! Profile directory layout
//!
//! Everything dbfleet keeps locally lives under one profile directory:
//!
//! ```text
//! <home>/
//!   config.toml
//!   packages/                       downloaded component packages
//!   clusters/<name>/meta.toml       user, version and topology
//!   clusters/<name>/ssh/id_rsa{,.pub}
//! ```
//!
//! The home is `--home` / `DBFLEET_HOME` when given, `~/.dbfleet` otherwise.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use taskgraph::SshKeyPair;

/// Environment variable for the profile directory
pub const ENV_HOME: &str = "DBFLEET_HOME";

/// Resolved profile directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    home: PathBuf,
}

impl Profile {
    /// Resolve the profile from an explicit override or the default location
    pub fn resolve(home: Option<&str>) -> Result<Self> {
        if let Some(dir) = home {
            let path = expand(dir);
            log::debug!("Using profile dir {}", path.display());
            return Ok(Self { home: path });
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        let path = home.join(".dbfleet");
        log::debug!("Using default profile dir: {}", path.display());
        Ok(Self { home: path })
    }

    #[cfg(test)]
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    #[cfg(test)]
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Default package cache
    pub fn packages_dir(&self) -> PathBuf {
        self.home.join("packages")
    }

    pub fn cluster_dir(&self, name: &str) -> PathBuf {
        self.home.join("clusters").join(name)
    }

    pub fn meta_file(&self, name: &str) -> PathBuf {
        self.cluster_dir(name).join("meta.toml")
    }

    /// The cluster's SSH key pair
    pub fn key_pair(&self, name: &str) -> SshKeyPair {
        let ssh = self.cluster_dir(name).join("ssh");
        SshKeyPair::new(ssh.join("id_rsa"), ssh.join("id_rsa.pub"))
    }
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_override() {
        let profile = Profile::resolve(Some("/srv/dbfleet")).unwrap();
        assert_eq!(profile.home(), Path::new("/srv/dbfleet"));
    }

    #[test]
    fn test_resolve_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let profile = Profile::resolve(Some("~/fleet-tilde-test")).unwrap();
        assert_eq!(profile.home(), home.join("fleet-tilde-test"));
    }

    #[test]
    fn test_resolve_default() {
        let home = dirs::home_dir().unwrap();
        let profile = Profile::resolve(None).unwrap();
        assert_eq!(profile.home(), home.join(".dbfleet"));
    }

    #[test]
    fn test_cluster_layout() {
        let profile = Profile::at("/p");
        assert_eq!(profile.config_file(), PathBuf::from("/p/config.toml"));
        assert_eq!(profile.meta_file("prod"), PathBuf::from("/p/clusters/prod/meta.toml"));

        let keys = profile.key_pair("prod");
        assert_eq!(keys.private_key, PathBuf::from("/p/clusters/prod/ssh/id_rsa"));
        assert_eq!(keys.public_key, PathBuf::from("/p/clusters/prod/ssh/id_rsa.pub"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}

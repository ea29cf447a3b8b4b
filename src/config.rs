use crate::paths::{Profile, expand};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SSH_TIMEOUT_SECS: u64 = 10;

/// Settings read from `<home>/config.toml`; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Base URL packages are downloaded from
    #[serde(default)]
    pub mirror: Option<String>,

    /// Package cache, defaults to `<home>/packages`
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// Bound on concurrent tasks in a parallel step
    #[serde(default)]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub ssh_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn cache_dir(&self, profile: &Profile) -> PathBuf {
        self.cache_dir
            .as_deref()
            .map_or_else(|| profile.packages_dir(), expand)
    }

    pub fn ssh_timeout_secs(&self) -> u64 {
        self.ssh_timeout_secs.unwrap_or(DEFAULT_SSH_TIMEOUT_SECS)
    }

    /// The configured mirror, required for anything that downloads
    pub fn mirror(&self, profile: &Profile) -> Result<&str> {
        self.mirror.as_deref().with_context(|| {
            format!(
                "No package mirror configured; set `mirror` in {}",
                profile.config_file().display()
            )
        })
    }
}

//! Local package cache keyed by (component, version).

use crate::context::lock;
use crate::error::{Result, TaskError};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use topology::ComponentInfo;

/// File name of a component package.
pub fn package_file_name(info: &ComponentInfo) -> String {
    format!("{}-{}-linux-amd64.tar.gz", info.component, info.version)
}

/// Fetches component packages.
pub trait PackageSource: Send + Sync {
    /// Write the package for `info` to `dest`
    fn fetch(&self, info: &ComponentInfo, dest: &Path) -> Result<()>;
}

type Slot = Arc<Mutex<Option<PathBuf>>>;

/// Download cache shared by all tasks of one execution.
///
/// Each key has its own slot: concurrent requests for one key wait for a
/// single fetch, requests for different keys proceed independently. A
/// package file already on disk counts as cached. Failed fetches are not
/// remembered.
pub struct PackageCache {
    dir: PathBuf,
    source: Arc<dyn PackageSource>,
    slots: Mutex<HashMap<ComponentInfo, Slot>>,
}

impl PackageCache {
    pub fn new(dir: impl Into<PathBuf>, source: Arc<dyn PackageSource>) -> Self {
        Self {
            dir: dir.into(),
            source,
            slots: Mutex::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the package for `info` lives once cached
    pub fn path_for(&self, info: &ComponentInfo) -> PathBuf {
        self.dir.join(package_file_name(info))
    }

    /// Make sure the package for `info` is cached, fetching it at most once
    pub fn ensure(&self, info: &ComponentInfo) -> Result<PathBuf> {
        let slot = Arc::clone(lock(&self.slots).entry(info.clone()).or_default());
        let mut cached = lock(&slot);

        if let Some(path) = cached.as_ref() {
            debug!("{info} already fetched in this run");
            return Ok(path.clone());
        }

        let path = self.path_for(info);
        if path.is_file() {
            debug!("{info} found in cache at {}", path.display());
            *cached = Some(path.clone());
            return Ok(path);
        }

        fs::create_dir_all(&self.dir).map_err(|e| TaskError::io(&self.dir, e))?;
        debug!("Fetching {info} into {}", path.display());
        self.source.fetch(info, &path)?;
        *cached = Some(path.clone());
        Ok(path)
    }

    /// Path of the cached package, if it is present
    pub fn cached(&self, info: &ComponentInfo) -> Option<PathBuf> {
        let slot = lock(&self.slots).get(info).cloned();
        if let Some(slot) = slot {
            let fetched = lock(&slot).clone();
            if fetched.is_some() {
                return fetched;
            }
        }
        let path = self.path_for(info);
        path.is_file().then_some(path)
    }
}

/// Package source that writes a stub file and records every fetch.
#[derive(Debug, Default)]
pub struct MockSource {
    fetches: Mutex<Vec<ComponentInfo>>,
    missing: HashSet<ComponentInfo>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make fetching `info` fail
    pub fn with_missing(mut self, info: ComponentInfo) -> Self {
        self.missing.insert(info);
        self
    }

    /// Every fetch so far, in order
    pub fn fetches(&self) -> Vec<ComponentInfo> {
        lock(&self.fetches).clone()
    }

    /// How many times `info` was fetched
    pub fn fetch_count(&self, info: &ComponentInfo) -> usize {
        lock(&self.fetches).iter().filter(|f| *f == info).count()
    }
}

impl PackageSource for MockSource {
    fn fetch(&self, info: &ComponentInfo, dest: &Path) -> Result<()> {
        lock(&self.fetches).push(info.clone());
        if self.missing.contains(info) {
            return Err(TaskError::Fetch {
                component: info.component.to_string(),
                version: info.version.clone(),
                message: "not found in mirror".to_string(),
            });
        }
        fs::write(dest, info.to_string()).map_err(|e| TaskError::io(dest, e))
    }
}

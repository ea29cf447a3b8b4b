//! Execution context shared by every task in one run.
//!
//! A context is created right before a graph executes and dropped after.
//! Tasks only ever see `&Context`; all mutable state sits behind locks so
//! sibling tasks of a parallel group can populate it concurrently.

use crate::error::{Result, TaskError};
use crate::executor::{Connector, Executor};
use crate::package::PackageCache;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Lock a mutex, recovering the data if another task panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Location of the SSH key pair used to reach cluster hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshKeyPair {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl SshKeyPair {
    pub fn new(private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
        }
    }
}

/// Mutable state for one execution
pub struct Context {
    connector: Arc<dyn Connector>,
    packages: PackageCache,
    executors: RwLock<HashMap<String, Arc<dyn Executor>>>,
    keys: RwLock<Option<SshKeyPair>>,
    notes: Mutex<BTreeMap<String, Vec<String>>>,
    failures: Mutex<Vec<String>>,
}

impl Context {
    /// Create a fresh context
    pub fn new(connector: Arc<dyn Connector>, packages: PackageCache) -> Self {
        Self {
            connector,
            packages,
            executors: RwLock::default(),
            keys: RwLock::default(),
            notes: Mutex::default(),
            failures: Mutex::default(),
        }
    }

    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    pub fn packages(&self) -> &PackageCache {
        &self.packages
    }

    /// Record the key pair location, replacing any previous one
    pub fn set_ssh_keys(&self, keys: SshKeyPair) {
        *self.keys.write().unwrap_or_else(PoisonError::into_inner) = Some(keys);
    }

    /// Get the key pair, or error if not set yet
    pub fn ssh_keys(&self) -> Result<SshKeyPair> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TaskError::NoKeyPair)
    }

    /// Register (or refresh) the executor for `host`
    ///
    /// Entries for other hosts are never touched.
    pub fn insert_executor(&self, host: impl Into<String>, executor: Arc<dyn Executor>) {
        self.executors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.into(), executor);
    }

    /// Get the executor for `host`, or error if the host was never connected
    pub fn executor(&self, host: &str) -> Result<Arc<dyn Executor>> {
        self.executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()
            .ok_or_else(|| TaskError::NoExecutor(host.to_string()))
    }

    /// Hosts with a registered executor, sorted
    pub fn connected_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .executors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        hosts.sort();
        hosts
    }

    /// Append a partial result under `key`
    pub fn note(&self, key: &str, value: impl Into<String>) {
        lock(&self.notes)
            .entry(key.to_string())
            .or_default()
            .push(value.into());
    }

    /// Partial results recorded under `key`, in recording order
    pub fn notes(&self, key: &str) -> Vec<String> {
        lock(&self.notes).get(key).cloned().unwrap_or_default()
    }

    /// Keep a failure for diagnostics
    pub(crate) fn record_failure(&self, error: &TaskError) {
        lock(&self.failures).push(error.to_string());
    }

    /// Every failure seen inside parallel groups, including the reported ones
    pub fn failures(&self) -> Vec<String> {
        lock(&self.failures).clone()
    }
}

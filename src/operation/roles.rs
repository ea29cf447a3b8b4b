//! Per-role operating rules.
//!
//! Everything the operator layer needs to know about a role lives in one
//! table: how it goes offline, whether the cluster must keep at least one,
//! and which package version an upgrade installs for it. Adding a role is
//! a table edit.

use std::collections::BTreeMap;
use topology::Role;

/// How an instance is taken out of the cluster during scale-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineMode {
    /// No membership protocol involved: stop, then destroy
    Sync,
    /// The running cluster must be told to let the node leave first
    Async,
}

/// Which version an upgrade installs for a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRule {
    /// Follows the cluster's target version
    Cluster,
    /// Always this version, whatever the cluster version
    Pinned(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    pub offline: OfflineMode,
    /// At least one instance must survive any scale-in
    pub critical: bool,
    pub version: VersionRule,
}

impl RoleEntry {
    pub fn new(offline: OfflineMode, critical: bool, version: VersionRule) -> Self {
        Self {
            offline,
            critical,
            version,
        }
    }
}

/// Role → rules mapping consulted by upgrade and scale-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    entries: BTreeMap<Role, RoleEntry>,
}

impl Default for RoleTable {
    fn default() -> Self {
        use OfflineMode::{Async, Sync};
        use VersionRule::{Cluster, Pinned};

        Self::empty()
            .with(Role::Coordinator, RoleEntry::new(Async, true, Cluster))
            .with(Role::Storage, RoleEntry::new(Async, true, Cluster))
            .with(Role::Compute, RoleEntry::new(Sync, false, Cluster))
            .with(Role::Pump, RoleEntry::new(Async, false, Cluster))
            .with(Role::Drainer, RoleEntry::new(Async, false, Cluster))
            .with(
                Role::Monitor,
                RoleEntry::new(Sync, false, Pinned("v2.8.1".into())),
            )
            .with(
                Role::Dashboard,
                RoleEntry::new(Sync, false, Pinned("v6.1.6".into())),
            )
    }
}

impl RoleTable {
    /// A table with no roles at all
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace the entry for `role`
    pub fn with(mut self, role: Role, entry: RoleEntry) -> Self {
        self.entries.insert(role, entry);
        self
    }

    /// Drop the entry for `role`
    #[cfg(test)]
    pub fn without(mut self, role: Role) -> Self {
        self.entries.remove(&role);
        self
    }

    pub fn entry(&self, role: Role) -> Option<&RoleEntry> {
        self.entries.get(&role)
    }

    /// Version to install for `role` when the cluster moves to `target`.
    ///
    /// `None` means the role is not supported by upgrades.
    pub fn resolve_version(&self, role: Role, target: &str) -> Option<String> {
        self.entry(role).map(|entry| match &entry.version {
            VersionRule::Cluster => target.to_string(),
            VersionRule::Pinned(version) => version.clone(),
        })
    }

    /// Roles without an entry are treated as needing a graceful leave, so
    /// they are never destroyed blindly.
    pub fn offline_mode(&self, role: Role) -> OfflineMode {
        self.entry(role)
            .map_or(OfflineMode::Async, |entry| entry.offline)
    }

    /// Roles the cluster cannot lose entirely, in start order
    pub fn critical_roles(&self) -> Vec<Role> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.critical)
            .map(|(role, _)| *role)
            .collect()
    }
}

//! Leaf tasks - the remote and local actions cluster operations are built from
//!
//! Each task captures its inputs by value when the graph is built and
//! reaches hosts only through the executors registered in the context.

pub mod component;
pub mod download;
pub mod instance;
pub mod operate;
pub mod ssh;

pub use component::{BackupComponent, CopyComponent};
pub use download::Download;
pub use instance::{DESTROYED, DestroyInstance, LEFT_RUNNING, OfflineInstance, StartInstance, StopInstance};
pub use operate::ClusterOperate;
pub use ssh::{ClusterSsh, SshKeySet};

use crate::operation::{OperationKind, Options};
use std::path::PathBuf;
use taskgraph::Builder;
use topology::{Instance, Role, Specification};

/// Extension trait adding the leaf task catalog to the graph builder
pub trait BuilderExt {
    /// Record the SSH key pair location for later tasks
    fn ssh_key_set(self, private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self;

    /// Open an executor for every distinct host of `topology`
    fn cluster_ssh(self, topology: &Specification, user: &str) -> Self;

    /// Copy the installed component aside before it is replaced
    fn backup_component(self, component: Role, from_version: &str, host: &str, deploy_dir: &str) -> Self;

    /// Ship a downloaded package into a deploy directory
    fn copy_component(self, component: Role, to_version: &str, host: &str, deploy_dir: &str) -> Self;

    /// Run a cluster-wide lifecycle operation
    fn cluster_operate(
        self,
        topology: &Specification,
        kind: OperationKind,
        options: &Options,
        user: &str,
    ) -> Self;

    /// Stop one instance
    fn stop_instance(self, instance: &Instance, graceful: bool) -> Self;

    /// Remove one instance's files and service unit
    fn destroy_instance(self, instance: &Instance, user: &str) -> Self;
}

impl BuilderExt for Builder {
    fn ssh_key_set(self, private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self {
        self.step(SshKeySet::new(private_key, public_key))
    }

    fn cluster_ssh(self, topology: &Specification, user: &str) -> Self {
        self.step(ClusterSsh::new(topology, user))
    }

    fn backup_component(self, component: Role, from_version: &str, host: &str, deploy_dir: &str) -> Self {
        self.step(BackupComponent::new(component, from_version, host, deploy_dir))
    }

    fn copy_component(self, component: Role, to_version: &str, host: &str, deploy_dir: &str) -> Self {
        self.step(CopyComponent::new(component, to_version, host, deploy_dir))
    }

    fn cluster_operate(
        self,
        topology: &Specification,
        kind: OperationKind,
        options: &Options,
        user: &str,
    ) -> Self {
        self.step(ClusterOperate::new(topology.clone(), kind, options.clone(), user))
    }

    fn stop_instance(self, instance: &Instance, graceful: bool) -> Self {
        self.step(StopInstance::new(instance.clone(), graceful))
    }

    fn destroy_instance(self, instance: &Instance, user: &str) -> Self {
        self.step(DestroyInstance::new(instance.clone(), user))
    }
}

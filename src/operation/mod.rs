//! Cluster operations built on the task engine
//!
//! Each operation validates its inputs against the topology, builds one
//! serial task graph and runs it against a fresh context.

pub mod lifecycle;
pub mod membership;
pub mod operate;
pub mod roles;
pub mod scale_in;
pub mod upgrade;
pub mod version;

pub use membership::{LeaveOutcome, MembershipLeave, NoMembershipProtocol};
pub use roles::RoleTable;
pub use scale_in::{ScaleInOutcome, scale_in};
pub use upgrade::upgrade;

use std::fmt;
use taskgraph::{SshKeyPair, TaskError};
use thiserror::Error;
use topology::{NodeSet, Role, Specification};

/// Knobs shared by every operation
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Stop instances without a graceful shutdown
    pub force: bool,
    /// Instance IDs to remove during scale-in
    pub deleted_nodes: NodeSet,
}

/// Cluster-wide lifecycle actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Start,
    Stop,
    Restart,
    /// Rolling restart onto freshly copied binaries
    Upgrade,
    Destroy,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Upgrade => "upgrade",
            Self::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Everything an operation needs to know about a deployed cluster
#[derive(Debug, Clone)]
pub struct Cluster {
    pub name: String,
    /// Remote account owning the deployment
    pub user: String,
    /// Currently deployed cluster version
    pub version: String,
    pub topology: Specification,
    pub keys: SshKeyPair,
}

/// Errors raised by cluster operations
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("cannot find node id '{0}' in topology")]
    NodeNotFound(String),

    #[error("unsupported component: {0}")]
    UnsupportedComponent(Role),

    #[error("unsupported upgrade from {from} to {to}")]
    IncompatibleVersion { from: String, to: String },

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("cannot delete all {0} servers")]
    CannotRemoveAll(Role),

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl OperationError {
    /// Whether the operation was refused before touching any host
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Task(_))
    }
}

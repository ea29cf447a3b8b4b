//! Error types for topology validation.

use thiserror::Error;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or validating a topology.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Two instances resolve to the same ID
    #[error("duplicate instance id '{0}' in topology")]
    DuplicateId(String),

    /// A role name that is not part of the known vocabulary
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An instance without a host address
    #[error("instance of role {0} has an empty host")]
    EmptyHost(String),

    /// A deploy or data directory that resolves to a shared parent
    #[error("instance {id} has unsafe directory '{dir}'")]
    UnsafeDir { id: String, dir: String },

    /// One host listed with two different SSH ports
    #[error("host {host} has conflicting ssh ports {first} and {second}")]
    ConflictingSshPort { host: String, first: u16, second: u16 },
}

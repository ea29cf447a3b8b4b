//! Error types for task execution.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for task execution.
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors raised while executing a task graph.
///
/// Leaf tasks produce the concrete variants; [`Serial`](crate::Serial)
/// wraps a failing child in [`TaskError::Stage`].
#[derive(Debug, Error)]
pub enum TaskError {
    /// Could not open or validate a connection to a host
    #[error("failed to connect to {host}: {message}")]
    Connect {
        /// Host that could not be reached
        host: String,
        /// Transport error message
        message: String,
    },

    /// A remote command exited unsuccessfully
    #[error("command `{command}` failed on {host}: {stderr}")]
    Command {
        host: String,
        command: String,
        stderr: String,
    },

    /// A file could not be copied to a host
    #[error("failed to transfer {local} to {host}:{remote}: {message}")]
    Transfer {
        host: String,
        local: PathBuf,
        remote: String,
        message: String,
    },

    /// No executor was registered for a host
    #[error("no executor for host {0}, was the cluster connected?")]
    NoExecutor(String),

    /// A task needed the SSH key pair before it was set
    #[error("SSH key pair has not been set")]
    NoKeyPair,

    /// A package could not be fetched into the cache
    #[error("failed to fetch {component} {version}: {message}")]
    Fetch {
        component: String,
        version: String,
        message: String,
    },

    /// A copy was requested for a package that was never downloaded
    #[error("package {component} {version} has not been downloaded")]
    MissingPackage { component: String, version: String },

    /// Local filesystem error
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A child of a serial group failed
    #[error("stage {index} ({name}) failed: {source}")]
    Stage {
        /// Zero-based position of the failing child
        index: usize,
        /// Description of the failing child
        name: String,
        #[source]
        source: Box<TaskError>,
    },

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The innermost error, with every stage annotation peeled off.
    pub fn root(&self) -> &TaskError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage indices from the outermost serial group inwards.
    pub fn stage_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Stage { index, source, .. } = current {
            path.push(*index);
            current = source;
        }
        path
    }
}

//! # Taskgraph
//!
//! A small engine for composing remote work into an executable graph.
//!
//! Operations on a cluster are built as a tree of tasks, then executed once
//! against a fresh [`Context`]. The graph is static: nothing is scheduled
//! dynamically, and nothing is rolled back.
//!
//! ## Core Concepts
//!
//! - **Task**: A unit of work exposing `execute(&Context)`
//! - **Serial**: Children run in order; the first failure aborts the rest
//! - **Parallel**: Children run concurrently and all run to completion;
//!   the first failure (by child order) is reported
//! - **Builder**: Accumulates steps by value and finalizes into a `Serial`
//! - **Context**: Execution-scoped state shared by reference: host
//!   executors, SSH key pair, package cache, partial results
//!
//! ## Example
//!
//! ```ignore
//! use taskgraph::{Builder, Context, Parallel, run};
//!
//! let graph = Builder::new()
//!     .step(SetKeys { .. })
//!     .parallel(vec![Box::new(FetchA), Box::new(FetchB)])
//!     .step(Restart)
//!     .build();
//!
//! let ctx = Context::new(connector, packages);
//! run(&graph, &ctx, None)?;
//! ```
//!
//! ## Provider Traits
//!
//! Remote effects go through traits so the engine has no hard dependency
//! on a transport:
//!
//! - [`Connector`]: Opens an [`Executor`] for a host
//! - [`Executor`]: Runs commands and transfers files on one host
//! - [`PackageSource`]: Fetches a component package into the local cache
//!
//! [`MockConnector`] and [`MockSource`] record every call for tests.
//!
//! Paths spliced into remote commands go through [`shell::quote`].

pub mod builder;
pub mod context;
pub mod error;
pub mod executor;
pub mod package;
pub mod shell;
pub mod task;

// Re-export main types at crate root
pub use builder::Builder;
pub use context::{Context, SshKeyPair};
pub use error::{Result, TaskError};
pub use executor::{
    CommandOutput, Connector, Executor, HostTarget, MockConnector, MockExecutor, Rule,
};
pub use package::{MockSource, PackageCache, PackageSource, package_file_name};
pub use task::{BoxedTask, Parallel, Serial, Task, run};

//! # Topology
//!
//! Typed description of a database cluster: which roles run where, on which
//! ports, out of which directories.
//!
//! ## Core Concepts
//!
//! - **Role**: The kind of process an instance runs (coordinator, storage, compute, ...)
//! - **Instance**: One process placement on one host
//! - **Component**: All instances of one role, as yielded in start order
//! - **Specification**: The whole cluster; read-only input to operations
//! - **ComponentInfo**: A (role, version) pair used to key package downloads
//! - **NodeSet**: An immutable set of instance IDs
//!
//! ## Example
//!
//! ```
//! use topology::{Instance, Role, Specification};
//!
//! let spec = Specification::new(vec![
//!     Instance::new(Role::Storage, "10.0.0.2"),
//!     Instance::new(Role::Coordinator, "10.0.0.1"),
//! ])
//! .unwrap();
//!
//! let order: Vec<Role> = spec
//!     .components_by_start_order()
//!     .iter()
//!     .filter(|c| !c.is_empty())
//!     .map(|c| c.role())
//!     .collect();
//! assert_eq!(order, vec![Role::Coordinator, Role::Storage]);
//! ```
//!
//! Status polling goes through the [`StatusProbe`] trait so the crate stays
//! free of any network client.

pub mod error;
pub mod instance;
pub mod role;
pub mod set;
pub mod spec;

pub use error::{Error, Result};
pub use instance::{Instance, NO_DATA_DIR, StatusProbe};
pub use role::{ComponentInfo, Role};
pub use set::NodeSet;
pub use spec::{Component, HostAddr, Specification};

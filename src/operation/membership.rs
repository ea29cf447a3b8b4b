//! Graceful leave for roles that belong to the cluster's membership.
//!
//! Removing a coordinator, storage or replication-log node from a running
//! cluster means asking the cluster to migrate its data or leadership away
//! first. That protocol lives outside this tool; scale-in only calls this
//! hook and acts on its answer.

use std::fmt;
use taskgraph::Result;
use topology::{Instance, Specification};

/// Outcome of a graceful-leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The node has left; it can be stopped and destroyed
    Departed,
    /// Nothing was done; the node must be left running
    NotPerformed,
}

/// Asks the running cluster to let an instance leave.
pub trait MembershipLeave: Send + Sync + fmt::Debug {
    fn leave(&self, instance: &Instance, topology: &Specification) -> Result<LeaveOutcome>;
}

/// Placeholder used until a membership client is wired in.
///
/// Always reports [`LeaveOutcome::NotPerformed`], so async-offline
/// instances are left untouched by scale-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMembershipProtocol;

impl MembershipLeave for NoMembershipProtocol {
    fn leave(&self, _instance: &Instance, _topology: &Specification) -> Result<LeaveOutcome> {
        Ok(LeaveOutcome::NotPerformed)
    }
}

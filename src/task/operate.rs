use crate::operation::{OperationKind, Options, operate};
use taskgraph::{Context, Result, Task};
use topology::Specification;

/// Run a lifecycle operation across a whole cluster.
///
/// The per-instance graph is built when the task runs, from the topology
/// captured at construction.
#[derive(Debug, Clone)]
pub struct ClusterOperate {
    topology: Specification,
    kind: OperationKind,
    options: Options,
    user: String,
}

impl ClusterOperate {
    pub fn new(topology: Specification, kind: OperationKind, options: Options, user: &str) -> Self {
        Self {
            topology,
            kind,
            options,
            user: user.to_string(),
        }
    }
}

impl Task for ClusterOperate {
    fn execute(&self, ctx: &Context) -> Result<()> {
        operate::plan(self.kind, &self.topology, &self.options, &self.user).execute(ctx)
    }

    fn describe(&self) -> String {
        format!("{} cluster ({} instances)", self.kind, self.topology.len())
    }
}

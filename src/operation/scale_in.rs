//! Quorum-safe removal of instances from a cluster.

use super::lifecycle::{Lifecycle, Stage};
use super::membership::MembershipLeave;
use super::roles::{OfflineMode, RoleTable};
use super::{Cluster, OperationError, Options};
use crate::task::{BuilderExt, DESTROYED, LEFT_RUNNING, OfflineInstance};
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use taskgraph::{BoxedTask, Builder, Context, Serial};
use topology::{Instance, NodeSet, Role, Specification};

/// Stage reached after each top-level step of the scale-in graph
const STEP_STAGES: [Stage; 3] = [Stage::Validated, Stage::Validated, Stage::Applied];

/// Build the scale-in graph, or refuse before anything runs.
///
/// Instances are removed one at a time in start order. Sync-offline roles
/// are stopped then destroyed; async-offline roles go through
/// `membership` first.
pub fn plan(
    cluster: &Cluster,
    options: &Options,
    roles: &RoleTable,
    membership: &Arc<dyn MembershipLeave>,
) -> Result<Serial, OperationError> {
    let topology = &cluster.topology;
    let by_id: HashMap<String, Instance> = topology
        .instances()
        .into_iter()
        .map(|inst| (inst.id(), inst))
        .collect();

    let mut removing: BTreeMap<Role, usize> = BTreeMap::new();
    for id in options.deleted_nodes.iter() {
        let inst = by_id
            .get(id)
            .ok_or_else(|| OperationError::NodeNotFound(id.to_string()))?;
        *removing.entry(inst.role()).or_default() += 1;
    }

    for role in roles.critical_roles() {
        let removed = removing.get(&role).copied().unwrap_or(0);
        if removed > 0 && removed == topology.count(role) {
            return Err(OperationError::CannotRemoveAll(role));
        }
    }

    let mut removals: Vec<BoxedTask> = Vec::new();
    for inst in topology.instances() {
        if !options.deleted_nodes.contains(&inst.id()) {
            continue;
        }
        match roles.offline_mode(inst.role()) {
            OfflineMode::Sync => {
                let steps = Builder::new()
                    .stop_instance(&inst, !options.force)
                    .destroy_instance(&inst, &cluster.user)
                    .build();
                removals.push(Box::new(steps));
            }
            OfflineMode::Async => removals.push(Box::new(OfflineInstance::new(
                inst,
                &cluster.user,
                topology.clone(),
                Arc::clone(membership),
                !options.force,
            ))),
        }
    }

    Ok(Builder::new()
        .ssh_key_set(&cluster.keys.private_key, &cluster.keys.public_key)
        .cluster_ssh(topology, &cluster.user)
        .serial(removals)
        .build())
}

/// What a scale-in left behind.
///
/// `topology` drops every instance that was destroyed, including those
/// destroyed before a later removal failed.
#[derive(Debug)]
pub struct ScaleInOutcome {
    pub topology: Specification,
    pub result: Result<(), OperationError>,
}

impl ScaleInOutcome {
    /// The resulting topology, or the error that stopped the run
    pub fn into_result(self) -> Result<Specification, OperationError> {
        self.result.map(|()| self.topology)
    }
}

/// Remove `options.deleted_nodes` from `cluster`.
///
/// Async-offline instances the membership hook did not release stay in
/// the resulting topology. `ctx` must be fresh.
pub fn scale_in(
    ctx: &Context,
    cluster: &Cluster,
    options: &Options,
    roles: &RoleTable,
    membership: &Arc<dyn MembershipLeave>,
    jobs: Option<usize>,
) -> ScaleInOutcome {
    let mut lifecycle = Lifecycle::new("scale-in", STEP_STAGES.to_vec());

    let graph = match plan(cluster, options, roles, membership) {
        Ok(graph) => graph,
        Err(err) => {
            lifecycle.reject(&err);
            return ScaleInOutcome {
                topology: cluster.topology.clone(),
                result: Err(err),
            };
        }
    };
    lifecycle.validated();

    info!(
        "Scaling in cluster {}: removing {} instance(s)",
        cluster.name,
        options.deleted_nodes.len()
    );
    let result = taskgraph::run(&graph, ctx, jobs);
    lifecycle.finish(&result);

    let left = ctx.notes(LEFT_RUNNING);
    if !left.is_empty() {
        warn!(
            "{} instance(s) were not removed and are still running: {}",
            left.len(),
            left.join(", ")
        );
    }

    let destroyed: NodeSet = ctx.notes(DESTROYED).into_iter().collect();
    ScaleInOutcome {
        topology: cluster.topology.without(&destroyed),
        result: result.map_err(OperationError::from),
    }
}

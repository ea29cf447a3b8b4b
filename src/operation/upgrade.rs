//! Version-gated cluster upgrade.
//!
//! Downloads every needed package once, backs up and replaces the binaries
//! of every instance, then rolls the cluster onto them. Hosts whose
//! binaries were already replaced stay on the new version if a later step
//! fails.

use super::lifecycle::{Lifecycle, Stage};
use super::roles::RoleTable;
use super::version::check_upgrade;
use super::{Cluster, OperationError, OperationKind, Options};
use crate::task::{BuilderExt, Download};
use log::info;
use std::collections::HashSet;
use taskgraph::{BoxedTask, Builder, Context, Serial};
use topology::ComponentInfo;

/// Stage reached after each top-level step of the upgrade graph
const STEP_STAGES: [Stage; 5] = [
    Stage::Validated,
    Stage::Validated,
    Stage::Staged,
    Stage::Applied,
    Stage::Operated,
];

/// Build the upgrade graph, or refuse before anything runs.
pub fn plan(
    cluster: &Cluster,
    target: &str,
    options: &Options,
    roles: &RoleTable,
) -> Result<Serial, OperationError> {
    check_upgrade(&cluster.version, target)?;

    let mut seen = HashSet::new();
    let mut downloads: Vec<BoxedTask> = Vec::new();
    let mut replacements: Vec<BoxedTask> = Vec::new();

    for component in cluster.topology.components_by_start_order() {
        for inst in component.instances() {
            let version = roles
                .resolve_version(inst.role(), target)
                .ok_or(OperationError::UnsupportedComponent(inst.role()))?;

            let info = ComponentInfo::new(inst.role(), &version);
            if seen.insert(info.clone()) {
                downloads.push(Box::new(Download::from(info)));
            }

            let deploy_dir = inst.resolved_deploy_dir(&cluster.user);
            let pair = Builder::new()
                .backup_component(inst.role(), &cluster.version, inst.host(), &deploy_dir)
                .copy_component(inst.role(), &version, inst.host(), &deploy_dir)
                .build();
            replacements.push(Box::new(pair));
        }
    }

    Ok(Builder::new()
        .ssh_key_set(&cluster.keys.private_key, &cluster.keys.public_key)
        .cluster_ssh(&cluster.topology, &cluster.user)
        .parallel(downloads)
        .parallel(replacements)
        .cluster_operate(&cluster.topology, OperationKind::Upgrade, options, &cluster.user)
        .build())
}

/// Upgrade `cluster` to `target`.
///
/// `ctx` must be fresh: no executors or keys from an earlier operation.
pub fn upgrade(
    ctx: &Context,
    cluster: &Cluster,
    target: &str,
    options: &Options,
    roles: &RoleTable,
    jobs: Option<usize>,
) -> Result<(), OperationError> {
    let mut lifecycle = Lifecycle::new("upgrade", STEP_STAGES.to_vec());

    let graph = match plan(cluster, target, options, roles) {
        Ok(graph) => graph,
        Err(err) => {
            lifecycle.reject(&err);
            return Err(err);
        }
    };
    lifecycle.validated();

    info!(
        "Upgrading cluster {} from {} to {target}",
        cluster.name, cluster.version
    );
    let result = taskgraph::run(&graph, ctx, jobs);
    lifecycle.finish(&result);
    result?;

    info!("Upgraded cluster {} to {target}", cluster.name);
    Ok(())
}

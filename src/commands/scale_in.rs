use anyhow::{Context as _, Result, bail};
use std::sync::Arc;
use topology::NodeSet;

use super::Runtime;
use crate::cli::ScaleInArgs;
use crate::meta::ClusterMeta;
use crate::operation::{self, MembershipLeave, NoMembershipProtocol, Options, RoleTable};
use crate::task::LEFT_RUNNING;
use crate::ui;

pub fn run(rt: &Runtime, args: ScaleInArgs) -> Result<()> {
    let (meta, cluster) = rt.cluster(&args.cluster)?;
    let nodes = NodeSet::new(args.nodes);

    ui::header(&format!("Scale in {}", args.cluster));
    for id in nodes.iter() {
        let role = cluster
            .topology
            .find(id)
            .map_or("unknown", |inst| inst.component_name());
        ui::kv(id, role);
    }

    if !ui::confirm("Remove these instances?", args.yes)? {
        bail!("Aborted");
    }

    let options = Options {
        force: args.force,
        deleted_nodes: nodes,
    };
    let membership: Arc<dyn MembershipLeave> = Arc::new(NoMembershipProtocol);
    let ctx = rt.context()?;
    let outcome = operation::scale_in(
        &ctx,
        &cluster,
        &options,
        &RoleTable::default(),
        &membership,
        rt.jobs(),
    );

    // Destroyed instances are gone even when a later removal failed
    let removed = cluster.topology.len() - outcome.topology.len();
    if removed > 0 {
        rt.save(
            &args.cluster,
            &ClusterMeta {
                topology: outcome.topology,
                ..meta
            },
        )?;
    }
    outcome
        .result
        .with_context(|| format!("Failed to scale in cluster '{}'", args.cluster))?;

    for id in ctx.notes(LEFT_RUNNING) {
        ui::warn(&format!("{id} needs a graceful leave and was left running"));
    }
    ui::success(&format!(
        "Removed {removed} instance(s) from cluster '{}'",
        args.cluster
    ));
    Ok(())
}

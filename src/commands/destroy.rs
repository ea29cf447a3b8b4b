use anyhow::{Context as _, Result, bail};
use std::fs;

use super::Runtime;
use crate::cli::DestroyArgs;
use crate::operation::{OperationKind, Options, operate};
use crate::ui;

/// Stop every instance, remove its files on the hosts, then forget the cluster
pub fn run(rt: &Runtime, args: DestroyArgs) -> Result<()> {
    let (_, cluster) = rt.cluster(&args.cluster)?;

    ui::header(&format!("Destroy {}", args.cluster));
    ui::kv("Instances", &cluster.topology.len().to_string());
    ui::kv("Hosts", &cluster.topology.hosts().len().to_string());

    if !ui::confirm("Remove every instance and its data?", args.yes)? {
        bail!("Aborted");
    }

    let options = Options {
        force: args.force,
        ..Options::default()
    };
    let ctx = rt.context()?;
    operate::run(&ctx, &cluster, OperationKind::Destroy, &options, rt.jobs())
        .with_context(|| format!("Failed to destroy cluster '{}'", args.cluster))?;

    let dir = rt.profile.cluster_dir(&args.cluster);
    fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;

    ui::success(&format!("Destroyed cluster '{}'", args.cluster));
    Ok(())
}

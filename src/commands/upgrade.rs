use anyhow::{Context as _, Result};

use super::Runtime;
use crate::cli::UpgradeArgs;
use crate::meta::ClusterMeta;
use crate::operation::{self, Options, RoleTable};
use crate::ui;

pub fn run(rt: &Runtime, args: UpgradeArgs) -> Result<()> {
    rt.settings.mirror(&rt.profile)?;
    let (meta, cluster) = rt.cluster(&args.cluster)?;

    ui::header(&format!("Upgrade {}", args.cluster));
    ui::kv("From", &cluster.version);
    ui::kv("To", &args.target_version);
    ui::kv("Instances", &cluster.topology.len().to_string());

    let options = Options {
        force: args.force,
        ..Options::default()
    };
    let ctx = rt.context()?;
    let result = operation::upgrade(
        &ctx,
        &cluster,
        &args.target_version,
        &options,
        &RoleTable::default(),
        rt.jobs(),
    );
    if result.as_ref().is_err_and(|err| !err.is_validation()) {
        ui::warn("Some hosts may already run the new binaries; nothing was rolled back");
    }
    result.with_context(|| format!("Failed to upgrade cluster '{}'", args.cluster))?;

    let upgraded = ClusterMeta {
        version: args.target_version.clone(),
        ..meta
    };
    rt.save(&args.cluster, &upgraded)?;

    ui::success(&format!(
        "Upgraded cluster '{}' to {}",
        args.cluster, args.target_version
    ));
    Ok(())
}

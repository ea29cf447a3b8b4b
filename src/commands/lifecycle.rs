use anyhow::{Context as _, Result};

use super::Runtime;
use crate::operation::{OperationKind, Options, operate};
use crate::ui;

/// Start, stop or restart every instance of `name`
pub fn run(rt: &Runtime, name: &str, kind: OperationKind, force: bool) -> Result<()> {
    let (_, cluster) = rt.cluster(name)?;
    let options = Options {
        force,
        ..Options::default()
    };

    let ctx = rt.context()?;
    operate::run(&ctx, &cluster, kind, &options, rt.jobs())
        .with_context(|| format!("Failed to {kind} cluster '{name}'"))?;

    ui::success(&format!("{kind} of cluster '{name}' done"));
    Ok(())
}

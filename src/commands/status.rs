use anyhow::Result;
use rayon::prelude::*;
use topology::Instance;

use super::Runtime;
use crate::status::HttpProbe;
use crate::ui;

const COLUMNS: [&str; 7] = ["ID", "Role", "Host", "Ports", "Status", "Data Dir", "Deploy Dir"];
const STATUS_COLUMN: usize = 4;

fn row(inst: &Instance, user: &str, status: String) -> Vec<String> {
    let ports = inst
        .used_ports()
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join("/");
    let data_dir = inst
        .resolved_data_dir(user)
        .unwrap_or_else(|| topology::NO_DATA_DIR.to_string());
    vec![
        inst.id(),
        inst.component_name().to_string(),
        inst.host().to_string(),
        ports,
        status,
        data_dir,
        inst.resolved_deploy_dir(user),
    ]
}

pub fn run(rt: &Runtime, name: &str) -> Result<()> {
    let (meta, cluster) = rt.cluster(name)?;
    let probe = HttpProbe::new(rt.ssh_timeout());
    let endpoints = cluster.topology.coordinator_endpoints();

    let instances = cluster.topology.instances();
    let rows: Vec<Vec<String>> = instances
        .par_iter()
        .map(|inst| row(inst, &cluster.user, inst.status(&probe, &endpoints)))
        .collect();

    ui::header(&format!("Cluster {name}"));
    ui::kv("Version", &meta.version);
    ui::kv("User", &meta.user);
    println!();

    let mut table = vec![COLUMNS.iter().map(ToString::to_string).collect::<Vec<_>>()];
    table.extend(rows.iter().cloned());
    let widths = ui::widths(&table);

    println!("{}", ui::row(&COLUMNS, &widths));
    for cells in &rows {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &width))| {
                let padded = format!("{cell:<width$}");
                if i == STATUS_COLUMN {
                    ui::paint_status(&padded).to_string()
                } else {
                    padded
                }
            })
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
    Ok(())
}

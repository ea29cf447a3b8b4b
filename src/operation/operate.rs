//! Per-instance graphs for cluster-wide lifecycle actions.

use super::{Cluster, OperationError, OperationKind, Options};
use crate::task::{BuilderExt, DestroyInstance, StartInstance, StopInstance};
use log::info;
use taskgraph::{BoxedTask, Builder, Context, Parallel, Serial};
use topology::{Component, Specification};

/// Connect to every host of `cluster` and run `kind` over it.
pub fn run(
    ctx: &Context,
    cluster: &Cluster,
    kind: OperationKind,
    options: &Options,
    jobs: Option<usize>,
) -> Result<(), OperationError> {
    let graph = Builder::new()
        .ssh_key_set(&cluster.keys.private_key, &cluster.keys.public_key)
        .cluster_ssh(&cluster.topology, &cluster.user)
        .cluster_operate(&cluster.topology, kind, options, &cluster.user)
        .build();

    info!("Running {kind} on cluster {}", cluster.name);
    taskgraph::run(&graph, ctx, jobs)?;
    Ok(())
}

/// Build the graph running `kind` over every instance of `topology`.
///
/// Components start in start order and stop in reverse, one component at
/// a time with its instances in parallel. Upgrades roll through instances
/// one by one.
pub fn plan(kind: OperationKind, topology: &Specification, options: &Options, user: &str) -> Serial {
    let components = topology.components_by_start_order();
    match kind {
        OperationKind::Start => start(&components),
        OperationKind::Stop => stop(&components, options.force),
        OperationKind::Restart => Builder::new()
            .step(stop(&components, options.force))
            .step(start(&components))
            .build(),
        OperationKind::Upgrade => rolling_restart(&components, options.force),
        OperationKind::Destroy => Builder::new()
            .step(stop(&components, options.force))
            .step(destroy(&components, user))
            .build(),
    }
}

fn per_component<F>(components: impl Iterator<Item = Component>, task: F) -> Serial
where
    F: Fn(&topology::Instance) -> BoxedTask,
{
    let groups = components
        .filter(|component| !component.is_empty())
        .map(|component| {
            let tasks = component.instances().iter().map(&task).collect();
            Box::new(Parallel::new(tasks)) as BoxedTask
        })
        .collect();
    Serial::new(groups)
}

fn start(components: &[Component]) -> Serial {
    per_component(components.iter().cloned(), |inst| {
        Box::new(StartInstance::new(inst.clone()))
    })
}

fn stop(components: &[Component], force: bool) -> Serial {
    per_component(components.iter().rev().cloned(), |inst| {
        Box::new(StopInstance::new(inst.clone(), !force))
    })
}

fn destroy(components: &[Component], user: &str) -> Serial {
    per_component(components.iter().rev().cloned(), |inst| {
        Box::new(DestroyInstance::new(inst.clone(), user))
    })
}

fn rolling_restart(components: &[Component], force: bool) -> Serial {
    let steps = components
        .iter()
        .flat_map(|component| component.instances().to_vec())
        .map(|inst| {
            Box::new(
                Builder::new()
                    .step(StopInstance::new(inst.clone(), !force))
                    .step(StartInstance::new(inst))
                    .build(),
            ) as BoxedTask
        })
        .collect();
    Serial::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taskgraph::{MockConnector, MockExecutor, MockSource, PackageCache, Task};
    use topology::{Instance, Role};

    fn topology() -> Specification {
        Specification::new(vec![
            Instance::new(Role::Compute, "h1"),
            Instance::new(Role::Storage, "h1"),
            Instance::new(Role::Coordinator, "h1"),
        ])
        .unwrap()
    }

    fn execute_plan(kind: OperationKind, options: &Options) -> Vec<String> {
        let ctx = Context::new(
            Arc::new(MockConnector::new()),
            PackageCache::new(std::env::temp_dir(), Arc::new(MockSource::new())),
        );
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());
        plan(kind, &topology(), options, "tidb").execute(&ctx).unwrap();
        executor.calls()
    }

    #[test]
    fn test_start_follows_start_order() {
        let calls = execute_plan(OperationKind::Start, &Options::default());
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("coordinator-2379"));
        assert!(calls[1].contains("storage-20160"));
        assert!(calls[2].contains("compute-4000"));
    }

    #[test]
    fn test_stop_reverses_order() {
        let calls = execute_plan(OperationKind::Stop, &Options::default());
        assert!(calls[0].contains("systemctl stop compute-4000"));
        assert!(calls[2].contains("systemctl stop coordinator-2379"));
    }

    #[test]
    fn test_upgrade_rolls_one_instance_at_a_time() {
        let calls = execute_plan(OperationKind::Upgrade, &Options::default());
        assert_eq!(calls.len(), 6);
        assert!(calls[0].contains("stop coordinator-2379"));
        assert!(calls[1].contains("start coordinator-2379"));
        assert!(calls[2].contains("stop storage-20160"));
        assert!(calls[3].contains("start storage-20160"));
    }

    #[test]
    fn test_force_kills() {
        let options = Options {
            force: true,
            ..Options::default()
        };
        let calls = execute_plan(OperationKind::Stop, &options);
        assert!(calls.iter().all(|call| call.contains("SIGKILL")));
    }

    #[test]
    fn test_destroy_stops_first() {
        let calls = execute_plan(OperationKind::Destroy, &Options::default());
        assert_eq!(calls.len(), 6);
        assert!(calls[..3].iter().all(|call| call.contains("systemctl stop")));
        assert!(calls[3..].iter().all(|call| call.contains("rm -rf")));
    }

    #[test]
    fn test_run_connects_before_operating() {
        let connector = Arc::new(MockConnector::new());
        let ctx = Context::new(
            connector.clone(),
            PackageCache::new(std::env::temp_dir(), Arc::new(MockSource::new())),
        );
        let cluster = Cluster {
            name: "prod".into(),
            user: "tidb".into(),
            version: "v4.0.0".into(),
            topology: topology(),
            keys: taskgraph::SshKeyPair::new("/k/id_rsa", "/k/id_rsa.pub"),
        };

        run(&ctx, &cluster, OperationKind::Restart, &Options::default(), Some(2)).unwrap();

        let calls = connector.calls_on("h1");
        assert_eq!(calls[0], "connect tidb@h1:22");
        assert_eq!(calls.len(), 7);
    }

    #[test]
    fn test_empty_components_are_skipped() {
        let serial = plan(OperationKind::Start, &topology(), &Options::default(), "tidb");
        assert_eq!(serial.len(), 3);
    }
}

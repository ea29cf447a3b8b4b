use crate::operation::{LeaveOutcome, MembershipLeave};
use log::{debug, warn};
use std::sync::Arc;
use taskgraph::{Context, Result, Task, shell};
use topology::{Instance, Specification};

/// Context note key listing the IDs of destroyed instances
pub const DESTROYED: &str = "destroyed";

/// Context note key listing the IDs of instances left running because
/// they could not leave the cluster gracefully
pub const LEFT_RUNNING: &str = "left-running";

/// Start one instance's service unit
#[derive(Debug, Clone)]
pub struct StartInstance {
    instance: Instance,
}

impl StartInstance {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }

    pub fn command(instance: &Instance) -> String {
        format!(
            "systemctl daemon-reload && systemctl start {}",
            instance.service_name()
        )
    }
}

impl Task for StartInstance {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let executor = ctx.executor(self.instance.host())?;
        executor.run_checked(&Self::command(&self.instance), true)?;
        debug!("Started {}", self.instance.id());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("start {} {}", self.instance.role(), self.instance.id())
    }
}

/// Stop one instance's service unit.
///
/// A forced stop kills the process outright instead of letting it hand
/// over leadership.
#[derive(Debug, Clone)]
pub struct StopInstance {
    instance: Instance,
    graceful: bool,
}

impl StopInstance {
    pub fn new(instance: Instance, graceful: bool) -> Self {
        Self { instance, graceful }
    }

    pub fn command(instance: &Instance, graceful: bool) -> String {
        let service = instance.service_name();
        if graceful {
            format!("systemctl stop {service}")
        } else {
            format!("systemctl kill --signal=SIGKILL {service}; systemctl stop {service}")
        }
    }
}

impl Task for StopInstance {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let executor = ctx.executor(self.instance.host())?;
        executor.run_checked(&Self::command(&self.instance, self.graceful), true)?;
        debug!("Stopped {}", self.instance.id());
        Ok(())
    }

    fn describe(&self) -> String {
        let verb = if self.graceful { "stop" } else { "kill" };
        format!("{verb} {} {}", self.instance.role(), self.instance.id())
    }
}

/// Remove one instance's deploy and data directories and its service unit.
#[derive(Debug, Clone)]
pub struct DestroyInstance {
    instance: Instance,
    user: String,
}

impl DestroyInstance {
    pub fn new(instance: Instance, user: &str) -> Self {
        Self {
            instance,
            user: user.to_string(),
        }
    }

    pub fn command(instance: &Instance, user: &str) -> String {
        let mut paths = vec![instance.resolved_deploy_dir(user)];
        paths.extend(instance.resolved_data_dir(user));
        paths.push(format!("/etc/systemd/system/{}", instance.service_name()));
        format!("rm -rf {} && systemctl daemon-reload", shell::join(&paths))
    }
}

impl Task for DestroyInstance {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let executor = ctx.executor(self.instance.host())?;
        executor.run_checked(&Self::command(&self.instance, &self.user), true)?;
        ctx.note(DESTROYED, self.instance.id());
        debug!("Destroyed {}", self.instance.id());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("destroy {} {}", self.instance.role(), self.instance.id())
    }
}

/// Take an async-offline instance out of the cluster.
///
/// The instance is only stopped and destroyed once the membership hook
/// reports that it has departed; otherwise it is left running.
#[derive(Debug, Clone)]
pub struct OfflineInstance {
    instance: Instance,
    user: String,
    topology: Specification,
    membership: Arc<dyn MembershipLeave>,
    graceful: bool,
}

impl OfflineInstance {
    pub fn new(
        instance: Instance,
        user: &str,
        topology: Specification,
        membership: Arc<dyn MembershipLeave>,
        graceful: bool,
    ) -> Self {
        Self {
            instance,
            user: user.to_string(),
            topology,
            membership,
            graceful,
        }
    }
}

impl Task for OfflineInstance {
    fn execute(&self, ctx: &Context) -> Result<()> {
        match self.membership.leave(&self.instance, &self.topology)? {
            LeaveOutcome::Departed => {
                StopInstance::new(self.instance.clone(), self.graceful).execute(ctx)?;
                DestroyInstance::new(self.instance.clone(), &self.user).execute(ctx)
            }
            LeaveOutcome::NotPerformed => {
                warn!(
                    "{} {} must leave the cluster gracefully before removal; left running",
                    self.instance.role(),
                    self.instance.id()
                );
                ctx.note(LEFT_RUNNING, self.instance.id());
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        format!("offline {} {}", self.instance.role(), self.instance.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::NoMembershipProtocol;
    use taskgraph::{MockConnector, MockExecutor, MockSource, PackageCache, Rule, TaskError};
    use topology::Role;

    fn context() -> Context {
        Context::new(
            Arc::new(MockConnector::new()),
            PackageCache::new(std::env::temp_dir(), Arc::new(MockSource::new())),
        )
    }

    #[derive(Debug)]
    struct AlwaysDeparts;

    impl MembershipLeave for AlwaysDeparts {
        fn leave(&self, _instance: &Instance, _topology: &Specification) -> Result<LeaveOutcome> {
            Ok(LeaveOutcome::Departed)
        }
    }

    fn storage() -> Instance {
        Instance::new(Role::Storage, "h1").with_data_dir("/data/storage")
    }

    #[test]
    fn test_commands() {
        let inst = storage();
        assert_eq!(
            StartInstance::command(&inst),
            "systemctl daemon-reload && systemctl start storage-20160.service"
        );
        assert_eq!(StopInstance::command(&inst, true), "systemctl stop storage-20160.service");
        assert!(StopInstance::command(&inst, false).contains("SIGKILL"));
        assert_eq!(
            DestroyInstance::command(&inst, "tidb"),
            "rm -rf /home/tidb/deploy/storage-20160 /data/storage \
             /etc/systemd/system/storage-20160.service && systemctl daemon-reload"
        );
    }

    #[test]
    fn test_destroy_quotes_paths() {
        let inst = Instance::new(Role::Compute, "h1")
            .with_deploy_dir("/data/tidb deploy")
            .with_data_dir("/data/$(id)");
        assert_eq!(
            DestroyInstance::command(&inst, "tidb"),
            "rm -rf '/data/tidb deploy' '/data/$(id)' \
             /etc/systemd/system/compute-4000.service && systemctl daemon-reload"
        );
    }

    #[test]
    fn test_destroy_records_note() {
        let ctx = context();
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());

        DestroyInstance::new(storage(), "tidb").execute(&ctx).unwrap();

        assert_eq!(ctx.notes(DESTROYED), vec!["h1:20160"]);
        assert!(executor.calls()[0].starts_with("sudo rm -rf"));
    }

    #[test]
    fn test_failed_stop_is_reported() {
        let ctx = context();
        ctx.insert_executor(
            "h1",
            Arc::new(MockExecutor::new("h1", vec![Rule::fail("systemctl stop", "unit busy")])),
        );

        let err = StopInstance::new(storage(), true).execute(&ctx).unwrap_err();
        assert!(matches!(err, TaskError::Command { stderr, .. } if stderr == "unit busy"));
    }

    #[test]
    fn test_offline_without_protocol_leaves_instance() {
        let ctx = context();
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());
        let topology = Specification::new(vec![storage()]).unwrap();

        OfflineInstance::new(storage(), "tidb", topology, Arc::new(NoMembershipProtocol), true)
            .execute(&ctx)
            .unwrap();

        assert!(executor.calls().is_empty());
        assert_eq!(ctx.notes(LEFT_RUNNING), vec!["h1:20160"]);
        assert!(ctx.notes(DESTROYED).is_empty());
    }

    #[test]
    fn test_offline_after_departure_stops_then_destroys() {
        let ctx = context();
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());
        let topology = Specification::new(vec![storage()]).unwrap();

        OfflineInstance::new(storage(), "tidb", topology, Arc::new(AlwaysDeparts), true)
            .execute(&ctx)
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("systemctl stop"));
        assert!(calls[1].contains("rm -rf"));
        assert_eq!(ctx.notes(DESTROYED), vec!["h1:20160"]);
    }
}

use log::debug;
use std::path::PathBuf;
use taskgraph::{BoxedTask, Context, HostTarget, Parallel, Result, SshKeyPair, Task};
use topology::Specification;

/// Record the cluster's SSH key pair in the context
#[derive(Debug, Clone)]
pub struct SshKeySet {
    keys: SshKeyPair,
}

impl SshKeySet {
    pub fn new(private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self {
        Self {
            keys: SshKeyPair::new(private_key, public_key),
        }
    }
}

impl Task for SshKeySet {
    fn execute(&self, ctx: &Context) -> Result<()> {
        ctx.set_ssh_keys(self.keys.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("set SSH key {}", self.keys.private_key.display())
    }
}

/// Open an executor for every distinct host of a topology.
///
/// Hosts are connected concurrently; running it again refreshes the
/// context's entries.
#[derive(Debug, Clone)]
pub struct ClusterSsh {
    targets: Vec<HostTarget>,
}

impl ClusterSsh {
    pub fn new(topology: &Specification, user: &str) -> Self {
        let targets = topology
            .hosts()
            .into_iter()
            .map(|addr| HostTarget {
                host: addr.host,
                port: addr.ssh_port,
                user: user.to_string(),
            })
            .collect();
        Self { targets }
    }
}

impl Task for ClusterSsh {
    fn execute(&self, ctx: &Context) -> Result<()> {
        // fail before fanning out if the key pair is missing
        ctx.ssh_keys()?;

        let connects: Vec<BoxedTask> = self
            .targets
            .iter()
            .map(|target| Box::new(ConnectHost(target.clone())) as BoxedTask)
            .collect();
        Parallel::new(connects).execute(ctx)
    }

    fn describe(&self) -> String {
        format!("connect to {} hosts", self.targets.len())
    }
}

#[derive(Debug)]
struct ConnectHost(HostTarget);

impl Task for ConnectHost {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let keys = ctx.ssh_keys()?;
        let executor = ctx.connector().connect(&self.0, &keys)?;
        debug!("Connected to {}", self.0.host);
        ctx.insert_executor(self.0.host.clone(), executor);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("connect {}@{}:{}", self.0.user, self.0.host, self.0.port)
    }
}

//! Remote execution over the system `ssh` and `scp` binaries.

use crate::runner;
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskgraph::{
    CommandOutput, Connector, Executor, HostTarget, Result, SshKeyPair, TaskError, shell,
};

/// Opens [`SshExecutor`]s, checking each host with a no-op command.
#[derive(Debug, Clone)]
pub struct SshConnector {
    timeout_secs: u64,
}

impl SshConnector {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Connector for SshConnector {
    fn connect(&self, target: &HostTarget, keys: &SshKeyPair) -> Result<Arc<dyn Executor>> {
        let executor = SshExecutor {
            target: target.clone(),
            identity: keys.private_key.clone(),
            timeout_secs: self.timeout_secs,
        };

        let probe = executor.execute("true", false)?;
        if !probe.success {
            return Err(TaskError::Connect {
                host: target.host.clone(),
                message: probe.stderr_str().trim().to_string(),
            });
        }
        debug!("SSH to {}@{}:{} ok", target.user, target.host, target.port);
        Ok(Arc::new(executor))
    }
}

#[derive(Debug)]
pub struct SshExecutor {
    target: HostTarget,
    identity: PathBuf,
    timeout_secs: u64,
}

impl SshExecutor {
    /// Options shared by ssh and scp; they differ only in the port flag.
    fn common_args(&self, port_flag: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.identity.display().to_string(),
            port_flag.to_string(),
            self.target.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.timeout_secs),
        ]
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.target.user, self.target.host)
    }

    fn ssh_args(&self, command: &str, sudo: bool) -> Vec<String> {
        let mut args = self.common_args("-p");
        args.push(self.destination());
        args.push(if sudo {
            format!("sudo -H bash -c {}", shell::quote(command))
        } else {
            command.to_string()
        });
        args
    }

    fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut args = self.common_args("-P");
        args.push(local.display().to_string());
        args.push(format!("{}:{remote}", self.destination()));
        args
    }
}

impl Executor for SshExecutor {
    fn host(&self) -> &str {
        &self.target.host
    }

    fn execute(&self, command: &str, sudo: bool) -> Result<CommandOutput> {
        trace!("{} $ {command}", self.target.host);
        runner::capture("ssh", &self.ssh_args(command, sudo)).map_err(|e| TaskError::Connect {
            host: self.target.host.clone(),
            message: format!("failed to run ssh: {e}"),
        })
    }

    fn transfer(&self, local: &Path, remote: &str) -> Result<()> {
        trace!("{} <- {}", self.target.host, local.display());
        let output = runner::capture("scp", &self.scp_args(local, remote)).map_err(|e| {
            TaskError::Transfer {
                host: self.target.host.clone(),
                local: local.to_path_buf(),
                remote: remote.to_string(),
                message: format!("failed to run scp: {e}"),
            }
        })?;

        if output.success {
            Ok(())
        } else {
            Err(TaskError::Transfer {
                host: self.target.host.clone(),
                local: local.to_path_buf(),
                remote: remote.to_string(),
                message: output.stderr_str().trim().to_string(),
            })
        }
    }
}

//! Host executors and the connector that opens them.
//!
//! These traits allow the engine to be used without depending on a
//! specific SSH implementation.

use crate::context::{SshKeyPair, lock};
use crate::error::{Result, TaskError};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::process::Output;
use std::sync::{Arc, Mutex};

/// Output from a command run on a host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            success: true,
        }
    }

    /// A failed run with the given stderr
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            success: false,
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Runs commands on one host.
///
/// Timeouts and retries are the implementation's business; the engine
/// never retries.
pub trait Executor: Send + Sync + fmt::Debug {
    /// The host this executor is bound to
    fn host(&self) -> &str;

    /// Run a shell command, optionally with elevated privileges
    fn execute(&self, command: &str, sudo: bool) -> Result<CommandOutput>;

    /// Copy a local file to a remote path
    fn transfer(&self, local: &Path, remote: &str) -> Result<()>;

    /// Run a command and capture stdout, failing on a non-zero exit
    fn run_checked(&self, command: &str, sudo: bool) -> Result<String> {
        let output = self.execute(command, sudo)?;
        if !output.success {
            return Err(TaskError::Command {
                host: self.host().to_string(),
                command: command.to_string(),
                stderr: output.stderr_str().trim().to_string(),
            });
        }
        Ok(output.stdout_str())
    }
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
}

/// Opens executors for hosts.
pub trait Connector: Send + Sync {
    /// Open and validate an executor for `target` using `keys`
    fn connect(&self, target: &HostTarget, keys: &SshKeyPair) -> Result<Arc<dyn Executor>>;
}

/// Canned response for mock commands whose text contains `pattern`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: String,
    pub output: CommandOutput,
}

impl Rule {
    /// Commands containing `pattern` fail with `stderr`
    pub fn fail(pattern: impl Into<String>, stderr: &str) -> Self {
        Self {
            pattern: pattern.into(),
            output: CommandOutput::failed(stderr),
        }
    }

    /// Commands containing `pattern` return `output`
    pub fn respond(pattern: impl Into<String>, output: CommandOutput) -> Self {
        Self {
            pattern: pattern.into(),
            output,
        }
    }
}

type Journal = Arc<Mutex<Vec<(String, String)>>>;

/// In-memory executor that records every call.
///
/// Commands succeed with empty output unless a [`Rule`] matches; the first
/// matching rule wins.
#[derive(Debug)]
pub struct MockExecutor {
    host: String,
    rules: Vec<Rule>,
    journal: Journal,
}

impl MockExecutor {
    pub fn new(host: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            host: host.into(),
            rules,
            journal: Arc::default(),
        }
    }

    /// Everything this executor has been asked to do, in order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.journal)
            .iter()
            .filter(|(host, _)| host == &self.host)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    fn record(&self, entry: String) -> CommandOutput {
        let output = self
            .rules
            .iter()
            .find(|rule| entry.contains(&rule.pattern))
            .map(|rule| rule.output.clone())
            .unwrap_or_else(|| CommandOutput::ok(Vec::new()));
        lock(&self.journal).push((self.host.clone(), entry));
        output
    }
}

impl Executor for MockExecutor {
    fn host(&self) -> &str {
        &self.host
    }

    fn execute(&self, command: &str, sudo: bool) -> Result<CommandOutput> {
        let entry = if sudo {
            format!("sudo {command}")
        } else {
            command.to_string()
        };
        Ok(self.record(entry))
    }

    fn transfer(&self, local: &Path, remote: &str) -> Result<()> {
        let output = self.record(format!("transfer {} -> {remote}", local.display()));
        if output.success {
            Ok(())
        } else {
            Err(TaskError::Transfer {
                host: self.host.clone(),
                local: local.to_path_buf(),
                remote: remote.to_string(),
                message: output.stderr_str(),
            })
        }
    }
}

/// Connector handing out [`MockExecutor`]s that share one journal.
#[derive(Debug, Default)]
pub struct MockConnector {
    rules: Vec<Rule>,
    unreachable: HashSet<String>,
    journal: Journal,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `rule` on every host
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Make connecting to `host` fail
    pub fn with_unreachable(mut self, host: impl Into<String>) -> Self {
        self.unreachable.insert(host.into());
        self
    }

    /// Every call on every host, in order, as (host, entry)
    pub fn journal(&self) -> Vec<(String, String)> {
        lock(&self.journal).clone()
    }

    /// Calls made on one host, in order
    pub fn calls_on(&self, host: &str) -> Vec<String> {
        lock(&self.journal)
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Calls on any host whose text contains `needle`
    pub fn calls_matching(&self, needle: &str) -> Vec<(String, String)> {
        lock(&self.journal)
            .iter()
            .filter(|(_, entry)| entry.contains(needle))
            .cloned()
            .collect()
    }
}

impl Connector for MockConnector {
    fn connect(&self, target: &HostTarget, _keys: &SshKeyPair) -> Result<Arc<dyn Executor>> {
        if self.unreachable.contains(&target.host) {
            return Err(TaskError::Connect {
                host: target.host.clone(),
                message: "connection refused".to_string(),
            });
        }
        let executor = MockExecutor {
            host: target.host.clone(),
            rules: self.rules.clone(),
            journal: Arc::clone(&self.journal),
        };
        executor.record(format!("connect {}@{}:{}", target.user, target.host, target.port));
        Ok(Arc::new(executor))
    }
}

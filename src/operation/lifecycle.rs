//! Forward-only lifecycle of a cluster operation.
//!
//! `Planned → Validated → Staged → Applied → Operated → Done`, with any
//! stage able to drop into `Failed`. There is no way back.

use log::{debug, info, warn};
use std::fmt;
use taskgraph::TaskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Planned,
    /// Safety checks passed
    Validated,
    /// Downloads and backups done
    Staged,
    /// Copies and destroys done
    Applied,
    /// Cluster instructed to take effect
    Operated,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planned => "planned",
            Self::Validated => "validated",
            Self::Staged => "staged",
            Self::Applied => "applied",
            Self::Operated => "operated",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks one operation through its stages.
///
/// `step_stages[i]` is the stage reached once step `i` of the operation's
/// top-level serial graph has completed.
#[derive(Debug)]
pub struct Lifecycle {
    operation: &'static str,
    stage: Stage,
    step_stages: Vec<Stage>,
    failed_during: Option<Stage>,
}

impl Lifecycle {
    pub fn new(operation: &'static str, step_stages: Vec<Stage>) -> Self {
        info!("{operation}: {}", Stage::Planned);
        Self {
            operation,
            stage: Stage::Planned,
            step_stages,
            failed_during: None,
        }
    }

    #[cfg(test)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stage that was being worked towards when the operation failed
    #[cfg(test)]
    pub fn failed_during(&self) -> Option<Stage> {
        self.failed_during
    }

    fn advance(&mut self, next: Stage) {
        if next <= self.stage || self.stage == Stage::Failed {
            debug!("{}: ignoring transition {} -> {next}", self.operation, self.stage);
            return;
        }
        info!("{}: {} -> {next}", self.operation, self.stage);
        self.stage = next;
    }

    /// Mark the safety checks as passed
    pub fn validated(&mut self) {
        self.advance(Stage::Validated);
    }

    /// Record a failure before any step ran
    pub fn reject(&mut self, reason: &dyn fmt::Display) {
        warn!("{}: rejected while {}: {reason}", self.operation, self.stage);
        self.failed_during = Some(Stage::Validated);
        self.stage = Stage::Failed;
    }

    /// Record the outcome of executing the operation's graph
    pub fn finish(&mut self, result: &Result<(), TaskError>) {
        match result {
            Ok(()) => {
                for stage in self.step_stages.clone() {
                    self.advance(stage);
                }
                self.advance(Stage::Done);
            }
            Err(err) => {
                let failed_step = err.stage_path().first().copied().unwrap_or(0);
                let reached = self.step_stages[..failed_step.min(self.step_stages.len())].to_vec();
                for stage in reached {
                    self.advance(stage);
                }
                let during = self
                    .step_stages
                    .get(failed_step)
                    .copied()
                    .unwrap_or(self.stage);
                warn!(
                    "{}: failed after reaching {} while working towards {during}; \
                     changes already applied to hosts are not rolled back",
                    self.operation, self.stage
                );
                self.failed_during = Some(during);
                self.stage = Stage::Failed;
            }
        }
    }
}

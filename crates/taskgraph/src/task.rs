//! Task trait and the two composites, serial and parallel.

use crate::context::Context;
use crate::error::{Result, TaskError};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;

/// A unit of work.
///
/// Tasks capture everything they need at build time and receive the shared
/// context at execution time. They must be `Send + Sync` because parallel
/// groups run their children on a thread pool.
pub trait Task: Send + Sync + fmt::Debug {
    /// Run the task
    fn execute(&self, ctx: &Context) -> Result<()>;

    /// Human-readable description, used to annotate failures
    fn describe(&self) -> String;
}

/// A boxed task for type-erased storage
pub type BoxedTask = Box<dyn Task>;

/// Children run one after another; the first failure aborts the rest.
#[derive(Debug, Default)]
pub struct Serial {
    steps: Vec<BoxedTask>,
}

impl Serial {
    pub fn new(steps: Vec<BoxedTask>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[BoxedTask] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Task for Serial {
    fn execute(&self, ctx: &Context) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            let name = step.describe();
            debug!("Stage {index}: {name}");
            if let Err(source) = step.execute(ctx) {
                info!("Stage {index} ({name}) failed, aborting");
                return Err(TaskError::Stage {
                    index,
                    name,
                    source: Box::new(source),
                });
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match self.steps.as_slice() {
            [only] => only.describe(),
            steps => format!("serial of {} steps", steps.len()),
        }
    }
}

/// Children run concurrently and every child runs to completion.
///
/// If any child fails, the error of the first failing child (in child
/// order) is returned unchanged. Every failure is kept in the context's
/// diagnostics; the ones not returned are also logged.
#[derive(Debug, Default)]
pub struct Parallel {
    tasks: Vec<BoxedTask>,
}

impl Parallel {
    pub fn new(tasks: Vec<BoxedTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[BoxedTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Task for Parallel {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let results: Vec<Result<()>> = self.tasks.par_iter().map(|t| t.execute(ctx)).collect();

        let mut first = None;
        for (task, result) in self.tasks.iter().zip(results) {
            let Err(err) = result else { continue };
            ctx.record_failure(&err);
            if first.is_none() {
                first = Some(err);
            } else {
                warn!("{} also failed: {err}", task.describe());
            }
        }

        first.map_or(Ok(()), Err)
    }

    fn describe(&self) -> String {
        format!("parallel group of {} tasks", self.tasks.len())
    }
}

/// Execute `task` against `ctx`.
///
/// With `jobs` set, parallel groups share a dedicated pool of that many
/// threads; otherwise the global rayon pool is used.
pub fn run(task: &dyn Task, ctx: &Context, jobs: Option<usize>) -> Result<()> {
    let Some(jobs) = jobs else {
        return task.execute(ctx);
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| TaskError::Other(format!("Failed to create task thread pool: {e}")))?;

    pool.install(|| task.execute(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockConnector;
    use crate::package::{MockSource, PackageCache};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Probe {
        name: &'static str,
        fail: bool,
        effects: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Task for Probe {
        fn execute(&self, _ctx: &Context) -> Result<()> {
            self.effects.lock().unwrap().push(self.name);
            if self.fail {
                Err(TaskError::Other(format!("{} broke", self.name)))
            } else {
                Ok(())
            }
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    fn probe(name: &'static str, fail: bool, effects: &Arc<Mutex<Vec<&'static str>>>) -> BoxedTask {
        Box::new(Probe {
            name,
            fail,
            effects: Arc::clone(effects),
        })
    }

    fn context() -> Context {
        Context::new(
            Arc::new(MockConnector::new()),
            PackageCache::new(std::env::temp_dir(), Arc::new(MockSource::new())),
        )
    }

    #[test]
    fn test_serial_runs_in_order() {
        let effects = Arc::default();
        let serial = Serial::new(vec![
            probe("a", false, &effects),
            probe("b", false, &effects),
            probe("c", false, &effects),
        ]);

        serial.execute(&context()).unwrap();
        assert_eq!(*effects.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serial_aborts_on_first_failure() {
        let effects = Arc::default();
        let serial = Serial::new(vec![
            probe("a", false, &effects),
            probe("b", true, &effects),
            probe("c", false, &effects),
        ]);

        let err = serial.execute(&context()).unwrap_err();

        assert_eq!(*effects.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(err.stage_path(), vec![1]);
        assert_eq!(err.to_string(), "stage 1 (b) failed: b broke");
        assert_eq!(err.root().to_string(), "b broke");
    }

    #[test]
    fn test_parallel_runs_all_and_reports_first() {
        let effects = Arc::default();
        let parallel = Parallel::new(vec![probe("a", true, &effects), probe("b", false, &effects)]);
        let ctx = context();

        let err = parallel.execute(&ctx).unwrap_err();

        let mut ran = effects.lock().unwrap().clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["a", "b"]);
        assert_eq!(err.to_string(), "a broke");
    }

    #[test]
    fn test_parallel_keeps_every_failure() {
        let effects = Arc::default();
        let parallel = Parallel::new(vec![
            probe("a", false, &effects),
            probe("b", true, &effects),
            probe("c", true, &effects),
        ]);
        let ctx = context();

        let err = parallel.execute(&ctx).unwrap_err();

        assert_eq!(err.to_string(), "b broke");
        assert_eq!(ctx.failures(), vec!["b broke".to_string(), "c broke".to_string()]);
        assert_eq!(effects.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_parallel_inside_serial_stops_later_stages() {
        let effects = Arc::default();
        let serial = Serial::new(vec![
            Box::new(Parallel::new(vec![
                probe("p1", false, &effects),
                probe("p2", true, &effects),
            ])),
            probe("after", false, &effects),
        ]);

        let err = serial.execute(&context()).unwrap_err();

        assert!(!effects.lock().unwrap().contains(&"after"));
        assert_eq!(err.stage_path(), vec![0]);
        assert_eq!(err.root().to_string(), "p2 broke");
    }

    #[test]
    fn test_empty_groups_succeed() {
        let ctx = context();
        assert!(Serial::default().execute(&ctx).is_ok());
        assert!(Parallel::default().execute(&ctx).is_ok());
    }

    #[test]
    fn test_run_with_dedicated_pool() {
        let effects = Arc::default();
        let parallel = Parallel::new(vec![
            probe("a", false, &effects),
            probe("b", false, &effects),
            probe("c", false, &effects),
        ]);

        run(&parallel, &context(), Some(2)).unwrap();
        assert_eq!(effects.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_describe() {
        let effects = Arc::default();
        let single = Serial::new(vec![probe("only", false, &effects)]);
        assert_eq!(single.describe(), "only");

        let group = Parallel::new(vec![probe("a", false, &effects), probe("b", false, &effects)]);
        assert_eq!(group.describe(), "parallel group of 2 tasks");
    }
}

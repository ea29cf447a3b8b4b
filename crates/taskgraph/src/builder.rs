//! Step builder.
//!
//! The builder is a plain value: every method consumes it and returns the
//! extended builder, and `build` turns the accumulated steps into a
//! [`Serial`]. Nothing is shared between builders.

use crate::task::{BoxedTask, Parallel, Serial, Task};

/// Accumulates an ordered list of steps
#[derive(Debug, Default)]
pub struct Builder {
    steps: Vec<BoxedTask>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task
    pub fn step(self, task: impl Task + 'static) -> Self {
        self.boxed(Box::new(task))
    }

    /// Append an already boxed task
    pub fn boxed(mut self, task: BoxedTask) -> Self {
        self.steps.push(task);
        self
    }

    /// Append a group whose children run concurrently
    pub fn parallel(self, tasks: Vec<BoxedTask>) -> Self {
        self.step(Parallel::new(tasks))
    }

    /// Append a nested group whose children run in order
    pub fn serial(self, tasks: Vec<BoxedTask>) -> Self {
        self.step(Serial::new(tasks))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Finalize into a serial group, in the order steps were added
    pub fn build(self) -> Serial {
        Serial::new(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::Result;
    use crate::executor::MockConnector;
    use crate::package::{MockSource, PackageCache};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Note(&'static str);

    impl Task for Note {
        fn execute(&self, ctx: &Context) -> Result<()> {
            ctx.note("order", self.0);
            Ok(())
        }

        fn describe(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_build_preserves_order() {
        let graph = Builder::new()
            .step(Note("first"))
            .serial(vec![Box::new(Note("second")), Box::new(Note("third"))])
            .parallel(vec![Box::new(Note("fourth"))])
            .step(Note("fifth"))
            .build();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.steps()[3].describe(), "fifth");

        let ctx = Context::new(
            Arc::new(MockConnector::new()),
            PackageCache::new(std::env::temp_dir(), Arc::new(MockSource::new())),
        );
        graph.execute(&ctx).unwrap();
        assert_eq!(ctx.notes("order"), vec!["first", "second", "third", "fourth", "fifth"]);
    }

    #[test]
    fn test_empty_builder() {
        let builder = Builder::new();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
    }
}

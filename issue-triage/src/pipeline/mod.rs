//! Sequential step execution.
//!
//! A [`Pipeline`] walks its steps in order. A step that skips ends the run
//! successfully; a step that fails ends it with a [`PipelineError`] naming the
//! step. The executor never retries and knows nothing about what steps do.

mod context;
mod error;
mod observer;
mod result;
mod step;

pub use context::Context;
pub use error::{BoxError, PipelineError};
pub use observer::{ObservedStep, StepObserver, TracingObserver};
pub use result::{SimilarIssue, TriageResult};
pub use step::{Step, StepOutcome};

use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran.
    Completed,
    /// A step ended the run early.
    Skipped {
        /// Step that requested the skip.
        step: String,
        /// Reason given by the step.
        reason: String,
    },
}

/// An ordered list of steps.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn Step>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl Pipeline {
    /// Creates a pipeline running `steps` in the given order.
    pub fn new(steps: Vec<Arc<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Returns the step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Wraps every step so `observer` sees its start and finish.
    #[must_use]
    pub fn observed(self, observer: Arc<dyn StepObserver>) -> Self {
        let steps = self
            .steps
            .into_iter()
            .map(|step| Arc::new(ObservedStep::new(step, observer.clone())) as Arc<dyn Step>)
            .collect();
        Self { steps }
    }

    /// Runs every step against the context.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StepFailed`] if a step fails. Steps after the
    /// failing one do not run.
    pub async fn run(&self, ctx: &mut Context) -> Result<RunOutcome, PipelineError> {
        let span = info_span!("pipeline", issue = %ctx.issue().id);

        async {
            for step in &self.steps {
                match step.run(ctx).await {
                    StepOutcome::Continue => {}
                    StepOutcome::Skip { reason } => {
                        debug!(step = step.name(), reason = %reason, "Run skipped");
                        ctx.result_mut().mark_skipped(reason.clone());
                        return Ok(RunOutcome::Skipped {
                            step: step.name().to_string(),
                            reason,
                        });
                    }
                    StepOutcome::Failed(source) => {
                        return Err(PipelineError::StepFailed {
                            step: step.name().to_string(),
                            source,
                        });
                    }
                }
            }
            Ok(RunOutcome::Completed)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted steps shared by unit tests.

    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Step that appends its name to a shared log and returns a fixed outcome.
    pub(crate) struct ScriptedStep {
        pub(crate) name: String,
        pub(crate) behaviour: Behaviour,
        pub(crate) log: Arc<Mutex<Vec<String>>>,
    }

    #[derive(Clone)]
    pub(crate) enum Behaviour {
        Continue,
        Skip(&'static str),
        Fail(&'static str),
    }

    impl ScriptedStep {
        pub(crate) fn arc(
            name: &str,
            behaviour: Behaviour,
            log: &Arc<Mutex<Vec<String>>>,
        ) -> Arc<dyn Step> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour,
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl Step for ScriptedStep {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, ctx: &mut Context) -> StepOutcome {
            self.log.lock().unwrap().push(self.name.clone());
            ctx.result_mut().suggest_labels([self.name.clone()]);
            match &self.behaviour {
                Behaviour::Continue => StepOutcome::Continue,
                Behaviour::Skip(reason) => StepOutcome::skip(*reason),
                Behaviour::Fail(message) => StepOutcome::fail(*message),
            }
        }
    }
}

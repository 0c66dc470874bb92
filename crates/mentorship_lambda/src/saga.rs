//! Sequential saga runner with reverse-order compensation.
//!
//! Steps run strictly one after another. When a step fails, every completed
//! step that declares a compensation is undone, newest first, before the
//! failure is returned. Compensation failures are collected, never dropped.

use std::fmt::Display;

use async_trait::async_trait;
use tracing::{error, info, warn};

#[async_trait]
pub trait SagaStep<C, E>: Send + Sync
where
    C: Send + Sync,
{
    fn name(&self) -> &'static str;

    async fn execute(&self, context: &mut C) -> Result<(), E>;

    /// Whether [`SagaStep::compensate`] undoes anything.
    fn compensates(&self) -> bool {
        false
    }

    async fn compensate(&self, _context: &C) -> Result<(), E> {
        Ok(())
    }
}

/// Lifecycle hooks the runner calls on the shared context.
pub trait SagaContext {
    fn mark_compensating(&mut self) {}

    fn mark_failed(&mut self) {}
}

#[derive(Debug)]
pub struct CompensationError<E> {
    pub step: &'static str,
    pub error: E,
}

#[derive(Debug)]
pub struct SagaFailure<E> {
    pub failed_step: &'static str,
    pub error: E,
    /// Steps whose compensation succeeded, in the order they were undone.
    pub compensated: Vec<&'static str>,
    pub compensation_failures: Vec<CompensationError<E>>,
}

impl<E> SagaFailure<E> {
    pub fn compensation_failed(&self) -> bool {
        !self.compensation_failures.is_empty()
    }
}

pub struct Saga<'a, C, E>
where
    C: Send + Sync,
{
    name: &'static str,
    steps: Vec<Box<dyn SagaStep<C, E> + 'a>>,
}

impl<'a, C, E> Saga<'a, C, E>
where
    C: SagaContext + Send + Sync,
    E: Display + Send,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl SagaStep<C, E> + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub async fn run(&self, context: &mut C) -> Result<(), SagaFailure<E>> {
        info!(
            component = "saga",
            saga = self.name,
            event = "saga_started",
            steps = ?self.step_names(),
            "saga started"
        );
        let mut completed: Vec<&(dyn SagaStep<C, E> + 'a)> = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            match step.execute(context).await {
                Ok(()) => {
                    info!(
                        component = "saga",
                        saga = self.name,
                        event = "step_completed",
                        step = step.name(),
                        "saga step completed"
                    );
                    completed.push(step.as_ref());
                }
                Err(failure) => {
                    warn!(
                        component = "saga",
                        saga = self.name,
                        event = "step_failed",
                        step = step.name(),
                        error = %failure,
                        "saga step failed"
                    );
                    return Err(self.roll_back(context, &completed, step.name(), failure).await);
                }
            }
        }

        Ok(())
    }

    async fn roll_back(
        &self,
        context: &mut C,
        completed: &[&(dyn SagaStep<C, E> + 'a)],
        failed_step: &'static str,
        failure: E,
    ) -> SagaFailure<E> {
        let to_undo: Vec<_> = completed
            .iter()
            .rev()
            .filter(|step| step.compensates())
            .collect();

        if !to_undo.is_empty() {
            context.mark_compensating();
        }

        let mut compensated = Vec::new();
        let mut compensation_failures = Vec::new();
        for step in to_undo {
            match step.compensate(context).await {
                Ok(()) => {
                    info!(
                        component = "saga",
                        saga = self.name,
                        event = "step_compensated",
                        step = step.name(),
                        "saga step compensated"
                    );
                    compensated.push(step.name());
                }
                Err(compensation_error) => {
                    error!(
                        component = "saga",
                        saga = self.name,
                        event = "compensation_failed",
                        step = step.name(),
                        failed_step,
                        error = %compensation_error,
                        "saga compensation failed"
                    );
                    compensation_failures.push(CompensationError {
                        step: step.name(),
                        error: compensation_error,
                    });
                }
            }
        }

        context.mark_failed();

        SagaFailure {
            failed_step,
            error: failure,
            compensated,
            compensation_failures,
        }
    }
}

//! Recording failures as they pass through a stage.

use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::errors::ProbeError;
use crate::stages::Stage;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Shared list of recorded errors. Clones record into the same list.
#[derive(Debug, Clone, Default)]
pub struct ErrorLogger {
    errors: Arc<Mutex<Vec<ProbeError>>>,
}

impl ErrorLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    pub fn record(&self, error: ProbeError) {
        self.errors.lock().push(error);
    }

    /// Returns the recorded errors and clears the list.
    pub fn drain(&self) -> Vec<ProbeError> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Returns the number of errors recorded since the last drain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Returns true if nothing was recorded since the last drain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Wraps `stage`, recording every failure it returns.
    #[must_use]
    pub fn wrap<S>(&self, stage: S) -> RecordErrors<S> {
        RecordErrors {
            inner: stage,
            logger: self.clone(),
        }
    }
}

/// Stage returned by [`ErrorLogger::wrap`].
#[derive(Debug)]
pub struct RecordErrors<S> {
    inner: S,
    logger: ErrorLogger,
}

#[async_trait]
impl<S, A, B> Stage<A, B> for RecordErrors<S>
where
    S: Stage<A, B>,
    A: Send + 'static,
    B: Send + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: A) -> Outcome<B> {
        let outcome = self.inner.apply(ctx, input).await;
        if let Some(err) = outcome.error() {
            debug!(stage = self.inner.name(), error = %err, "recording stage failure");
            self.logger.record(err.clone());
        }
        outcome
    }
}

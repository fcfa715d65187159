//! Incremental pipeline builder.

use super::binary::{compose, compose_flat};
use crate::core::Outcome;
use crate::stages::{SharedStage, Stage};
use std::sync::Arc;

/// Builds a heterogeneous chain one stage at a time.
///
/// Each call to [`then`](Self::then) checks that the new stage accepts the
/// output of the chain so far.
///
/// ```rust,ignore
/// let pipeline = PipelineBuilder::new(DnsLookupGetaddrinfo::new())
///     .then(stage_fn(|dns: DnsLookupResultState| Outcome::success(dns.addresses.len())))
///     .build();
/// ```
pub struct PipelineBuilder<A, B> {
    stage: SharedStage<A, B>,
}

impl<A, B> PipelineBuilder<A, B>
where
    A: Send + 'static,
    B: Send + 'static,
{
    /// Starts a pipeline with its first stage.
    pub fn new<S>(first: S) -> Self
    where
        S: Stage<A, B> + 'static,
    {
        Self {
            stage: Arc::new(first),
        }
    }

    /// Appends a stage consuming the current output.
    #[must_use]
    pub fn then<C, S>(self, next: S) -> PipelineBuilder<A, C>
    where
        C: Send + 'static,
        S: Stage<B, C> + 'static,
    {
        PipelineBuilder {
            stage: Arc::new(compose(self.stage, next)),
        }
    }

    /// Returns the composed stage.
    #[must_use]
    pub fn build(self) -> SharedStage<A, B> {
        self.stage
    }
}

impl<A, B> PipelineBuilder<A, Outcome<B>>
where
    A: Send + 'static,
    B: Send + 'static,
{
    /// Appends a stage consuming the flattened nested output.
    #[must_use]
    pub fn then_flat<C, S>(self, next: S) -> PipelineBuilder<A, C>
    where
        C: Send + 'static,
        S: Stage<B, C> + 'static,
    {
        PipelineBuilder {
            stage: Arc::new(compose_flat(self.stage, next)),
        }
    }
}

impl<A, B> std::fmt::Debug for PipelineBuilder<A, B>
where
    A: Send + 'static,
    B: Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("stage", &self.stage.name())
            .finish()
    }
}

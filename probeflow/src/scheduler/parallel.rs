//! Many stages over one input.

use super::workers::spawn_workers;
use super::Parallelism;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::SharedStage;
use crate::stream::{collect, stream, Streamable};
use tracing::debug;

/// Applies every stage to a copy of `input`, streaming outcomes back as
/// they complete. Used to race independent measurement methods against the
/// same target.
pub fn parallel_async<A, B>(
    ctx: &ProbeContext,
    parallelism: impl Into<Parallelism>,
    input: A,
    stages: Vec<SharedStage<A, B>>,
) -> Streamable<Outcome<B>>
where
    A: Clone + Send + Sync + 'static,
    B: Send + 'static,
{
    let parallelism = parallelism.into();
    debug!(stages = stages.len(), %parallelism, "parallel started");
    let ctx = ctx.clone();
    spawn_workers(parallelism, stream(stages), move |stage| {
        let ctx = ctx.clone();
        let input = input.clone();
        async move { stage.apply(&ctx, input).await }
    })
}

/// Applies every stage to a copy of `input` and collects all outcomes.
pub async fn parallel<A, B>(
    ctx: &ProbeContext,
    parallelism: impl Into<Parallelism>,
    input: A,
    stages: Vec<SharedStage<A, B>>,
) -> Vec<Outcome<B>>
where
    A: Clone + Send + Sync + 'static,
    B: Send + 'static,
{
    collect(parallel_async(ctx, parallelism, input, stages)).await
}

//! One stage over many inputs.

use super::workers::spawn_workers;
use super::Parallelism;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::Stage;
use crate::stream::{collect, stream, Streamable};
use std::sync::Arc;
use tracing::debug;

/// Applies `stage` to every input pulled from `inputs`, streaming outcomes
/// back as they complete.
///
/// Output order does not follow input order.
pub fn map_async<A, B, S>(
    ctx: &ProbeContext,
    parallelism: impl Into<Parallelism>,
    stage: S,
    inputs: Streamable<A>,
) -> Streamable<Outcome<B>>
where
    A: Send + 'static,
    B: Send + 'static,
    S: Stage<A, B> + 'static,
{
    let parallelism = parallelism.into();
    debug!(stage = stage.name(), %parallelism, "map started");
    let stage = Arc::new(stage);
    let ctx = ctx.clone();
    spawn_workers(parallelism, inputs, move |input| {
        let stage = Arc::clone(&stage);
        let ctx = ctx.clone();
        async move { stage.apply(&ctx, input).await }
    })
}

/// Applies `stage` to every input and collects all outcomes.
///
/// Returns exactly one outcome per input, in completion order.
pub async fn map<A, B, S, I>(
    ctx: &ProbeContext,
    parallelism: impl Into<Parallelism>,
    stage: S,
    inputs: I,
) -> Vec<Outcome<B>>
where
    A: Send + 'static,
    B: Send + 'static,
    S: Stage<A, B> + 'static,
    I: IntoIterator<Item = A>,
    I::IntoIter: Send + 'static,
{
    collect(map_async(ctx, parallelism, stage, stream(inputs))).await
}

//! Stage trait and adapters.
//!
//! A stage is one fallible unit of work, typically a network operation,
//! that maps an input to an [`Outcome`]. Stages compose head to tail (see
//! [`crate::compose`]) and are fanned out by the [`crate::scheduler`].

mod identity;
mod lambda;

pub use identity::{identity, Identity};
pub use lambda::{lambda, stage_fn, AsyncFnStage, FnStage};

use crate::context::ProbeContext;
use crate::core::Outcome;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for pipeline stages.
///
/// Failures are returned as [`Outcome`] data and must never escape as a
/// panic. Implementations must forward `ctx` to every sub-operation so
/// cancellation reaches in-flight I/O.
#[async_trait]
pub trait Stage<In, Out>: Send + Sync
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Returns the name of the stage, used in log events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Applies the stage to `input`.
    async fn apply(&self, ctx: &ProbeContext, input: In) -> Outcome<Out>;
}

#[async_trait]
impl<In, Out, S> Stage<In, Out> for Arc<S>
where
    In: Send + 'static,
    Out: Send + 'static,
    S: Stage<In, Out> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: In) -> Outcome<Out> {
        (**self).apply(ctx, input).await
    }
}

#[async_trait]
impl<In, Out, S> Stage<In, Out> for Box<S>
where
    In: Send + 'static,
    Out: Send + 'static,
    S: Stage<In, Out> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: In) -> Outcome<Out> {
        (**self).apply(ctx, input).await
    }
}

/// A shared, type-erased stage.
pub type SharedStage<In, Out> = Arc<dyn Stage<In, Out>>;

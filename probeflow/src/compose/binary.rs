//! Binary composition of stages.

use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::Stage;
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::trace;

/// Runs `second` on the success value of `first`.
///
/// A failure or skip from `first` is returned as-is and `second` is never
/// invoked. On success the observations of `first` come before those of
/// `second`.
pub struct Compose<F, G, A, B, C> {
    first: F,
    second: G,
    name: String,
    _types: PhantomData<fn(A) -> (B, C)>,
}

impl<F, G, A, B, C> Compose<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, B>,
    G: Stage<B, C>,
{
    /// Creates a new composed stage.
    pub fn new(first: F, second: G) -> Self {
        let name = format!("{} >> {}", first.name(), second.name());
        Self {
            first,
            second,
            name,
            _types: PhantomData,
        }
    }
}

impl<F, G, A, B, C> std::fmt::Debug for Compose<F, G, A, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, G, A, B, C> Stage<A, C> for Compose<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, B>,
    G: Stage<B, C>,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, ctx: &ProbeContext, input: A) -> Outcome<C> {
        let upstream = self.first.apply(ctx, input).await;
        bind(&self.second, ctx, upstream).await
    }
}

// Feeds a successful upstream outcome into `next`, or forwards it unchanged.
pub(crate) async fn bind<B, C, G>(next: &G, ctx: &ProbeContext, upstream: Outcome<B>) -> Outcome<C>
where
    B: Send + 'static,
    C: Send + 'static,
    G: Stage<B, C> + ?Sized,
{
    match upstream.into_success() {
        Ok((value, observations)) => next
            .apply(ctx, value)
            .await
            .prepend_observations(observations),
        Err(halted) => {
            trace!(next = next.name(), status = %halted.status(), "short-circuit");
            halted
        }
    }
}

/// Like [`Compose`] for an upstream stage that yields nested outcomes.
///
/// The nested outcome is flattened before it reaches `second`.
pub struct ComposeFlat<F, G, A, B, C> {
    first: F,
    second: G,
    name: String,
    _types: PhantomData<fn(A) -> (B, C)>,
}

impl<F, G, A, B, C> ComposeFlat<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, Outcome<B>>,
    G: Stage<B, C>,
{
    /// Creates a new flattening composed stage.
    pub fn new(first: F, second: G) -> Self {
        let name = format!("{} >>= {}", first.name(), second.name());
        Self {
            first,
            second,
            name,
            _types: PhantomData,
        }
    }
}

impl<F, G, A, B, C> std::fmt::Debug for ComposeFlat<F, G, A, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeFlat")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, G, A, B, C> Stage<A, C> for ComposeFlat<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, Outcome<B>>,
    G: Stage<B, C>,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, ctx: &ProbeContext, input: A) -> Outcome<C> {
        let upstream = self.first.apply(ctx, input).await.flatten();
        bind(&self.second, ctx, upstream).await
    }
}

/// Lifts a stage so that it accepts an outcome and only runs on success.
pub struct FlatMap<G, B, C> {
    inner: G,
    _types: PhantomData<fn(B) -> C>,
}

impl<G, B, C> std::fmt::Debug for FlatMap<G, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMap").finish_non_exhaustive()
    }
}

#[async_trait]
impl<G, B, C> Stage<Outcome<B>, C> for FlatMap<G, B, C>
where
    B: Send + 'static,
    C: Send + 'static,
    G: Stage<B, C>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: Outcome<B>) -> Outcome<C> {
        bind(&self.inner, ctx, input).await
    }
}

/// Composes `first` and `second` head to tail.
pub fn compose<F, G, A, B, C>(first: F, second: G) -> Compose<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, B>,
    G: Stage<B, C>,
{
    Compose::new(first, second)
}

/// Composes a stage yielding `Outcome<B>` with a stage consuming `B`.
pub fn compose_flat<F, G, A, B, C>(first: F, second: G) -> ComposeFlat<F, G, A, B, C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Stage<A, Outcome<B>>,
    G: Stage<B, C>,
{
    ComposeFlat::new(first, second)
}

/// Lifts `stage` to accept an outcome, forwarding failures and skips.
pub fn flat_map<G, B, C>(stage: G) -> FlatMap<G, B, C>
where
    B: Send + 'static,
    C: Send + 'static,
    G: Stage<B, C>,
{
    FlatMap {
        inner: stage,
        _types: PhantomData,
    }
}

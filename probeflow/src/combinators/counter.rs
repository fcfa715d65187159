//! Counting successes at a point in a pipeline.

use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::Stage;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A shared counter. Clones count into the same value.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicI64>,
}

impl Counter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current count.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Returns a pass-through stage that counts every value reaching it.
    ///
    /// Placed after another stage in a composed chain, it counts that
    /// stage's successes, since failures never reach it.
    #[must_use]
    pub fn checkpoint<T>(&self) -> Checkpoint<T> {
        Checkpoint {
            counter: self.clone(),
            _type: PhantomData,
        }
    }

    /// Wraps `stage`, counting its successful outcomes.
    #[must_use]
    pub fn wrap<S>(&self, stage: S) -> Counted<S> {
        Counted {
            inner: stage,
            counter: self.clone(),
        }
    }

    fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stage returned by [`Counter::checkpoint`].
#[derive(Debug)]
pub struct Checkpoint<T> {
    counter: Counter,
    _type: PhantomData<fn(T) -> T>,
}

#[async_trait]
impl<T> Stage<T, T> for Checkpoint<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        "counter"
    }

    async fn apply(&self, _ctx: &ProbeContext, input: T) -> Outcome<T> {
        self.counter.increment();
        Outcome::success(input)
    }
}

/// Stage returned by [`Counter::wrap`].
#[derive(Debug)]
pub struct Counted<S> {
    inner: S,
    counter: Counter,
}

#[async_trait]
impl<S, A, B> Stage<A, B> for Counted<S>
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
        if outcome.is_success() {
            self.counter.increment();
        }
        outcome
    }
}

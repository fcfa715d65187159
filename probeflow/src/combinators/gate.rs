//! Letting only the first arrival through.

use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::Stage;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Skip reason attached to outcomes the gate blocks.
pub const GATE_CLOSED: &str = "gate closed";

/// A "first one wins" gate. Clones share the same state.
///
/// The first invocation to reach the gate proceeds; every later one is
/// skipped, which is not an error.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    arrivals: Arc<AtomicI64>,
}

impl Gate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once something has passed the gate.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.arrivals.load(Ordering::SeqCst) > 0
    }

    /// Returns a pass-through stage guarded by this gate.
    #[must_use]
    pub fn pass<T>(&self) -> GatePass<T> {
        GatePass {
            gate: self.clone(),
            _type: PhantomData,
        }
    }

    /// Wraps `stage` so that only the first invocation runs it.
    #[must_use]
    pub fn wrap<S>(&self, stage: S) -> Gated<S> {
        Gated {
            inner: stage,
            gate: self.clone(),
        }
    }

    fn admit(&self) -> bool {
        self.arrivals.fetch_add(1, Ordering::SeqCst) + 1 == 1
    }
}

/// Stage returned by [`Gate::pass`].
#[derive(Debug)]
pub struct GatePass<T> {
    gate: Gate,
    _type: PhantomData<fn(T) -> T>,
}

#[async_trait]
impl<T> Stage<T, T> for GatePass<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        "gate"
    }

    async fn apply(&self, _ctx: &ProbeContext, input: T) -> Outcome<T> {
        if self.gate.admit() {
            Outcome::success(input)
        } else {
            trace!("gate closed, skipping");
            Outcome::skipped(GATE_CLOSED)
        }
    }
}

/// Stage returned by [`Gate::wrap`].
#[derive(Debug)]
pub struct Gated<S> {
    inner: S,
    gate: Gate,
}

#[async_trait]
impl<S, A, B> Stage<A, B> for Gated<S>
where
    S: Stage<A, B>,
    A: Send + 'static,
    B: Send + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: A) -> Outcome<B> {
        if self.gate.admit() {
            self.inner.apply(ctx, input).await
        } else {
            trace!(stage = self.inner.name(), "gate closed, skipping");
            Outcome::skipped(GATE_CLOSED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SpyStage;
    use crate::stages::identity;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_passes_rest_skipped() {
        let ctx = ProbeContext::new();
        let gate = Gate::new();
        let stage = gate.pass::<u8>();
        assert!(!gate.is_closed());

        assert_eq!(stage.apply(&ctx, 1).await.unwrap(), 1);
        assert!(gate.is_closed());

        let second = stage.apply(&ctx, 2).await;
        assert_eq!(second.skip_reason(), Some(GATE_CLOSED));
        assert!(second.error().is_none());
    }

    #[tokio::test]
    async fn test_wrapped_stage_runs_once() {
        let ctx = ProbeContext::new();
        let gate = Gate::new();
        let spy = Arc::new(SpyStage::new(identity::<u8>()));
        let gated = gate.wrap(spy.clone());

        for i in 0..5 {
            gated.apply(&ctx, i).await;
        }
        assert_eq!(spy.call_count(), 1);
        assert_eq!(spy.recorded_inputs(), vec![0]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let ctx = ProbeContext::new();
        let gate = Gate::new();
        let a = gate.pass::<u8>();
        let b = gate.clone().pass::<u8>();
        assert!(a.apply(&ctx, 1).await.is_success());
        assert!(b.apply(&ctx, 1).await.is_skipped());
    }
}

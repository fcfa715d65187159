//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::errors::ProbeError;
use crate::observations::{NetworkEvent, Observations};
use crate::stages::Stage;

/// Creates an observation record tagged with `id`, for checking merge order.
#[must_use]
pub fn tagged_observation(id: i64) -> Observations {
    let mut obs = Observations::new();
    obs.network_events.push(NetworkEvent {
        address: None,
        failure: None,
        num_bytes: None,
        operation: "tag".to_string(),
        proto: None,
        t0: 0.0,
        t: 0.0,
        tags: Vec::new(),
        transaction_id: id,
    });
    obs
}

/// Returns the ids of the network events carried by `outcome`, in order.
#[must_use]
pub fn observation_ids<T>(outcome: &Outcome<T>) -> Vec<i64> {
    outcome
        .observations()
        .iter()
        .flat_map(|o| o.network_events.iter().map(|e| e.transaction_id))
        .collect()
}

/// Wraps a stage and records every input it receives.
#[derive(Debug)]
pub struct SpyStage<S, T> {
    inner: S,
    calls: Mutex<Vec<T>>,
}

impl<S, T> SpyStage<S, T> {
    /// Creates a spy around `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the inputs received so far.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl<S, In, Out> Stage<In, Out> for SpyStage<S, In>
where
    S: Stage<In, Out>,
    In: Clone + Send + 'static,
    Out: Send + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: In) -> Outcome<Out> {
        self.calls.lock().push(input.clone());
        self.inner.apply(ctx, input).await
    }
}

/// A stage that ignores its input and always succeeds with a fixed value.
#[derive(Debug, Clone)]
pub struct SucceedingStage<T> {
    value: T,
    observations: Vec<Observations>,
}

impl<T> SucceedingStage<T> {
    /// Creates a new succeeding stage.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            observations: Vec::new(),
        }
    }

    /// Attaches an observation to every outcome.
    #[must_use]
    pub fn with_observation(mut self, observations: Observations) -> Self {
        self.observations.push(observations);
        self
    }
}

#[async_trait]
impl<In, T> Stage<In, T> for SucceedingStage<T>
where
    In: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "succeeding"
    }

    async fn apply(&self, _ctx: &ProbeContext, _input: In) -> Outcome<T> {
        Outcome::success(self.value.clone()).with_observations(self.observations.clone())
    }
}

/// A stage that always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingStage {
    error: ProbeError,
    observations: Vec<Observations>,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(error: ProbeError) -> Self {
        Self {
            error,
            observations: Vec::new(),
        }
    }

    /// Attaches an observation to every outcome.
    #[must_use]
    pub fn with_observation(mut self, observations: Observations) -> Self {
        self.observations.push(observations);
        self
    }
}

#[async_trait]
impl<In, Out> Stage<In, Out> for FailingStage
where
    In: Send + 'static,
    Out: Send + 'static,
{
    fn name(&self) -> &str {
        "failing"
    }

    async fn apply(&self, _ctx: &ProbeContext, _input: In) -> Outcome<Out> {
        Outcome::failure(self.error.clone()).with_observations(self.observations.clone())
    }
}

/// A stage that always skips.
#[derive(Debug, Clone)]
pub struct SkippingStage {
    reason: String,
}

impl SkippingStage {
    /// Creates a new skipping stage.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<In, Out> Stage<In, Out> for SkippingStage
where
    In: Send + 'static,
    Out: Send + 'static,
{
    fn name(&self) -> &str {
        "skipping"
    }

    async fn apply(&self, _ctx: &ProbeContext, _input: In) -> Outcome<Out> {
        Outcome::skipped(self.reason.clone())
    }
}

/// Delays an inner stage and tracks how many calls overlap.
///
/// The delay honours cancellation: a cancelled context fails the call with
/// [`ProbeError::Cancelled`] without running the inner stage.
#[derive(Debug)]
pub struct SlowStage<S> {
    inner: S,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<S> SlowStage<S> {
    /// Creates a new slow stage.
    #[must_use]
    pub fn new(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(inner: S, ms: u64) -> Self {
        Self::new(inner, Duration::from_millis(ms))
    }

    /// Returns the highest number of overlapping calls observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S, In, Out> Stage<In, Out> for SlowStage<S>
where
    S: Stage<In, Out>,
    In: Send + 'static,
    Out: Send + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, ctx: &ProbeContext, input: In) -> Outcome<Out> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let slept = ctx
            .run(self.delay * 2, async {
                tokio::time::sleep(self.delay).await;
                Ok(())
            })
            .await;

        let outcome = match slept {
            Ok(()) => self.inner.apply(ctx, input).await,
            Err(err) => Outcome::failure(err),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::identity;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spy_records_inputs() {
        let ctx = ProbeContext::new();
        let spy = SpyStage::new(identity::<u32>());
        spy.apply(&ctx, 1).await;
        spy.apply(&ctx, 2).await;

        assert_eq!(spy.call_count(), 2);
        assert_eq!(spy.recorded_inputs(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_succeeding_stage_attaches_observations() {
        let ctx = ProbeContext::new();
        let stage = SucceedingStage::new("ok").with_observation(tagged_observation(5));
        let outcome: Outcome<&str> = stage.apply(&ctx, ()).await;
        assert_eq!(observation_ids(&outcome), vec![5]);
        assert_eq!(outcome.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_failing_and_skipping() {
        let ctx = ProbeContext::new();
        let failed: Outcome<()> = FailingStage::new(ProbeError::Eof).apply(&ctx, 0u8).await;
        assert_eq!(failed.error(), Some(&ProbeError::Eof));

        let skipped: Outcome<()> = SkippingStage::new("why").apply(&ctx, 0u8).await;
        assert_eq!(skipped.skip_reason(), Some("why"));
    }

    #[tokio::test]
    async fn test_slow_stage_cancelled() {
        let ctx = ProbeContext::new();
        ctx.cancel("stop");
        let stage = SlowStage::with_delay_ms(identity::<u8>(), 50);
        let outcome = stage.apply(&ctx, 1).await;
        assert_eq!(outcome.error(), Some(&ProbeError::Cancelled));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_stage_tracks_overlap() {
        let ctx = ProbeContext::new();
        let stage = Arc::new(SlowStage::with_delay_ms(identity::<u8>(), 30));
        let a = {
            let (stage, ctx) = (stage.clone(), ctx.clone());
            tokio::spawn(async move { stage.apply(&ctx, 1).await })
        };
        let b = {
            let (stage, ctx) = (stage.clone(), ctx.clone());
            tokio::spawn(async move { stage.apply(&ctx, 2).await })
        };
        assert!(a.await.unwrap().is_success());
        assert!(b.await.unwrap().is_success());
        assert_eq!(stage.max_in_flight(), 2);
    }
}

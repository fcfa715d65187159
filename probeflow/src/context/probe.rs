//! The context threaded through every stage invocation.

use super::CancellationToken;
use crate::errors::ProbeError;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

struct ContextInner {
    run_id: Uuid,
    token: Arc<CancellationToken>,
    deadline: Option<Instant>,
}

/// Context passed to every [`Stage::apply`](crate::stages::Stage::apply).
///
/// Cloning is cheap. Clones, children and derived contexts share the same
/// cancellation token, so cancelling any of them cancels the run.
#[derive(Clone)]
pub struct ProbeContext {
    inner: Arc<ContextInner>,
}

impl ProbeContext {
    /// Creates a new context with a fresh run id and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                run_id: Uuid::new_v4(),
                token: Arc::new(CancellationToken::new()),
                deadline: None,
            }),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.inner.run_id
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Cancels the run.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.inner.token.cancel(reason);
    }

    /// Returns whether the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns the time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Creates a child context sharing run id, token and deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Creates a child context whose deadline is at most `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                run_id: self.inner.run_id,
                token: Arc::clone(&self.inner.token),
                deadline,
            }),
        }
    }

    /// Runs `fut` under a stage sub-timeout layered below this context.
    ///
    /// Returns [`ProbeError::Timeout`] when the sub-timeout or the context
    /// deadline expires first and [`ProbeError::Cancelled`] when the run is
    /// cancelled first.
    pub async fn run<F, T>(&self, timeout: Duration, fut: F) -> Result<T, ProbeError>
    where
        F: Future<Output = Result<T, ProbeError>>,
    {
        if self.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }
        let budget = self.remaining().map_or(timeout, |left| left.min(timeout));
        tokio::select! {
            biased;
            () = self.inner.token.cancelled() => Err(ProbeError::Cancelled),
            res = tokio::time::timeout(budget, fut) => res.unwrap_or(Err(ProbeError::Timeout)),
        }
    }
}

impl Default for ProbeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeContext")
            .field("run_id", &self.inner.run_id)
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_shares_token_and_run_id() {
        let ctx = ProbeContext::new();
        let child = ctx.child();
        assert_eq!(child.run_id(), ctx.run_id());

        child.cancel("child cancelled");
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.token().reason(), Some("child cancelled".to_string()));
    }

    #[test]
    fn test_with_timeout_keeps_tighter_deadline() {
        let ctx = ProbeContext::new().with_timeout(Duration::from_millis(50));
        let looser = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(looser.deadline(), ctx.deadline());

        let tighter = ProbeContext::new()
            .with_timeout(Duration::from_secs(60))
            .with_timeout(Duration::from_millis(10));
        assert!(tighter.remaining().unwrap() <= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_run_returns_value() {
        let ctx = ProbeContext::new();
        let res = ctx.run(Duration::from_secs(1), async { Ok::<_, ProbeError>(42) }).await;
        assert_eq!(res, Ok(42));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = ProbeContext::new();
        let res = ctx
            .run(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProbeError>(())
            })
            .await;
        assert_eq!(res, Err(ProbeError::Timeout));
    }

    #[tokio::test]
    async fn test_run_respects_context_deadline() {
        let ctx = ProbeContext::new().with_timeout(Duration::from_millis(10));
        let started = Instant::now();
        let res = ctx
            .run(Duration::from_secs(30), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProbeError>(())
            })
            .await;
        assert_eq!(res, Err(ProbeError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_cancelled_in_flight() {
        let ctx = ProbeContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel("abort");
        });

        let res = ctx
            .run(Duration::from_secs(30), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProbeError>(())
            })
            .await;
        assert_eq!(res, Err(ProbeError::Cancelled));
    }

    #[tokio::test]
    async fn test_run_already_cancelled() {
        let ctx = ProbeContext::new();
        ctx.cancel("early");
        let res = ctx.run(Duration::from_secs(1), async { Ok::<_, ProbeError>(1) }).await;
        assert_eq!(res, Err(ProbeError::Cancelled));
    }
}

//! A stage that closes its input.

use super::Closer;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::Stage;
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::debug;

/// Closes the state it receives and passes it on. Close errors are ignored.
#[derive(Debug)]
pub struct CloseStage<T> {
    _type: PhantomData<fn(T) -> T>,
}

impl<T> Default for CloseStage<T> {
    fn default() -> Self {
        Self { _type: PhantomData }
    }
}

#[async_trait]
impl<T> Stage<T, T> for CloseStage<T>
where
    T: Closer + 'static,
{
    fn name(&self) -> &str {
        "close"
    }

    async fn apply(&self, _ctx: &ProbeContext, input: T) -> Outcome<T> {
        if let Err(err) = input.close() {
            debug!(error = %err, "close failed");
        }
        Outcome::success(input)
    }
}

/// Creates a stage that closes its input.
#[must_use]
pub fn close<T>() -> CloseStage<T> {
    CloseStage::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Conn {
        closes: Arc<AtomicUsize>,
    }

    impl Closer for Conn {
        fn close(&self) -> Result<(), ProbeError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Err(ProbeError::Eof)
        }
    }

    #[tokio::test]
    async fn test_close_passes_state_through() {
        let ctx = ProbeContext::new();
        let conn = Conn::default();
        let outcome = close::<Conn>().apply(&ctx, conn.clone()).await;
        assert!(outcome.is_success());
        assert_eq!(conn.closes.load(Ordering::SeqCst), 1);
    }
}

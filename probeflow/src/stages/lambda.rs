//! Closure-backed stages.

use super::Stage;
use crate::context::ProbeContext;
use crate::core::Outcome;
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

/// A stage backed by a synchronous closure.
pub struct FnStage<F, A, B> {
    name: String,
    func: F,
    _types: PhantomData<fn(A) -> B>,
}

impl<F, A, B> FnStage<F, A, B>
where
    F: Fn(A) -> Outcome<B> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _types: PhantomData,
        }
    }
}

impl<F, A, B> Debug for FnStage<F, A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, A, B> Stage<A, B> for FnStage<F, A, B>
where
    F: Fn(A) -> Outcome<B> + Send + Sync,
    A: Send + 'static,
    B: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, _ctx: &ProbeContext, input: A) -> Outcome<B> {
        (self.func)(input)
    }
}

/// A stage backed by an async closure receiving the context.
pub struct AsyncFnStage<F, A, B> {
    name: String,
    func: F,
    _types: PhantomData<fn(A) -> B>,
}

impl<F, Fut, A, B> AsyncFnStage<F, A, B>
where
    F: Fn(ProbeContext, A) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<B>> + Send,
{
    /// Creates a new async function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _types: PhantomData,
        }
    }
}

impl<F, A, B> Debug for AsyncFnStage<F, A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut, A, B> Stage<A, B> for AsyncFnStage<F, A, B>
where
    F: Fn(ProbeContext, A) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<B>> + Send,
    A: Send + 'static,
    B: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, ctx: &ProbeContext, input: A) -> Outcome<B> {
        (self.func)(ctx.clone(), input).await
    }
}

/// Wraps a synchronous closure as a stage.
pub fn stage_fn<F, A, B>(func: F) -> FnStage<F, A, B>
where
    F: Fn(A) -> Outcome<B> + Send + Sync,
{
    FnStage::new("fn", func)
}

/// Wraps an async closure as a stage.
pub fn lambda<F, Fut, A, B>(func: F) -> AsyncFnStage<F, A, B>
where
    F: Fn(ProbeContext, A) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<B>> + Send,
{
    AsyncFnStage::new("lambda", func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeError;

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("len", |s: String| Outcome::success(s.len()));
        assert_eq!(stage.name(), "len");

        let ctx = ProbeContext::new();
        assert_eq!(stage.apply(&ctx, "abcd".to_string()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_lambda_receives_context() {
        let stage = lambda(|ctx: ProbeContext, n: u32| async move {
            if ctx.is_cancelled() {
                Outcome::failure(ProbeError::Cancelled)
            } else {
                Outcome::success(n + 1)
            }
        });
        assert_eq!(stage.name(), "lambda");

        let ctx = ProbeContext::new();
        assert_eq!(stage.apply(&ctx, 1).await.unwrap(), 2);

        ctx.cancel("stop");
        assert_eq!(stage.apply(&ctx, 1).await.error(), Some(&ProbeError::Cancelled));
    }

    #[test]
    fn test_debug_shows_name() {
        let stage = stage_fn(|x: u8| Outcome::success(x));
        assert!(format!("{stage:?}").contains("fn"));
    }
}

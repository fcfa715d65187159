//! The unit stage.

use super::Stage;
use crate::context::ProbeContext;
use crate::core::Outcome;
use async_trait::async_trait;
use std::marker::PhantomData;

/// Returns its input unchanged as a success.
#[derive(Debug)]
pub struct Identity<T> {
    _type: PhantomData<fn(T) -> T>,
}

impl<T> Identity<T> {
    /// Creates a new identity stage.
    #[must_use]
    pub const fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T> Default for Identity<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Stage<T, T> for Identity<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        "identity"
    }

    async fn apply(&self, _ctx: &ProbeContext, input: T) -> Outcome<T> {
        Outcome::success(input)
    }
}

/// Creates an identity stage.
#[must_use]
pub const fn identity<T>() -> Identity<T> {
    Identity::new()
}

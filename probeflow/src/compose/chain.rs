//! Homogeneous pipelines built at runtime.

use super::binary::bind;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::stages::{SharedStage, Stage};
use async_trait::async_trait;
use std::sync::Arc;

/// A runtime list of `T -> T` stages applied left to right.
///
/// Stops at the first failure or skip. An empty chain behaves like
/// [`identity`](crate::stages::identity).
pub struct Chain<T> {
    stages: Vec<SharedStage<T, T>>,
}

impl<T> Chain<T>
where
    T: Send + 'static,
{
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    #[must_use]
    pub fn then<S>(mut self, stage: S) -> Self
    where
        S: Stage<T, T> + 'static,
    {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared stage.
    pub fn push(&mut self, stage: SharedStage<T, T>) {
        self.stages.push(stage);
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T> Default for Chain<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<SharedStage<T, T>> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = SharedStage<T, T>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl<T> std::fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stages.len())
            .finish()
    }
}

#[async_trait]
impl<T> Stage<T, T> for Chain<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &str {
        "chain"
    }

    async fn apply(&self, ctx: &ProbeContext, input: T) -> Outcome<T> {
        let mut current = Outcome::success(input);
        for stage in &self.stages {
            if !current.is_success() {
                break;
            }
            current = bind(stage.as_ref(), ctx, current).await;
        }
        current
    }
}

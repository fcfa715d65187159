//! Composition combinators.
//!
//! Stages chain head to tail. A failure or skip short-circuits the rest of
//! the chain and is forwarded unchanged, together with the observations
//! accumulated up to that point. On success, observations are concatenated
//! in pipeline order.
//!
//! - [`compose`] and [`compose_flat`] bind two stages statically.
//! - The [`compose!`](crate::compose!) macro right-folds any number of stages.
//! - [`Chain`] folds a runtime list of same-typed stages.
//! - [`PipelineBuilder`] type-checks a heterogeneous chain incrementally.

mod binary;
mod builder;
mod chain;
#[cfg(test)]
mod compose_tests;

pub use binary::{compose, compose_flat, flat_map, Compose, ComposeFlat, FlatMap};
pub use builder::PipelineBuilder;
pub use chain::Chain;

/// Composes any number of stages by right-folding [`compose`].
///
/// `compose!(f, g, h)` expands to `compose(f, compose(g, h))`.
#[macro_export]
macro_rules! compose {
    ($only:expr $(,)?) => {
        $only
    };
    ($first:expr, $($rest:expr),+ $(,)?) => {
        $crate::compose::compose($first, $crate::compose!($($rest),+))
    };
}

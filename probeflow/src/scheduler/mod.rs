//! Bounded-parallelism scheduler.
//!
//! [`map`] applies one stage to many inputs. [`parallel`] applies many
//! stages to one input. Both spawn exactly `max(parallelism, 1)` worker
//! tasks that share one input queue, and both come in a collecting form and
//! a streaming `_async` form.
//!
//! The scheduler does not cancel anything itself: it forwards the context to
//! every stage, and stages abandon in-flight I/O when it is cancelled.

mod map;
mod parallel;
mod parallelism;
mod workers;


pub use map::{map, map_async};
pub use parallel::{parallel, parallel_async};
pub use parallelism::Parallelism;

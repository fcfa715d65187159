//! Auxiliary combinators that tap into a pipeline.
//!
//! Each combinator owns shared state scoped to one pipeline run. Callers
//! create it, clone it into the stages that need it and read it afterwards.
//! There are no globals.

mod counter;
mod error_logger;
mod gate;

pub use counter::{Checkpoint, Counted, Counter};
pub use error_logger::{ErrorLogger, RecordErrors};
pub use gate::{Gate, GatePass, Gated, GATE_CLOSED};

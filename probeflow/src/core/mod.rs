//! Core outcome types.
//!
//! An [`Outcome`] is the unit every stage returns: a success value, a
//! failure or a deliberate skip, together with the observations recorded
//! while producing it.

mod outcome;
mod status;

pub use outcome::{Outcome, Payload};
pub use status::OutcomeStatus;

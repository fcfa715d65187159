//! Run context and cooperative cancellation.

mod probe;
mod token;

pub use probe::ProbeContext;
pub use token::CancellationToken;

//! Observability utilities.
//!
//! The engine only emits `debug` and `trace` events and never installs a
//! subscriber on its own. Applications call [`init_logging`] once.

mod logging;
mod operation;

pub use logging::init_logging;
pub use operation::OperationLogger;

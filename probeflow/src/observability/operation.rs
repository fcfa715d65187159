//! Start/stop logging for leaf network operations.

use crate::errors::ProbeError;
use std::time::Instant;
use tracing::info;

/// Logs the start of an operation and, later, how it ended.
///
/// ```rust,ignore
/// let ol = OperationLogger::start(format!("[#{}] TCPConnect {}", index, addr));
/// let res = connect().await;
/// ol.stop(res.as_ref().err());
/// ```
#[derive(Debug)]
pub struct OperationLogger {
    message: String,
    started: Instant,
}

impl OperationLogger {
    /// Logs `message` and starts timing.
    #[must_use]
    pub fn start(message: impl Into<String>) -> Self {
        let message = message.into();
        info!("{message}...");
        Self {
            message,
            started: Instant::now(),
        }
    }

    /// Returns the operation message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Logs the end of the operation.
    pub fn stop(self, error: Option<&ProbeError>) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        match error {
            None => info!(elapsed_ms, "{}... ok", self.message),
            Some(err) => info!(elapsed_ms, "{}... {}", self.message, err),
        }
    }
}

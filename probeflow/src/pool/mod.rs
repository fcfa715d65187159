//! Tracking and closing established connections.
//!
//! Stages register every connection they establish with a
//! [`ConnectionPool`]. At teardown the pool closes them in reverse
//! registration order, so a TLS session is closed before the TCP socket it
//! runs on.

mod close;

pub use close::{close, CloseStage};

use crate::errors::ProbeError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Anything that can be closed. Closing twice must be harmless.
pub trait Closer: Send + Sync {
    /// Closes the resource.
    fn close(&self) -> Result<(), ProbeError>;
}

/// Registry of live connections, closed in LIFO order.
#[derive(Default)]
pub struct ConnectionPool {
    tracked: Mutex<Vec<Arc<dyn Closer>>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a connection.
    pub fn track(&self, conn: Arc<dyn Closer>) {
        self.tracked.lock().push(conn);
    }

    /// Tracks a connection if there is one.
    pub fn maybe_track(&self, conn: Option<Arc<dyn Closer>>) {
        if let Some(conn) = conn {
            self.track(conn);
        }
    }

    /// Returns the number of tracked connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracked.lock().len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracked.lock().is_empty()
    }

    /// Closes every tracked connection, most recent first, and empties the pool.
    ///
    /// A failing close does not stop the others. The failures are returned.
    pub fn close(&self) -> Vec<ProbeError> {
        let conns: Vec<Arc<dyn Closer>> = std::mem::take(&mut *self.tracked.lock());
        if conns.is_empty() {
            return Vec::new();
        }

        debug!(count = conns.len(), "closing tracked connections");
        conns
            .into_iter()
            .rev()
            .filter_map(|conn| conn.close().err())
            .collect()
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        let failures = self.close();
        if !failures.is_empty() {
            debug!(failures = failures.len(), "connection close failures on drop");
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("tracked", &self.len())
            .finish()
    }
}

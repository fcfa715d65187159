//! TCP connect.

use super::endpoint::{Endpoint, Network};
use crate::config::ProbeConfig;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::errors::ProbeError;
use crate::observability::OperationLogger;
use crate::observations::{ObservationProducer, Observations, Trace, TraceIndexAllocator, ZeroTime};
use crate::pool::{Closer, ConnectionPool};
use crate::stages::Stage;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Default timeout of a TCP connect.
pub const DEFAULT_TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// An established TCP connection.
///
/// Clones share the socket. Whoever consumes the connection next (a TLS
/// handshake, say) calls [`TcpConnection::take_stream`]; the pool then has
/// nothing left to close.
#[derive(Debug, Clone)]
pub struct TcpConnection {
    /// Remote address.
    pub address: SocketAddr,
    /// Domain the address belongs to, if known.
    pub domain: Option<String>,
    /// Allocator inherited from the endpoint.
    pub allocator: TraceIndexAllocator,
    /// Zero time inherited from the endpoint.
    pub zero_time: ZeroTime,
    trace: Arc<Trace>,
    stream: Arc<Mutex<Option<TcpStream>>>,
}

impl TcpConnection {
    /// Returns the trace of this connection.
    ///
    /// Stages that keep using the connection record their events here.
    #[must_use]
    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    /// Takes ownership of the socket. Returns `None` once taken or closed.
    pub fn take_stream(&self) -> Option<TcpStream> {
        self.stream.lock().take()
    }

    /// Returns true once the socket was taken or closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stream.lock().is_none()
    }
}

impl Closer for TcpConnection {
    fn close(&self) -> Result<(), ProbeError> {
        // Dropping the stream closes the socket.
        drop(self.take_stream());
        Ok(())
    }
}

impl ObservationProducer for TcpConnection {
    fn observations(&self) -> Vec<Observations> {
        let obs = self.trace.observations();
        if obs.is_empty() {
            Vec::new()
        } else {
            vec![obs]
        }
    }
}

/// Connects to a TCP endpoint and tracks the connection in a pool.
#[derive(Clone)]
pub struct TcpConnect {
    pool: Arc<ConnectionPool>,
    timeout: Duration,
}

impl TcpConnect {
    /// Creates a connect stage with the default timeout.
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TCP_CONNECT_TIMEOUT,
        }
    }

    /// Creates a connect stage using the configured TCP connect timeout.
    #[must_use]
    pub fn from_config(pool: Arc<ConnectionPool>, config: &ProbeConfig) -> Self {
        Self::new(pool).with_timeout(config.tcp_connect_timeout())
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Stage<Endpoint, TcpConnection> for TcpConnect {
    fn name(&self) -> &str {
        "tcp_connect"
    }

    async fn apply(&self, ctx: &ProbeContext, input: Endpoint) -> Outcome<TcpConnection> {
        if input.network != Network::Tcp {
            return Outcome::failure(ProbeError::other(format!(
                "tcp_connect: unsupported network {}",
                input.network
            )));
        }

        let trace = Arc::new(Trace::new(input.allocator.next_index(), input.zero_time));
        let ol = OperationLogger::start(format!("[#{}] TCPConnect {}", trace.index(), input.address));

        let started = Instant::now();
        let result = ctx
            .run(self.timeout, async {
                TcpStream::connect(input.address)
                    .await
                    .map_err(ProbeError::from)
            })
            .await;

        let failure = result.as_ref().err();
        trace.record_tcp_connect(input.address, started, failure);
        ol.stop(failure);
        let observations = trace.observations();

        let outcome = match result {
            Ok(stream) => {
                let conn = TcpConnection {
                    address: input.address,
                    domain: input.domain,
                    allocator: input.allocator,
                    zero_time: input.zero_time,
                    trace,
                    stream: Arc::new(Mutex::new(Some(stream))),
                };
                self.pool.track(Arc::new(conn.clone()));
                Outcome::success(conn)
            }
            Err(err) => Outcome::failure(err),
        };
        outcome.with_observation(observations)
    }
}

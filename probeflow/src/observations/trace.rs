//! Per-sub-measurement tracing.

use super::records::{
    DnsAnswer, DnsLookupResult, NetworkEvent, Observations, TcpConnectResult, TcpConnectStatus,
    TlsHandshakeResult,
};
use crate::errors::ProbeError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The resolver that performed a DNS lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsEngine {
    /// The system resolver.
    Getaddrinfo,
    /// A DNS-over-UDP server at the given address.
    Udp(SocketAddr),
}

impl DnsEngine {
    /// The engine name recorded in observations.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Getaddrinfo => "getaddrinfo",
            Self::Udp(_) => "udp",
        }
    }

    /// The resolver address recorded in observations, empty for the system
    /// resolver.
    #[must_use]
    pub fn resolver_address(&self) -> String {
        match self {
            Self::Getaddrinfo => String::new(),
            Self::Udp(server) => server.to_string(),
        }
    }
}

/// The reference instant all observation timestamps are relative to.
#[derive(Debug, Clone, Copy)]
pub struct ZeroTime {
    instant: Instant,
    wall_clock: DateTime<Utc>,
}

impl ZeroTime {
    /// Captures the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall_clock: Utc::now(),
        }
    }

    /// Seconds elapsed between zero time and `at`.
    #[must_use]
    pub fn offset_of(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.instant).as_secs_f64()
    }

    /// Seconds elapsed since zero time.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.offset_of(Instant::now())
    }

    /// Wall-clock time of zero time, for the measurement start field.
    #[must_use]
    pub const fn wall_clock(&self) -> DateTime<Utc> {
        self.wall_clock
    }
}

impl Default for ZeroTime {
    fn default() -> Self {
        Self::now()
    }
}

/// Hands out trace indexes to sub-measurements.
///
/// Clones share the same counter. A fresh allocator hands out 1 first.
#[derive(Debug, Clone, Default)]
pub struct TraceIndexAllocator {
    counter: Arc<AtomicI64>,
}

impl TraceIndexAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next index.
    pub fn next_index(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the last index handed out, 0 if none.
    #[must_use]
    pub fn current(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }
}

/// Collects the events of one sub-measurement.
///
/// Everything recorded is tagged with the trace index and timed against
/// the zero time.
#[derive(Debug)]
pub struct Trace {
    index: i64,
    zero_time: ZeroTime,
    recorded: Mutex<Observations>,
}

impl Trace {
    /// Creates a new trace.
    #[must_use]
    pub fn new(index: i64, zero_time: ZeroTime) -> Self {
        Self {
            index,
            zero_time,
            recorded: Mutex::new(Observations::new()),
        }
    }

    /// Returns the trace index.
    #[must_use]
    pub const fn index(&self) -> i64 {
        self.index
    }

    /// Returns the zero time.
    #[must_use]
    pub const fn zero_time(&self) -> ZeroTime {
        self.zero_time
    }

    /// Records a lookup by `engine` that started at `started`.
    pub fn record_dns_lookup(
        &self,
        engine: DnsEngine,
        hostname: &str,
        started: Instant,
        addresses: &[IpAddr],
        failure: Option<&ProbeError>,
    ) {
        let entry = DnsLookupResult {
            answers: addresses.iter().copied().map(DnsAnswer::from_ip).collect(),
            engine: engine.name().to_string(),
            failure: failure.map(ProbeError::failure_string),
            hostname: hostname.to_string(),
            query_type: "ANY".to_string(),
            resolver_address: engine.resolver_address(),
            t0: self.zero_time.offset_of(started),
            t: self.zero_time.elapsed(),
            transaction_id: self.index,
        };
        self.recorded.lock().queries.push(entry);
    }

    /// Records a TCP connect attempt that started at `started`.
    pub fn record_tcp_connect(
        &self,
        address: SocketAddr,
        started: Instant,
        failure: Option<&ProbeError>,
    ) {
        let t0 = self.zero_time.offset_of(started);
        let t = self.zero_time.elapsed();
        let failure = failure.map(ProbeError::failure_string);
        let mut recorded = self.recorded.lock();
        recorded.network_events.push(NetworkEvent {
            address: Some(address.to_string()),
            failure: failure.clone(),
            num_bytes: None,
            operation: "connect".to_string(),
            proto: Some("tcp".to_string()),
            t0,
            t,
            tags: Vec::new(),
            transaction_id: self.index,
        });
        recorded.tcp_connect.push(TcpConnectResult {
            ip: address.ip().to_string(),
            port: address.port(),
            status: TcpConnectStatus {
                blocked: None,
                success: failure.is_none(),
                failure,
            },
            t0,
            t,
            transaction_id: self.index,
        });
    }

    /// Records a handshake measured by an external TLS or QUIC stage.
    pub fn record_tls_handshake(&self, mut result: TlsHandshakeResult) {
        result.transaction_id = self.index;
        self.recorded.lock().tls_handshakes.push(result);
    }

    /// Records an arbitrary network event.
    pub fn record_network_event(&self, mut event: NetworkEvent) {
        event.transaction_id = self.index;
        self.recorded.lock().network_events.push(event);
    }

    /// Takes everything recorded so far. A second call returns an empty record.
    pub fn observations(&self) -> Observations {
        std::mem::take(&mut *self.recorded.lock())
    }
}

//! Archival observation records.
//!
//! Field names follow the archival data format, so a serialized
//! [`Observations`] can be written out as-is by experiment code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Telemetry grouped by type, as produced by one or more stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    /// Low-level I/O events.
    #[serde(default)]
    pub network_events: Vec<NetworkEvent>,

    /// DNS lookup results.
    #[serde(default)]
    pub queries: Vec<DnsLookupResult>,

    /// HTTP transactions.
    #[serde(default)]
    pub requests: Vec<HttpRequestResult>,

    /// TCP connect attempts.
    #[serde(default)]
    pub tcp_connect: Vec<TcpConnectResult>,

    /// TLS or QUIC handshakes.
    #[serde(default)]
    pub tls_handshakes: Vec<TlsHandshakeResult>,
}

impl Observations {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no record of any type is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.network_events.is_empty()
            && self.queries.is_empty()
            && self.requests.is_empty()
            && self.tcp_connect.is_empty()
            && self.tls_handshakes.is_empty()
    }

    /// Appends every record of `other` after the records already present.
    pub fn append(&mut self, other: Self) {
        self.network_events.extend(other.network_events);
        self.queries.extend(other.queries);
        self.requests.extend(other.requests);
        self.tcp_connect.extend(other.tcp_connect);
        self.tls_handshakes.extend(other.tls_handshakes);
    }
}

/// A single I/O operation (read, write, connect, close, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    /// Remote address, if any.
    pub address: Option<String>,
    /// Failure string, if the operation failed.
    pub failure: Option<String>,
    /// Bytes transferred, for reads and writes.
    pub num_bytes: Option<i64>,
    /// Name of the operation.
    pub operation: String,
    /// Transport protocol.
    pub proto: Option<String>,
    /// Start time relative to zero time, in seconds.
    pub t0: f64,
    /// End time relative to zero time, in seconds.
    pub t: f64,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Trace index of the sub-measurement.
    pub transaction_id: i64,
}

/// One resolved address inside a DNS lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsAnswer {
    /// `A` or `AAAA`.
    pub answer_type: String,
    /// IPv4 address for `A` answers.
    pub ipv4: Option<String>,
    /// IPv6 address for `AAAA` answers.
    pub ipv6: Option<String>,
    /// Record TTL when the resolver exposes it.
    pub ttl: Option<u32>,
}

impl DnsAnswer {
    /// Creates the answer for a resolved address.
    #[must_use]
    pub fn from_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Self {
                answer_type: "A".to_string(),
                ipv4: Some(v4.to_string()),
                ipv6: None,
                ttl: None,
            },
            IpAddr::V6(v6) => Self {
                answer_type: "AAAA".to_string(),
                ipv4: None,
                ipv6: Some(v6.to_string()),
                ttl: None,
            },
        }
    }
}

/// A DNS lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsLookupResult {
    /// Resolved answers.
    pub answers: Vec<DnsAnswer>,
    /// Resolver engine, e.g. `getaddrinfo`.
    pub engine: String,
    /// Failure string, if the lookup failed.
    pub failure: Option<String>,
    /// The queried name.
    pub hostname: String,
    /// Query type.
    pub query_type: String,
    /// Resolver address, empty for the system resolver.
    pub resolver_address: String,
    /// Start time relative to zero time, in seconds.
    pub t0: f64,
    /// End time relative to zero time, in seconds.
    pub t: f64,
    /// Trace index of the sub-measurement.
    pub transaction_id: i64,
}

/// Status of a TCP connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConnectStatus {
    /// Blocking verdict, filled in by experiment code.
    pub blocked: Option<bool>,
    /// Failure string, if the connect failed.
    pub failure: Option<String>,
    /// Whether the connect succeeded.
    pub success: bool,
}

/// A TCP connect attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpConnectResult {
    /// Remote IP address.
    pub ip: String,
    /// Remote port.
    pub port: u16,
    /// Connect status.
    pub status: TcpConnectStatus,
    /// Start time relative to zero time, in seconds.
    pub t0: f64,
    /// End time relative to zero time, in seconds.
    pub t: f64,
    /// Trace index of the sub-measurement.
    pub transaction_id: i64,
}

/// A TLS or QUIC handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsHandshakeResult {
    /// `tcp` for TLS, `quic` for QUIC.
    pub network: String,
    /// Remote endpoint.
    pub address: String,
    /// Negotiated cipher suite.
    pub cipher_suite: String,
    /// Failure string, if the handshake failed.
    pub failure: Option<String>,
    /// Negotiated ALPN.
    pub negotiated_protocol: String,
    /// Whether certificate verification was disabled.
    pub no_tls_verify: bool,
    /// Base64 DER of the peer certificates.
    #[serde(default)]
    pub peer_certificates: Vec<String>,
    /// SNI sent to the server.
    pub server_name: String,
    /// Start time relative to zero time, in seconds.
    pub t0: f64,
    /// End time relative to zero time, in seconds.
    pub t: f64,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Negotiated TLS version.
    pub tls_version: String,
    /// Trace index of the sub-measurement.
    pub transaction_id: i64,
}

/// The request half of an HTTP transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// The response half of an HTTP transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code, 0 if no response arrived.
    pub code: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body, possibly truncated.
    pub body: String,
}

/// An HTTP transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequestResult {
    /// Transport network.
    pub network: String,
    /// Remote endpoint.
    pub address: String,
    /// Negotiated ALPN, empty for cleartext.
    pub alpn: String,
    /// Failure string, if the transaction failed.
    pub failure: Option<String>,
    /// The request.
    pub request: HttpRequest,
    /// The response.
    pub response: HttpResponse,
    /// Start time relative to zero time, in seconds.
    pub t0: f64,
    /// End time relative to zero time, in seconds.
    pub t: f64,
    /// Trace index of the sub-measurement.
    pub transaction_id: i64,
}

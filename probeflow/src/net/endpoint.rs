//! Endpoints to measure.

use crate::observations::{TraceIndexAllocator, ZeroTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Transport protocol of an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Settings shared by every endpoint built from an address set.
#[derive(Debug, Clone, Default)]
pub struct EndpointOptions {
    domain: Option<String>,
    allocator: Option<TraceIndexAllocator>,
    zero_time: Option<ZeroTime>,
}

impl EndpointOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the domain the addresses were resolved from.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the trace index allocator.
    #[must_use]
    pub fn with_allocator(mut self, allocator: TraceIndexAllocator) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Sets the zero time.
    #[must_use]
    pub fn with_zero_time(mut self, zero_time: ZeroTime) -> Self {
        self.zero_time = Some(zero_time);
        self
    }
}

/// A network endpoint together with the measurement bookkeeping stages need.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Address to connect to.
    pub address: SocketAddr,
    /// Transport protocol.
    pub network: Network,
    /// Domain the address belongs to, if known.
    pub domain: Option<String>,
    /// Allocator for the trace index of each sub-measurement.
    pub allocator: TraceIndexAllocator,
    /// Reference time for observations.
    pub zero_time: ZeroTime,
}

impl Endpoint {
    /// Creates an endpoint with a fresh allocator and zero time.
    #[must_use]
    pub fn new(network: Network, address: SocketAddr) -> Self {
        Self::with_options(network, address, &EndpointOptions::default())
    }

    /// Creates an endpoint from shared options. Missing options get fresh values.
    #[must_use]
    pub fn with_options(network: Network, address: SocketAddr, options: &EndpointOptions) -> Self {
        Self {
            address,
            network,
            domain: options.domain.clone(),
            allocator: options.allocator.clone().unwrap_or_default(),
            zero_time: options.zero_time.unwrap_or_default(),
        }
    }

    /// Sets the domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the trace index allocator.
    #[must_use]
    pub fn with_allocator(mut self, allocator: TraceIndexAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Sets the zero time.
    #[must_use]
    pub fn with_zero_time(mut self, zero_time: ZeroTime) -> Self {
        self.zero_time = zero_time;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.network)
    }
}

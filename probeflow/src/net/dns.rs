//! DNS lookups: the system resolver and DNS-over-UDP.

use super::endpoint::EndpointOptions;
use crate::config::ProbeConfig;
use crate::context::ProbeContext;
use crate::core::Outcome;
use crate::errors::ProbeError;
use crate::observability::OperationLogger;
use crate::observations::{
    DnsEngine, ObservationProducer, Observations, Trace, TraceIndexAllocator, ZeroTime,
};
use crate::stages::Stage;
use async_trait::async_trait;
use hickory_resolver::config::{LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default timeout of a DNS lookup.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(4);

/// A domain waiting to be resolved.
#[derive(Debug, Clone)]
pub struct DomainToResolve {
    /// Domain name to resolve.
    pub domain: String,
    /// Allocator for the lookup's trace index.
    pub allocator: TraceIndexAllocator,
    /// Reference time for observations.
    pub zero_time: ZeroTime,
}

impl DomainToResolve {
    /// Creates a new lookup input with a fresh allocator and zero time.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            allocator: TraceIndexAllocator::new(),
            zero_time: ZeroTime::now(),
        }
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

/// The state produced by a successful lookup.
#[derive(Debug, Clone)]
pub struct DnsLookupResultState {
    /// Resolved addresses, in resolver order, without duplicates.
    pub addresses: Vec<IpAddr>,
    /// The domain that was resolved.
    pub domain: String,
    /// Allocator inherited from the input.
    pub allocator: TraceIndexAllocator,
    /// Zero time inherited from the input.
    pub zero_time: ZeroTime,
    trace: Arc<Trace>,
}

impl DnsLookupResultState {
    /// Creates a state for addresses known without a lookup, with fresh
    /// bookkeeping and an empty trace.
    #[must_use]
    pub fn new(domain: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        let zero_time = ZeroTime::now();
        Self {
            addresses,
            domain: domain.into(),
            allocator: TraceIndexAllocator::new(),
            zero_time,
            trace: Arc::new(Trace::new(0, zero_time)),
        }
    }

    /// Returns the trace of the lookup.
    #[must_use]
    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    /// Endpoint options carrying this lookup's domain and bookkeeping.
    #[must_use]
    pub fn endpoint_options(&self) -> EndpointOptions {
        EndpointOptions::new()
            .with_domain(self.domain.clone())
            .with_allocator(self.allocator.clone())
            .with_zero_time(self.zero_time)
    }
}

impl ObservationProducer for DnsLookupResultState {
    fn observations(&self) -> Vec<Observations> {
        let obs = self.trace.observations();
        if obs.is_empty() {
            Vec::new()
        } else {
            vec![obs]
        }
    }
}

/// Resolves a domain with the system resolver.
#[derive(Debug, Clone)]
pub struct DnsLookupGetaddrinfo {
    timeout: Duration,
}

impl Default for DnsLookupGetaddrinfo {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DNS_TIMEOUT,
        }
    }
}

impl DnsLookupGetaddrinfo {
    /// Creates a lookup stage with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a lookup stage using the configured DNS timeout.
    #[must_use]
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new().with_timeout(config.dns_timeout())
    }

    /// Sets the lookup timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the lookup timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Stage<DomainToResolve, DnsLookupResultState> for DnsLookupGetaddrinfo {
    fn name(&self) -> &str {
        "dns_lookup_getaddrinfo"
    }

    async fn apply(
        &self,
        ctx: &ProbeContext,
        input: DomainToResolve,
    ) -> Outcome<DnsLookupResultState> {
        let lookup = system_lookup(input.domain.clone());
        resolve(ctx, input, DnsEngine::Getaddrinfo, self.timeout, lookup).await
    }
}

/// Resolves a domain by querying one DNS server over UDP.
///
/// IP literals resolve to themselves without a query.
#[derive(Debug, Clone)]
pub struct DnsLookupUdp {
    resolver: SocketAddr,
    timeout: Duration,
}

impl DnsLookupUdp {
    /// Creates a lookup stage querying `resolver` with the default timeout.
    #[must_use]
    pub fn new(resolver: SocketAddr) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_DNS_TIMEOUT,
        }
    }

    /// Creates a lookup stage querying `resolver` with the configured DNS timeout.
    #[must_use]
    pub fn from_config(resolver: SocketAddr, config: &ProbeConfig) -> Self {
        Self::new(resolver).with_timeout(config.dns_timeout())
    }

    /// Sets the lookup timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the lookup timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the address of the queried server.
    #[must_use]
    pub const fn resolver(&self) -> SocketAddr {
        self.resolver
    }

    fn build_resolver(&self) -> TokioAsyncResolver {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(self.resolver, Protocol::Udp));

        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        opts.use_hosts_file = false;

        TokioAsyncResolver::tokio(config, opts)
    }
}

#[async_trait]
impl Stage<DomainToResolve, DnsLookupResultState> for DnsLookupUdp {
    fn name(&self) -> &str {
        "dns_lookup_udp"
    }

    async fn apply(
        &self,
        ctx: &ProbeContext,
        input: DomainToResolve,
    ) -> Outcome<DnsLookupResultState> {
        let lookup = udp_lookup(self.build_resolver(), input.domain.clone());
        resolve(ctx, input, DnsEngine::Udp(self.resolver), self.timeout, lookup).await
    }
}

// Runs one lookup under its own trace and turns the result into an outcome
// carrying the lookup's observations.
async fn resolve<F>(
    ctx: &ProbeContext,
    input: DomainToResolve,
    engine: DnsEngine,
    timeout: Duration,
    lookup: F,
) -> Outcome<DnsLookupResultState>
where
    F: Future<Output = Result<Vec<IpAddr>, ProbeError>> + Send,
{
    let trace = Arc::new(Trace::new(input.allocator.next_index(), input.zero_time));
    let label = match engine {
        DnsEngine::Getaddrinfo => "getaddrinfo".to_string(),
        DnsEngine::Udp(server) => format!("{server}/udp"),
    };
    let ol = OperationLogger::start(format!(
        "[#{}] DNSLookup[{label}] {}",
        trace.index(),
        input.domain
    ));

    let started = Instant::now();
    let result = ctx.run(timeout, lookup).await.and_then(|addresses| {
        if addresses.is_empty() {
            Err(ProbeError::DnsNoAnswer)
        } else {
            Ok(addresses)
        }
    });

    let (addresses, failure) = match &result {
        Ok(addresses) => (addresses.as_slice(), None),
        Err(err) => (&[][..], Some(err)),
    };
    trace.record_dns_lookup(engine, &input.domain, started, addresses, failure);
    ol.stop(failure);
    let observations = trace.observations();

    let outcome = match result {
        Ok(addresses) => Outcome::success(DnsLookupResultState {
            addresses,
            domain: input.domain,
            allocator: input.allocator,
            zero_time: input.zero_time,
            trace,
        }),
        Err(err) => Outcome::failure(err),
    };
    outcome.with_observation(observations)
}

async fn system_lookup(domain: String) -> Result<Vec<IpAddr>, ProbeError> {
    let resolved = tokio::net::lookup_host((domain.as_str(), 0))
        .await
        .map_err(|err| classify_lookup_error(&err))?;
    Ok(dedup(resolved.map(|addr| addr.ip())))
}

async fn udp_lookup(resolver: TokioAsyncResolver, domain: String) -> Result<Vec<IpAddr>, ProbeError> {
    let lookup = resolver
        .lookup_ip(domain.as_str())
        .await
        .map_err(|err| classify_resolve_error(&err))?;
    Ok(dedup(lookup.iter()))
}

// Keeps resolver order.
fn dedup(ips: impl Iterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut addresses: Vec<IpAddr> = Vec::new();
    for ip in ips {
        if !addresses.contains(&ip) {
            addresses.push(ip);
        }
    }
    addresses
}

fn classify_resolve_error(err: &ResolveError) -> ProbeError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                ProbeError::DnsNxdomain
            } else {
                ProbeError::DnsNoAnswer
            }
        }
        ResolveErrorKind::Timeout => ProbeError::Timeout,
        ResolveErrorKind::Io(io_err) => ProbeError::from_io(io_err),
        _ if err.to_string().to_lowercase().contains("timed out") => ProbeError::Timeout,
        _ => ProbeError::other(err.to_string()),
    }
}

// getaddrinfo failures surface as opaque io errors; the message is all we get.
fn classify_lookup_error(err: &io::Error) -> ProbeError {
    let message = err.to_string().to_lowercase();
    if message.contains("not known")
        || message.contains("nodename nor servname")
        || message.contains("no such host")
    {
        ProbeError::DnsNxdomain
    } else if message.contains("no address associated") {
        ProbeError::DnsNoAnswer
    } else {
        ProbeError::from_io(err)
    }
}

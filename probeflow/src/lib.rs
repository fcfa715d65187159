//! # Probeflow
//!
//! Composable stages and bounded-parallel scheduling for network
//! measurement probes.
//!
//! Probeflow provides:
//!
//! - **Outcomes**: success, failure or skip, each carrying the observations
//!   gathered on the way
//! - **Composition**: chain fallible stages head to tail with short-circuiting
//! - **Scheduling**: apply a stage to many inputs, or many stages to one
//!   input, with a fixed number of workers
//! - **Observations**: archival network telemetry keyed by trace index
//! - **Leaf stages**: DNS lookup and TCP connect, tracked in a connection pool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use probeflow::prelude::*;
//!
//! let ctx = ProbeContext::new();
//! let pool = Arc::new(ConnectionPool::new());
//!
//! let dns = DnsLookupGetaddrinfo::new()
//!     .apply(&ctx, DomainToResolve::new("example.com"))
//!     .await;
//! let options = dns.value().map(DnsLookupResultState::endpoint_options).unwrap_or_default();
//! let mut addrs = AddressSet::from_dns(&[dns]);
//! addrs.remove_bogons();
//!
//! let connect = compose(TcpConnect::new(Arc::clone(&pool)), close::<TcpConnection>());
//! let outcomes = map(&ctx, 2, connect, addrs.to_endpoints(Network::Tcp, 443, &options)).await;
//! let failure = select_error(&outcomes);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod analysis;
pub mod combinators;
pub mod compose;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod net;
pub mod observability;
pub mod observations;
pub mod pool;
pub mod scheduler;
pub mod stages;
pub mod stream;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        count_skipped, count_successes, first_error, first_error_excluding_broken_ipv6,
        select_error,
    };
    pub use crate::combinators::{Counter, ErrorLogger, Gate};
    pub use crate::compose::{compose, compose_flat, flat_map, Chain, PipelineBuilder};
    pub use crate::config::{LogFormat, LoggingConfig, ProbeConfig};
    pub use crate::context::{CancellationToken, ProbeContext};
    pub use crate::core::{Outcome, OutcomeStatus};
    pub use crate::errors::{ConfigError, ContractViolation, ProbeError};
    pub use crate::net::{
        AddressSet, DnsLookupGetaddrinfo, DnsLookupResultState, DnsLookupUdp, DomainToResolve,
        Endpoint, EndpointOptions, Network, TcpConnect, TcpConnection,
    };
    pub use crate::observability::{init_logging, OperationLogger};
    pub use crate::observations::{
        extract_observations, merge_outcomes, ObservationBuffer, ObservationCollector,
        ObservationProducer, Observations, TraceIndexAllocator, ZeroTime,
    };
    pub use crate::pool::{close, Closer, ConnectionPool};
    pub use crate::scheduler::{map, map_async, parallel, parallel_async, Parallelism};
    pub use crate::stages::{identity, lambda, stage_fn, SharedStage, Stage};
    pub use crate::stream::{collect, stream, zip, zip_and_collect, Streamable};
    pub use std::sync::Arc;
}

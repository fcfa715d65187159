//! Leaf network stages.
//!
//! A typical probe resolves a domain with [`DnsLookupGetaddrinfo`] or
//! [`DnsLookupUdp`] (or races both through [`crate::scheduler::parallel`]), turns
//! the answers into endpoints through an [`AddressSet`], and fans the
//! endpoints out to [`TcpConnect`] with [`crate::scheduler::map`]. TLS,
//! QUIC and HTTP stages live outside this crate; they consume a
//! [`TcpConnection`] and record into its [`Trace`](crate::observations::Trace).

mod address;
mod dns;
mod endpoint;
mod tcp;

#[cfg(test)]
mod net_tests;

pub use address::{is_bogon, AddressSet};
pub use dns::{
    DnsLookupGetaddrinfo, DnsLookupResultState, DnsLookupUdp, DomainToResolve, DEFAULT_DNS_TIMEOUT,
};
pub use endpoint::{Endpoint, EndpointOptions, Network};
pub use tcp::{TcpConnect, TcpConnection, DEFAULT_TCP_CONNECT_TIMEOUT};

//! Sets of IP addresses gathered from lookups.

use super::dns::DnsLookupResultState;
use super::endpoint::{Endpoint, EndpointOptions, Network};
use crate::core::Outcome;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// A deduplicated, ordered set of IP addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    addresses: BTreeSet<IpAddr>,
}

impl AddressSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the addresses of every successful lookup.
    #[must_use]
    pub fn from_dns(outcomes: &[Outcome<DnsLookupResultState>]) -> Self {
        let addresses = outcomes
            .iter()
            .filter_map(Outcome::value)
            .flat_map(|state| state.addresses.iter().copied())
            .collect();
        Self { addresses }
    }

    /// Adds an address.
    pub fn add(&mut self, ip: IpAddr) -> &mut Self {
        self.addresses.insert(ip);
        self
    }

    /// Removes private, loopback, link-local and otherwise non-routable addresses.
    pub fn remove_bogons(&mut self) -> &mut Self {
        self.addresses.retain(|ip| !is_bogon(*ip));
        self
    }

    /// Returns the number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Returns true if the set holds no address.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Returns true if `ip` is in the set.
    #[must_use]
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addresses.contains(ip)
    }

    /// Iterates over the addresses, IPv4 first.
    pub fn iter(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter()
    }

    /// Builds one endpoint per address.
    #[must_use]
    pub fn to_endpoints(&self, network: Network, port: u16, options: &EndpointOptions) -> Vec<Endpoint> {
        self.addresses
            .iter()
            .map(|ip| Endpoint::with_options(network, SocketAddr::new(*ip, port), options))
            .collect()
    }
}

impl FromIterator<IpAddr> for AddressSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}

/// Returns true for addresses that should never show up in a public DNS answer.
#[must_use]
pub fn is_bogon(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_bogon_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_bogon_v4(v4),
            None => is_bogon_v6(v6),
        },
    }
}

fn is_bogon_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || a == 0
        // 100.64.0.0/10, carrier-grade NAT
        || (a == 100 && (b & 0xc0) == 64)
        // 198.18.0.0/15, benchmarking
        || (a == 198 && (b & 0xfe) == 18)
        // 240.0.0.0/4, reserved
        || a >= 240
}

fn is_bogon_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7, unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10, link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32, documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}

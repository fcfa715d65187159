//! End-to-end probes over loopback.

#[cfg(test)]
mod tests {
    use crate::analysis::{count_successes, first_error, select_error};
    use crate::combinators::Gate;
    use crate::compose::compose;
    use crate::context::ProbeContext;
    use crate::errors::ProbeError;
    use crate::net::{
        AddressSet, DnsLookupGetaddrinfo, DnsLookupResultState, DnsLookupUdp, DomainToResolve,
        Endpoint, EndpointOptions, Network, TcpConnect, TcpConnection,
    };
    use crate::observations::{merge_outcomes, ObservationBuffer, TraceIndexAllocator, ZeroTime};
    use crate::pool::{close, ConnectionPool};
    use crate::scheduler::{map, parallel};
    use crate::stages::{SharedStage, Stage};
    use pretty_assertions::assert_eq;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::{TcpListener, UdpSocket};

    async fn closed_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_then_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let ctx = ProbeContext::new();
        let pool = Arc::new(ConnectionPool::new());
        let allocator = TraceIndexAllocator::new();

        let lookup = DnsLookupGetaddrinfo::new()
            .apply(
                &ctx,
                DomainToResolve::new("127.0.0.1").with_allocator(allocator.clone()),
            )
            .await;
        let dns_outcomes = vec![lookup];
        let options = dns_outcomes[0].value().unwrap().endpoint_options();
        let endpoints = AddressSet::from_dns(&dns_outcomes).to_endpoints(Network::Tcp, port, &options);
        assert_eq!(endpoints.len(), 1);

        let connect_and_close = compose(TcpConnect::new(Arc::clone(&pool)), close::<TcpConnection>());
        let outcomes = map(&ctx, 2, connect_and_close, endpoints).await;

        assert_eq!(count_successes(&outcomes), 1);
        assert!(select_error(&outcomes).is_none());
        let conn = outcomes[0].value().unwrap();
        assert!(conn.is_closed());
        assert_eq!(conn.domain.as_deref(), Some("127.0.0.1"));
        assert_eq!(conn.trace().index(), 2);
        assert_eq!(allocator.current(), 2);

        let buffer = ObservationBuffer::new();
        merge_outcomes(&buffer, &dns_outcomes);
        merge_outcomes(&buffer, &outcomes);
        let merged = buffer.take();
        assert_eq!(merged.queries.len(), 1);
        assert_eq!(merged.tcp_connect.len(), 1);
        assert_eq!(merged.tcp_connect[0].transaction_id, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_races_both_resolvers() {
        // Never answers; the literal below needs no query anyway.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let allocator = TraceIndexAllocator::new();
        let input = DomainToResolve::new("127.0.0.1").with_allocator(allocator.clone());
        let resolvers: Vec<SharedStage<DomainToResolve, DnsLookupResultState>> = vec![
            Arc::new(DnsLookupGetaddrinfo::new()),
            Arc::new(DnsLookupUdp::new(server_addr)),
        ];

        let outcomes = parallel(&ProbeContext::new(), 2, input, resolvers).await;

        assert_eq!(count_successes(&outcomes), 2);
        assert_eq!(AddressSet::from_dns(&outcomes).len(), 1);
        assert_eq!(allocator.current(), 2);

        let buffer = ObservationBuffer::new();
        merge_outcomes(&buffer, &outcomes);
        let merged = buffer.take();
        let mut engines: Vec<(String, String)> = merged
            .queries
            .iter()
            .map(|q| (q.engine.clone(), q.resolver_address.clone()))
            .collect();
        engines.sort();
        assert_eq!(
            engines,
            vec![
                ("getaddrinfo".to_string(), String::new()),
                ("udp".to_string(), server_addr.to_string()),
            ]
        );
        let mut ids: Vec<i64> = merged.queries.iter().map(|q| q.transaction_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_endpoints_share_allocator() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap();
        let options = EndpointOptions::new()
            .with_allocator(TraceIndexAllocator::new())
            .with_zero_time(ZeroTime::now());
        let endpoints = vec![
            Endpoint::with_options(Network::Tcp, closed_port().await, &options),
            Endpoint::with_options(Network::Tcp, open, &options),
            Endpoint::with_options(Network::Tcp, closed_port().await, &options),
        ];
        let pool = Arc::new(ConnectionPool::new());
        let ctx = ProbeContext::new();

        let outcomes = map(&ctx, 3, TcpConnect::new(Arc::clone(&pool)), endpoints).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(count_successes(&outcomes), 1);
        assert_eq!(first_error(&outcomes), Some(&ProbeError::ConnectionRefused));
        assert_eq!(pool.len(), 1);

        let buffer = ObservationBuffer::new();
        merge_outcomes(&buffer, &outcomes);
        let mut ids: Vec<i64> = buffer
            .snapshot()
            .tcp_connect
            .iter()
            .map(|t| t.transaction_id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(pool.close().is_empty());
        assert!(pool.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_allows_single_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoints: Vec<Endpoint> = (0..4).map(|_| Endpoint::new(Network::Tcp, addr)).collect();
        let pool = Arc::new(ConnectionPool::new());
        let gate = Gate::new();

        let outcomes = map(
            &ProbeContext::new(),
            4,
            gate.wrap(TcpConnect::new(Arc::clone(&pool))),
            endpoints,
        )
        .await;

        assert_eq!(count_successes(&outcomes), 1);
        assert_eq!(outcomes.iter().filter(|o| o.is_skipped()).count(), 3);
        assert!(first_error(&outcomes).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_all_refused_selects_refused() {
        let endpoints = vec![
            Endpoint::new(Network::Tcp, closed_port().await),
            Endpoint::new(Network::Tcp, closed_port().await),
        ];
        let pool = Arc::new(ConnectionPool::new());

        let outcomes = map(&ProbeContext::new(), 2, TcpConnect::new(pool), endpoints).await;

        assert_eq!(select_error(&outcomes), Some(ProbeError::ConnectionRefused));
    }
}

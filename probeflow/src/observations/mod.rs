//! Network telemetry collected as a side channel of stages.
//!
//! Each sub-measurement gets a [`Trace`] tagged with an index from a shared
//! [`TraceIndexAllocator`] and timed against a shared [`ZeroTime`]. Traces
//! drain into [`Observations`] records, which travel inside outcomes and are
//! finally merged into an [`ObservationCollector`].

mod collector;
mod records;
mod trace;

pub use collector::{
    extract_observations, merge_outcomes, ObservationBuffer, ObservationCollector,
    ObservationProducer,
};
pub use records::{
    DnsAnswer, DnsLookupResult, HttpRequest, HttpRequestResult, HttpResponse, NetworkEvent,
    Observations, TcpConnectResult, TcpConnectStatus, TlsHandshakeResult,
};
pub use trace::{DnsEngine, Trace, TraceIndexAllocator, ZeroTime};

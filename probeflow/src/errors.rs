//! Error types for probeflow.
//!
//! Stage failures are data: they travel inside an [`Outcome`](crate::core::Outcome)
//! and never cross a stage boundary as a panic. Misusing an outcome (unwrapping
//! the wrong variant) is a programming error and is reported through
//! [`ContractViolation`].

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Failure of a leaf network operation.
///
/// The `Display` representation is the failure string stored in observations
/// (for example `connection_refused`), which keeps archival output stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeError {
    /// The peer refused the connection.
    #[error("connection_refused")]
    ConnectionRefused,

    /// The peer reset the connection.
    #[error("connection_reset")]
    ConnectionReset,

    /// No route to the destination network.
    #[error("network_unreachable")]
    NetworkUnreachable,

    /// No route to the destination host.
    #[error("host_unreachable")]
    HostUnreachable,

    /// The operation exceeded its time budget.
    #[error("generic_timeout_error")]
    Timeout,

    /// The context was cancelled while the operation was running.
    #[error("interrupted")]
    Cancelled,

    /// The domain does not exist.
    #[error("dns_nxdomain_error")]
    DnsNxdomain,

    /// The resolver returned no usable answer.
    #[error("dns_no_answer")]
    DnsNoAnswer,

    /// The resolver returned only bogon addresses.
    #[error("dns_bogon_error")]
    DnsBogon,

    /// Unexpected end of stream.
    #[error("eof_error")]
    Eof,

    /// The TLS handshake failed.
    #[error("ssl_failed_handshake")]
    TlsHandshake,

    /// No error and no success were observed.
    #[error("unknown_failure")]
    Unknown,

    /// Any other failure, carried verbatim.
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Creates an error carrying an arbitrary failure string.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Classifies an I/O error into the failure taxonomy.
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                Self::ConnectionReset
            }
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::Eof,
            io::ErrorKind::Interrupted => Self::Cancelled,
            _ => Self::from_raw_os_error(err).unwrap_or_else(|| Self::Other(err.to_string())),
        }
    }

    // ErrorKind::NetworkUnreachable and HostUnreachable are not stable on
    // our MSRV, so fall back to the errno values.
    fn from_raw_os_error(err: &io::Error) -> Option<Self> {
        #[cfg(unix)]
        {
            match err.raw_os_error() {
                Some(101) => Some(Self::NetworkUnreachable),
                Some(113) => Some(Self::HostUnreachable),
                _ => None,
            }
        }
        #[cfg(not(unix))]
        {
            let _ = err;
            None
        }
    }

    /// Returns true for failures commonly caused by a broken IPv6 setup.
    ///
    /// These are not a censorship signal and aggregation helpers skip them
    /// when looking for a meaningful error.
    #[must_use]
    pub fn is_broken_ipv6(&self) -> bool {
        matches!(self, Self::NetworkUnreachable | Self::HostUnreachable)
    }

    /// Returns the failure string as stored in observations.
    #[must_use]
    pub fn failure_string(&self) -> String {
        self.to_string()
    }
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

/// A programming contract was violated, for example by unwrapping the value
/// of a failed outcome. Never used for expected network conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// `unwrap` called on an outcome that holds an error.
    #[error("outcome does not contain a value: {0}")]
    NoValue(ProbeError),

    /// `unwrap` called on a skipped outcome.
    #[error("outcome was skipped: {0}")]
    Skipped(String),

    /// `unwrap_error` called on an outcome that does not hold an error.
    #[error("outcome does not contain an error")]
    NoError,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field holds an invalid value.
    #[error("Invalid configuration field '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_strings() {
        assert_eq!(ProbeError::ConnectionRefused.to_string(), "connection_refused");
        assert_eq!(ProbeError::Timeout.to_string(), "generic_timeout_error");
        assert_eq!(ProbeError::Cancelled.to_string(), "interrupted");
        assert_eq!(ProbeError::Unknown.to_string(), "unknown_failure");
        assert_eq!(ProbeError::other("weird").to_string(), "weird");
    }

    #[test]
    fn test_from_io_classification() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ProbeError::from_io(&refused), ProbeError::ConnectionRefused);

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(ProbeError::from(reset), ProbeError::ConnectionReset);

        let timeout = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(ProbeError::from_io(&timeout), ProbeError::Timeout);

        let other = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(ProbeError::from_io(&other), ProbeError::other("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_io_unreachable_errno() {
        let net = io::Error::from_raw_os_error(101);
        assert_eq!(ProbeError::from_io(&net), ProbeError::NetworkUnreachable);

        let host = io::Error::from_raw_os_error(113);
        assert_eq!(ProbeError::from_io(&host), ProbeError::HostUnreachable);
    }

    #[test]
    fn test_is_broken_ipv6() {
        assert!(ProbeError::NetworkUnreachable.is_broken_ipv6());
        assert!(ProbeError::HostUnreachable.is_broken_ipv6());
        assert!(!ProbeError::ConnectionRefused.is_broken_ipv6());
    }

    #[test]
    fn test_contract_violation_messages() {
        let err = ContractViolation::NoValue(ProbeError::ConnectionRefused);
        assert!(err.to_string().contains("connection_refused"));
        assert_eq!(
            ContractViolation::NoError.to_string(),
            "outcome does not contain an error"
        );
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::invalid("parallelism", "must be positive");
        assert!(err.to_string().contains("parallelism"));
    }

    #[test]
    fn test_probe_error_serialize() {
        let json = serde_json::to_string(&ProbeError::DnsBogon).unwrap();
        assert_eq!(json, r#""dns_bogon""#);
    }
}

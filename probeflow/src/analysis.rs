//! Picking a meaningful error out of a list of outcomes.
//!
//! Skipped outcomes are deliberate non-results and never count as errors.
//! Deciding what the errors mean (blocked or not) is left to the caller.

use crate::core::Outcome;
use crate::errors::ProbeError;

/// Returns the first failure in the list.
#[must_use]
pub fn first_error<T>(outcomes: &[Outcome<T>]) -> Option<&ProbeError> {
    outcomes.iter().find_map(Outcome::error)
}

/// Returns the first failure that is not typical of a broken IPv6 setup.
#[must_use]
pub fn first_error_excluding_broken_ipv6<T>(outcomes: &[Outcome<T>]) -> Option<&ProbeError> {
    outcomes
        .iter()
        .filter_map(Outcome::error)
        .find(|err| !err.is_broken_ipv6())
}

/// Selects the error to report for a set of attempts.
///
/// Returns `None` if any attempt succeeded. Otherwise prefers an error not
/// caused by broken IPv6, then any error, then [`ProbeError::Unknown`].
#[must_use]
pub fn select_error<T>(outcomes: &[Outcome<T>]) -> Option<ProbeError> {
    if outcomes.iter().any(Outcome::is_success) {
        return None;
    }
    let err = first_error_excluding_broken_ipv6(outcomes)
        .or_else(|| first_error(outcomes))
        .cloned()
        .unwrap_or(ProbeError::Unknown);
    Some(err)
}

/// Counts the successful outcomes.
#[must_use]
pub fn count_successes<T>(outcomes: &[Outcome<T>]) -> usize {
    outcomes.iter().filter(|o| o.is_success()).count()
}

/// Counts the skipped outcomes.
#[must_use]
pub fn count_skipped<T>(outcomes: &[Outcome<T>]) -> usize {
    outcomes.iter().filter(|o| o.is_skipped()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(err: ProbeError) -> Outcome<()> {
        Outcome::failure(err)
    }

    #[test]
    fn test_first_error_ignores_skips() {
        let outcomes = vec![
            Outcome::skipped("gate"),
            Outcome::success(()),
            failed(ProbeError::Timeout),
            failed(ProbeError::Eof),
        ];
        assert_eq!(first_error(&outcomes), Some(&ProbeError::Timeout));
    }

    #[test]
    fn test_first_error_empty() {
        let outcomes: Vec<Outcome<()>> = vec![Outcome::skipped("gate")];
        assert!(first_error(&outcomes).is_none());
    }

    #[test]
    fn test_first_error_excluding_broken_ipv6() {
        let outcomes = vec![
            failed(ProbeError::NetworkUnreachable),
            failed(ProbeError::HostUnreachable),
            failed(ProbeError::ConnectionReset),
        ];
        assert_eq!(
            first_error_excluding_broken_ipv6(&outcomes),
            Some(&ProbeError::ConnectionReset)
        );
        assert_eq!(first_error(&outcomes), Some(&ProbeError::NetworkUnreachable));
    }

    #[test]
    fn test_select_error_fallbacks() {
        let any_success = vec![failed(ProbeError::Timeout), Outcome::success(())];
        assert_eq!(select_error(&any_success), None);

        let only_ipv6 = vec![failed(ProbeError::NetworkUnreachable)];
        assert_eq!(select_error(&only_ipv6), Some(ProbeError::NetworkUnreachable));

        let mixed = vec![
            failed(ProbeError::HostUnreachable),
            failed(ProbeError::TlsHandshake),
        ];
        assert_eq!(select_error(&mixed), Some(ProbeError::TlsHandshake));

        let only_skips: Vec<Outcome<()>> = vec![Outcome::skipped("a"), Outcome::skipped("b")];
        assert_eq!(select_error(&only_skips), Some(ProbeError::Unknown));

        let nothing: Vec<Outcome<()>> = Vec::new();
        assert_eq!(select_error(&nothing), Some(ProbeError::Unknown));
    }

    #[test]
    fn test_counts() {
        let outcomes = vec![
            Outcome::success(()),
            Outcome::skipped("x"),
            Outcome::skipped("y"),
            failed(ProbeError::Eof),
        ];
        assert_eq!(count_successes(&outcomes), 1);
        assert_eq!(count_skipped(&outcomes), 2);
    }
}

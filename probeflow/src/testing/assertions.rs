//! Test assertions for outcomes.

use super::mocks::observation_ids;
use crate::core::Outcome;
use crate::errors::ProbeError;
use std::fmt::Debug;

/// Asserts that the outcome is a success and returns its value.
pub fn assert_outcome_success<T: Debug>(outcome: &Outcome<T>) -> &T {
    match outcome.value() {
        Some(value) => value,
        None => panic!("Expected success, got status: {:?}", outcome.status()),
    }
}

/// Asserts that the outcome failed with `expected`.
pub fn assert_outcome_failure<T: Debug>(outcome: &Outcome<T>, expected: &ProbeError) {
    assert_eq!(
        outcome.error(),
        Some(expected),
        "Expected failure {expected:?}, got status: {:?}",
        outcome.status()
    );
}

/// Asserts that the outcome was skipped.
pub fn assert_outcome_skipped<T: Debug>(outcome: &Outcome<T>) {
    assert!(
        outcome.is_skipped(),
        "Expected skip, got status: {:?}",
        outcome.status()
    );
}

/// Asserts the ids of the tagged observations carried by the outcome.
pub fn assert_observation_order<T>(outcome: &Outcome<T>, expected: &[i64]) {
    let actual = observation_ids(outcome);
    assert_eq!(
        actual, expected,
        "Expected observation order {expected:?}, got {actual:?}"
    );
}

//! The value every stage returns.

use super::OutcomeStatus;
use crate::errors::{ContractViolation, ProbeError};
use crate::observations::Observations;

/// The variant part of an [`Outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// The stage produced a value.
    Success(T),
    /// The stage failed.
    Failure(ProbeError),
    /// The stage declined to produce a result, with a reason.
    Skipped(String),
}

impl<T> Payload<T> {
    /// Re-types a non-success payload, handing back the value on success.
    pub fn retype<U>(self) -> Result<T, Payload<U>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(err) => Err(Payload::Failure(err)),
            Self::Skipped(reason) => Err(Payload::Skipped(reason)),
        }
    }
}

/// Result of applying a stage: a success value, a failure or a skip, plus
/// the observations collected while producing it.
///
/// Outcomes are built once and are not mutated afterwards except by
/// appending observations during composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    payload: Payload<T>,
    observations: Vec<Observations>,
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(value: T) -> Self {
        Self::from_payload(Payload::Success(value))
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(error: ProbeError) -> Self {
        Self::from_payload(Payload::Failure(error))
    }

    /// Creates a skipped outcome.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::from_payload(Payload::Skipped(reason.into()))
    }

    /// Creates an outcome from a payload with no observations.
    #[must_use]
    pub fn from_payload(payload: Payload<T>) -> Self {
        Self {
            payload,
            observations: Vec::new(),
        }
    }

    /// Creates an outcome from a `Result`.
    #[must_use]
    pub fn from_result(result: Result<T, ProbeError>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(err),
        }
    }

    /// Attaches observations to this outcome, after any it already holds.
    #[must_use]
    pub fn with_observations(mut self, observations: impl IntoIterator<Item = Observations>) -> Self {
        self.observations.extend(observations);
        self
    }

    /// Attaches a single observation record.
    #[must_use]
    pub fn with_observation(mut self, observations: Observations) -> Self {
        self.observations.push(observations);
        self
    }

    /// Puts `earlier` in front of the observations this outcome holds.
    #[must_use]
    pub fn prepend_observations(mut self, mut earlier: Vec<Observations>) -> Self {
        if !earlier.is_empty() {
            earlier.append(&mut self.observations);
            self.observations = earlier;
        }
        self
    }

    /// Returns the status of this outcome.
    #[must_use]
    pub const fn status(&self) -> OutcomeStatus {
        match self.payload {
            Payload::Success(_) => OutcomeStatus::Success,
            Payload::Failure(_) => OutcomeStatus::Failure,
            Payload::Skipped(_) => OutcomeStatus::Skipped,
        }
    }

    /// Returns true if the stage produced a value.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.payload, Payload::Success(_))
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.payload, Payload::Failure(_))
    }

    /// Returns true if the stage was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.payload, Payload::Skipped(_))
    }

    /// Returns the success value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match &self.payload {
            Payload::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the error, or `None` when this outcome is not a failure.
    #[must_use]
    pub const fn error(&self) -> Option<&ProbeError> {
        match &self.payload {
            Payload::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the skip reason, if skipped.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match &self.payload {
            Payload::Skipped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload<T> {
        &self.payload
    }

    /// Returns the observations collected so far.
    #[must_use]
    pub fn observations(&self) -> &[Observations] {
        &self.observations
    }

    /// Splits the outcome into its payload and observations.
    #[must_use]
    pub fn into_parts(self) -> (Payload<T>, Vec<Observations>) {
        (self.payload, self.observations)
    }

    /// Converts into a `Result`, or reports why there is no value.
    pub fn into_result(self) -> Result<T, ContractViolation> {
        match self.payload {
            Payload::Success(value) => Ok(value),
            Payload::Failure(err) => Err(ContractViolation::NoValue(err)),
            Payload::Skipped(reason) => Err(ContractViolation::Skipped(reason)),
        }
    }

    /// Returns the success value.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is a failure or was skipped. This is a
    /// programming error, not a network condition.
    #[must_use]
    pub fn unwrap(self) -> T {
        match self.into_result() {
            Ok(value) => value,
            Err(violation) => panic!("{violation}"),
        }
    }

    /// Returns the error.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is not a failure.
    #[must_use]
    pub fn unwrap_error(self) -> ProbeError {
        match self.payload {
            Payload::Failure(err) => err,
            _ => panic!("{}", ContractViolation::NoError),
        }
    }

    /// Applies `f` to the success value, keeping observations.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        let payload = match self.payload {
            Payload::Success(value) => Payload::Success(f(value)),
            Payload::Failure(err) => Payload::Failure(err),
            Payload::Skipped(reason) => Payload::Skipped(reason),
        };
        Outcome {
            payload,
            observations: self.observations,
        }
    }

    /// Takes the success value and observations, or re-types the outcome so
    /// it can be forwarded unchanged.
    pub fn into_success<U>(self) -> Result<(T, Vec<Observations>), Outcome<U>> {
        match self.payload.retype() {
            Ok(value) => Ok((value, self.observations)),
            Err(payload) => Err(Outcome {
                payload,
                observations: self.observations,
            }),
        }
    }
}

impl<T> Outcome<Outcome<T>> {
    /// Flattens a nested outcome.
    ///
    /// The outer observations come before the inner ones. A failure or skip
    /// at either level is propagated.
    #[must_use]
    pub fn flatten(self) -> Outcome<T> {
        match self.into_success() {
            Ok((inner, outer)) => inner.prepend_observations(outer),
            Err(halted) => halted,
        }
    }
}

impl<T> From<Result<T, ProbeError>> for Outcome<T> {
    fn from(result: Result<T, ProbeError>) -> Self {
        Self::from_result(result)
    }
}

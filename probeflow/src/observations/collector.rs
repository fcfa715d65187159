//! Where observations end up.

use super::records::Observations;
use crate::core::Outcome;
use parking_lot::Mutex;

/// Anything that yields observations, typically a stage's output state.
pub trait ObservationProducer {
    /// Returns the observations held by this value.
    ///
    /// Implementations drain their source: a second call returns nothing new.
    fn observations(&self) -> Vec<Observations>;
}

/// Sink that experiment code implements to accumulate telemetry.
///
/// `merge` may be called from several workers at once.
#[cfg_attr(test, mockall::automock)]
pub trait ObservationCollector: Send + Sync {
    /// Merges observations into the collector.
    fn merge(&self, observations: Vec<Observations>);
}

/// A mutex-guarded collector that concatenates everything it receives.
#[derive(Debug, Default)]
pub struct ObservationBuffer {
    merged: Mutex<Observations>,
}

impl ObservationBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything merged so far.
    #[must_use]
    pub fn snapshot(&self) -> Observations {
        self.merged.lock().clone()
    }

    /// Takes everything merged so far, leaving the buffer empty.
    pub fn take(&self) -> Observations {
        std::mem::take(&mut *self.merged.lock())
    }
}

impl ObservationCollector for ObservationBuffer {
    fn merge(&self, observations: Vec<Observations>) {
        let mut merged = self.merged.lock();
        for obs in observations {
            merged.append(obs);
        }
    }
}

/// Concatenates the observations of every outcome, in list order.
///
/// Failed and skipped outcomes contribute too: a refused connection is
/// still worth recording.
#[must_use]
pub fn extract_observations<T>(outcomes: &[Outcome<T>]) -> Vec<Observations> {
    outcomes
        .iter()
        .flat_map(|o| o.observations().iter().cloned())
        .collect()
}

/// Extracts the observations of `outcomes` and merges them into `collector`.
pub fn merge_outcomes<T>(collector: &dyn ObservationCollector, outcomes: &[Outcome<T>]) {
    let observations = extract_observations(outcomes);
    if !observations.is_empty() {
        collector.merge(observations);
    }
}

//! Outcome status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which variant an [`Outcome`](super::Outcome) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The stage produced a value.
    Success,
    /// The stage failed.
    Failure,
    /// The stage deliberately declined to produce a result.
    Skipped,
}

impl OutcomeStatus {
    /// Returns true if this status halts a composed chain.
    #[must_use]
    pub const fn halts_chain(self) -> bool {
        matches!(self, Self::Failure | Self::Skipped)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

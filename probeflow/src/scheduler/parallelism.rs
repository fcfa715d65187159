//! Worker count for the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of worker tasks the scheduler spawns. Never less than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u64")]
pub struct Parallelism(usize);

impl Parallelism {
    /// One worker: stages run one after the other.
    pub const SERIAL: Self = Self(1);

    /// Creates a worker count, clamping anything below one to one.
    #[must_use]
    pub fn new(requested: i64) -> Self {
        Self(usize::try_from(requested).map_or(1, |n| n.max(1)))
    }

    /// Returns the number of workers.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::SERIAL
    }
}

impl From<i64> for Parallelism {
    fn from(requested: i64) -> Self {
        Self::new(requested)
    }
}

impl From<i32> for Parallelism {
    fn from(requested: i32) -> Self {
        Self::new(i64::from(requested))
    }
}

impl From<usize> for Parallelism {
    fn from(requested: usize) -> Self {
        Self(requested.max(1))
    }
}

impl From<Parallelism> for u64 {
    fn from(p: Parallelism) -> Self {
        p.0 as Self
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_non_positive() {
        assert_eq!(Parallelism::new(0).get(), 1);
        assert_eq!(Parallelism::new(-7).get(), 1);
        assert_eq!(Parallelism::from(0_usize).get(), 1);
        assert_eq!(Parallelism::from(-1_i32), Parallelism::SERIAL);
    }

    #[test]
    fn test_keeps_positive() {
        assert_eq!(Parallelism::new(8).get(), 8);
        assert_eq!(Parallelism::from(3_usize).to_string(), "3");
    }

    #[test]
    fn test_serde_clamps() {
        let p: Parallelism = serde_json::from_str("-2").unwrap();
        assert_eq!(p.get(), 1);
        assert_eq!(serde_json::to_string(&Parallelism::new(4)).unwrap(), "4");
    }
}

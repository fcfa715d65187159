//! Testing utilities for probeflow pipelines.
//!
//! This module provides:
//! - Mock stages (spy, succeeding, failing, skipping, slow)
//! - Assertions over outcomes and observation order

mod assertions;
mod mocks;

pub use assertions::{
    assert_observation_order, assert_outcome_failure, assert_outcome_skipped,
    assert_outcome_success,
};
pub use mocks::{
    observation_ids, tagged_observation, FailingStage, SkippingStage, SlowStage,
    SpyStage, SucceedingStage,
};

//! Tests for the composition combinators.

#[cfg(test)]
mod tests {
    use crate::compose::{compose, compose_flat, flat_map, Chain, PipelineBuilder};
    use crate::context::ProbeContext;
    use crate::core::Outcome;
    use crate::errors::ProbeError;
    use crate::stages::{identity, lambda, stage_fn, SharedStage, Stage};
    use crate::testing::{
        assert_observation_order, assert_outcome_failure, assert_outcome_skipped,
        tagged_observation, FailingStage, SkippingStage, SpyStage, SucceedingStage,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn add(n: i64, tag: i64) -> impl Stage<i64, i64> {
        stage_fn(move |x: i64| Outcome::success(x + n).with_observation(tagged_observation(tag)))
    }

    fn times(n: i64, tag: i64) -> impl Stage<i64, i64> {
        stage_fn(move |x: i64| Outcome::success(x * n).with_observation(tagged_observation(tag)))
    }

    fn fail_on_negative(tag: i64) -> impl Stage<i64, i64> {
        stage_fn(move |x: i64| {
            let outcome = if x < 0 {
                Outcome::failure(ProbeError::other("negative"))
            } else {
                Outcome::success(x)
            };
            outcome.with_observation(tagged_observation(tag))
        })
    }

    #[tokio::test]
    async fn test_compose_success_feeds_value() {
        let ctx = ProbeContext::new();
        let outcome = compose(add(1, 1), times(10, 2)).apply(&ctx, 4).await;
        assert_observation_order(&outcome, &[1, 2]);
        assert_eq!(outcome.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_compose_failure_never_invokes_second() {
        let ctx = ProbeContext::new();
        let spy = Arc::new(SpyStage::new(identity::<i64>()));
        let failing = FailingStage::new(ProbeError::ConnectionRefused)
            .with_observation(tagged_observation(7));

        let outcome = compose(failing, spy.clone()).apply(&ctx, 1).await;

        assert_eq!(spy.call_count(), 0);
        assert_outcome_failure(&outcome, &ProbeError::ConnectionRefused);
        assert_observation_order(&outcome, &[7]);
    }

    #[tokio::test]
    async fn test_compose_skip_halts_without_error() {
        let ctx = ProbeContext::new();
        let spy = Arc::new(SpyStage::new(identity::<i64>()));

        let outcome = compose(SkippingStage::new("gate"), spy.clone()).apply(&ctx, 1).await;

        assert_eq!(spy.call_count(), 0);
        assert_outcome_skipped(&outcome);
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn test_compose_second_failure_keeps_all_observations() {
        let ctx = ProbeContext::new();
        let outcome = compose(add(-10, 1), fail_on_negative(2)).apply(&ctx, 3).await;
        assert_outcome_failure(&outcome, &ProbeError::other("negative"));
        assert_observation_order(&outcome, &[1, 2]);
    }

    #[tokio::test]
    async fn test_compose_is_associative() {
        let ctx = ProbeContext::new();
        for input in [-5_i64, 0, 1, 7] {
            let left = compose(compose(add(1, 1), fail_on_negative(2)), times(3, 3));
            let right = compose(add(1, 1), compose(fail_on_negative(2), times(3, 3)));

            let l = left.apply(&ctx, input).await;
            let r = right.apply(&ctx, input).await;
            assert_eq!(l, r, "input {input}");
        }
    }

    #[tokio::test]
    async fn test_compose_identity_laws() {
        let ctx = ProbeContext::new();
        let plain = add(2, 1).apply(&ctx, 5).await;
        let left = compose(identity::<i64>(), add(2, 1)).apply(&ctx, 5).await;
        let right = compose(add(2, 1), identity::<i64>()).apply(&ctx, 5).await;
        assert_eq!(left, plain);
        assert_eq!(right, plain);
    }

    #[tokio::test]
    async fn test_compose_forwards_context() {
        let ctx = ProbeContext::new();
        let run_id = ctx.run_id();
        let check = lambda(move |ctx: ProbeContext, x: i64| async move {
            if ctx.run_id() == run_id {
                Outcome::success(x)
            } else {
                Outcome::failure(ProbeError::other("wrong context"))
            }
        });
        let outcome = compose(add(1, 1), check).apply(&ctx, 1).await;
        assert_eq!(outcome.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_compose_name() {
        let stage = compose(
            stage_fn(|x: i64| Outcome::success(x)),
            SucceedingStage::new(1_i64),
        );
        assert_eq!(stage.name(), "fn >> succeeding");
    }

    #[tokio::test]
    async fn test_compose_flat_unwraps_nested() {
        let ctx = ProbeContext::new();
        let nested = stage_fn(|x: i64| {
            Outcome::success(Outcome::success(x + 1).with_observation(tagged_observation(2)))
                .with_observation(tagged_observation(1))
        });

        let outcome = compose_flat(nested, times(2, 3)).apply(&ctx, 1).await;
        assert_observation_order(&outcome, &[1, 2, 3]);
        assert_eq!(outcome.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_compose_flat_inner_failure_short_circuits() {
        let ctx = ProbeContext::new();
        let spy = Arc::new(SpyStage::new(identity::<i64>()));
        let nested = stage_fn(|_: i64| Outcome::success(Outcome::<i64>::failure(ProbeError::Eof)));

        let outcome = compose_flat(nested, spy.clone()).apply(&ctx, 1).await;
        assert_eq!(spy.call_count(), 0);
        assert_outcome_failure(&outcome, &ProbeError::Eof);
    }

    #[tokio::test]
    async fn test_flat_map_lifts_stage() {
        let ctx = ProbeContext::new();
        let lifted = flat_map(times(3, 2));

        let ok = lifted
            .apply(&ctx, Outcome::success(2).with_observation(tagged_observation(1)))
            .await;
        assert_observation_order(&ok, &[1, 2]);
        assert_eq!(ok.unwrap(), 6);

        let failed = lifted.apply(&ctx, Outcome::failure(ProbeError::Timeout)).await;
        assert_outcome_failure(&failed, &ProbeError::Timeout);
    }

    #[tokio::test]
    async fn test_compose_macro_right_folds() {
        let ctx = ProbeContext::new();
        let stage = crate::compose!(add(1, 1), times(2, 2), add(3, 3), times(10, 4));
        let outcome = stage.apply(&ctx, 0).await;
        assert_observation_order(&outcome, &[1, 2, 3, 4]);
        assert_eq!(outcome.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_compose_macro_single_stage() {
        let ctx = ProbeContext::new();
        let stage = crate::compose!(add(1, 1));
        assert_eq!(stage.apply(&ctx, 1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_chain_folds_left() {
        let ctx = ProbeContext::new();
        let chain = Chain::new().then(add(1, 1)).then(times(5, 2)).then(add(-2, 3));
        assert_eq!(chain.len(), 3);

        let outcome = chain.apply(&ctx, 1).await;
        assert_observation_order(&outcome, &[1, 2, 3]);
        assert_eq!(outcome.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_chain_short_circuits() {
        let ctx = ProbeContext::new();
        let spy = Arc::new(SpyStage::new(identity::<i64>()));
        let stages: Vec<SharedStage<i64, i64>> = vec![
            Arc::new(add(-5, 1)),
            Arc::new(fail_on_negative(2)),
            spy.clone(),
        ];
        let chain: Chain<i64> = stages.into_iter().collect();

        let outcome = chain.apply(&ctx, 1).await;
        assert_eq!(spy.call_count(), 0);
        assert_outcome_failure(&outcome, &ProbeError::other("negative"));
        assert_observation_order(&outcome, &[1, 2]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_identity() {
        let ctx = ProbeContext::new();
        let chain: Chain<String> = Chain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(&ctx, "x".to_string()).await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_builder_changes_types() {
        let ctx = ProbeContext::new();
        let pipeline = PipelineBuilder::new(stage_fn(|s: String| Outcome::success(s.len())))
            .then(stage_fn(|n: usize| Outcome::success(n % 2 == 0)))
            .then(stage_fn(|even: bool| Outcome::success(if even { "even" } else { "odd" })))
            .build();

        assert_eq!(pipeline.apply(&ctx, "abcd".to_string()).await.unwrap(), "even");
        assert_eq!(pipeline.apply(&ctx, "abc".to_string()).await.unwrap(), "odd");
    }

    #[tokio::test]
    async fn test_builder_then_flat() {
        let ctx = ProbeContext::new();
        let pipeline = PipelineBuilder::new(stage_fn(|x: i64| Outcome::success(Outcome::success(x))))
            .then_flat(add(1, 1))
            .build();
        assert_eq!(pipeline.apply(&ctx, 1).await.unwrap(), 2);
    }
}

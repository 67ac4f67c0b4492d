//! Property tests for the combinator guarantees.

use heron_combinators::{memoize, require, validate_order, Combinator, LayerKind};
use heron_core::{EvictionPolicy, Metadata, SyncCallable};
use heron_test::{CallCounter, TestError};
use proptest::prelude::*;
use std::collections::HashSet;

fn kind_strategy() -> impl Strategy<Value = LayerKind> {
    prop_oneof![
        Just(LayerKind::Timing),
        Just(LayerKind::Memoize),
        Just(LayerKind::Logging),
        Just(LayerKind::Validation),
        Just(LayerKind::Authorization),
        Just(LayerKind::Retry),
    ]
}

fn polynomial(counter: &CallCounter) -> SyncCallable<(i32, i32), i64, TestError> {
    let counter = counter.clone();
    SyncCallable::new(Metadata::new("polynomial"), move |(x, y): (i32, i32)| {
        counter.hit();
        let (x, y) = (i64::from(x), i64::from(y));
        Ok(x * x - 3 * x * y + y)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// An unbounded memoized callable returns what the bare callable returns
    /// and runs the body once per distinct argument.
    #[test]
    fn prop_memoize_is_transparent(calls in prop::collection::vec((-50i32..50, -50i32..50), 1..64)) {
        let bare_counter = CallCounter::new();
        let bare = polynomial(&bare_counter);

        let counter = CallCounter::new();
        let cached = memoize(EvictionPolicy::Unbounded).wrap_sync(polynomial(&counter));

        for args in &calls {
            prop_assert_eq!(cached.call(*args), bare.call(*args));
        }

        let distinct: HashSet<_> = calls.iter().collect();
        prop_assert_eq!(counter.count(), distinct.len());
    }

    /// An LRU cache never makes the body run more often than the bare
    /// callable would.
    #[test]
    fn prop_lru_never_exceeds_bare_calls(
        capacity in 0usize..8,
        calls in prop::collection::vec((0i32..10, 0i32..3), 1..64),
    ) {
        let counter = CallCounter::new();
        let cached = memoize(EvictionPolicy::lru(capacity)).wrap_sync(polynomial(&counter));

        for args in &calls {
            cached.call(*args).unwrap();
        }

        prop_assert!(counter.count() <= calls.len());
    }

    /// The guarded body runs exactly for the arguments the predicate accepts.
    #[test]
    fn prop_validation_gates_every_call(values in prop::collection::vec(-100i32..100, 0..64)) {
        let counter = CallCounter::new();
        let hits = counter.clone();
        let abs: SyncCallable<i32, i32, TestError> =
            SyncCallable::new(Metadata::new("abs"), move |x: i32| {
                hits.hit();
                Ok(x.abs())
            });
        let guarded = require(|x: &i32| *x >= 0, "x must be non-negative").wrap_sync(abs);

        let mut accepted = 0;
        for x in &values {
            let outcome = guarded.call(*x);
            if *x >= 0 {
                accepted += 1;
                prop_assert_eq!(outcome, Ok(*x));
            } else {
                prop_assert!(matches!(outcome, Err(TestError::Wrap(_))));
            }
        }
        prop_assert_eq!(counter.count(), accepted);
    }

    /// Ordering is rejected exactly when some retry layer sits outside some
    /// memoize layer.
    #[test]
    fn prop_order_rule(kinds in prop::collection::vec(kind_strategy(), 0..8)) {
        let violates = kinds.iter().enumerate().any(|(i, k)| {
            *k == LayerKind::Memoize && kinds[i + 1..].contains(&LayerKind::Retry)
        });
        prop_assert_eq!(validate_order(&kinds).is_err(), violates);
    }
}

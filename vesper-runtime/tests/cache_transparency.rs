//! Randomized cache-transparency properties.
//!
//! The dispatch cache is a pure memoization layer: for any table built
//! from random method patterns and any sequence of random calls, the
//! cached path and the forced-full-search path must select the same
//! entry (or fail the same way), and repeating a call at a fixed
//! generation must repeat the selection.

use std::sync::Arc;

use proptest::prelude::*;
use vesper_runtime::builtins::{self, ty};
use vesper_runtime::{DispatchError, EntryId, Runtime, TypeId, Value};

/// Pattern position candidates, abstract types included.
const PATTERN_TYPES: [TypeId; 7] = [
    builtins::ANY,
    builtins::NUMBER,
    builtins::INTEGER,
    builtins::INT,
    builtins::INT8,
    builtins::FLOAT,
    builtins::STR,
];

fn concrete_value(choice: u8) -> Value {
    match choice % 4 {
        0 => Value::Int(1),
        1 => Value::Int8(1),
        2 => Value::Float(1.0),
        _ => Value::str("s"),
    }
}

/// Collapse a resolution to something comparable: the selected entry id
/// or the failure kind.
fn outcome_key(r: Result<EntryId, DispatchError>) -> Result<EntryId, &'static str> {
    r.map_err(|e| match e {
        DispatchError::NoMethod { .. } => "no-method",
        DispatchError::Ambiguous { .. } => "ambiguous",
        DispatchError::MalformedKeyword { .. } => "malformed-keyword",
    })
}

proptest! {
    #[test]
    fn cached_lookup_matches_full_search(
        patterns in prop::collection::vec((0usize..7, 0usize..7), 1..12),
        calls in prop::collection::vec((0u8..4, 0u8..4), 1..24),
    ) {
        let rt = Runtime::new();
        let f = rt.define_function("f");
        for (a, b) in patterns {
            rt.add_method(
                &f,
                vec![ty(PATTERN_TYPES[a]), ty(PATTERN_TYPES[b])],
                None,
                Arc::new(|_, _| Ok(Value::Unit)),
            );
        }

        for (a, b) in calls {
            let args = [concrete_value(a), concrete_value(b)];
            let full = outcome_key(rt.resolve_uncached(&f, &args).map(|e| e.id()));
            let cold = outcome_key(rt.resolve(&f, &args).map(|e| e.id()));
            let warm = outcome_key(rt.resolve(&f, &args).map(|e| e.id()));
            prop_assert_eq!(&cold, &full);
            prop_assert_eq!(&warm, &full);
        }
    }

    #[test]
    fn definitions_between_calls_keep_paths_agreeing(
        first in prop::collection::vec((0usize..7, 0usize..7), 1..6),
        second in prop::collection::vec((0usize..7, 0usize..7), 1..6),
        calls in prop::collection::vec((0u8..4, 0u8..4), 1..12),
    ) {
        let rt = Runtime::new();
        let f = rt.define_function("f");
        for (a, b) in first {
            rt.add_method(
                &f,
                vec![ty(PATTERN_TYPES[a]), ty(PATTERN_TYPES[b])],
                None,
                Arc::new(|_, _| Ok(Value::Unit)),
            );
        }
        // Warm the cache on every call shape.
        for (a, b) in &calls {
            let args = [concrete_value(*a), concrete_value(*b)];
            let _ = rt.resolve(&f, &args);
        }
        // Mutate the table, then every cached shape must re-agree with
        // the full search over the new state.
        for (a, b) in second {
            rt.add_method(
                &f,
                vec![ty(PATTERN_TYPES[a]), ty(PATTERN_TYPES[b])],
                None,
                Arc::new(|_, _| Ok(Value::Unit)),
            );
        }
        for (a, b) in calls {
            let args = [concrete_value(a), concrete_value(b)];
            let full = outcome_key(rt.resolve_uncached(&f, &args).map(|e| e.id()));
            let cached = outcome_key(rt.resolve(&f, &args).map(|e| e.id()));
            prop_assert_eq!(&cached, &full);
        }
    }

    #[test]
    fn specificity_order_is_respected(
        a in 0usize..7,
        b in 0usize..7,
        call in (0u8..4, 0u8..4),
    ) {
        // For any two unary-ish patterns where one dominates the other,
        // dispatch never selects the dominated one while the dominant
        // one is applicable.
        let rt = Runtime::new();
        let f = rt.define_function("f");
        let e1 = rt.add_method(&f, vec![ty(PATTERN_TYPES[a]), ty(PATTERN_TYPES[b])], None, Arc::new(|_, _| Ok(Value::Unit)));
        let e2 = rt.add_method(&f, vec![ty(PATTERN_TYPES[b]), ty(PATTERN_TYPES[a])], None, Arc::new(|_, _| Ok(Value::Unit)));

        let args = [concrete_value(call.0), concrete_value(call.1)];
        if let Ok(selected) = rt.resolve(&f, &args) {
            let selected = selected.id();
            prop_assert!(selected == e1.id() || selected == e2.id());
            // An applicable loser must not dominate the winner.
            let (winner, loser) = if selected == e1.id() { (&e1, &e2) } else { (&e2, &e1) };
            let concrete = vesper_runtime::ArgumentSignature::of_call(&f, &args);
            if vesper_runtime::dispatch::is_applicable(&rt, loser.pattern(), &concrete) {
                prop_assert!(
                    !vesper_runtime::dispatch::is_more_specific(&rt, loser.pattern(), winner.pattern())
                );
            }
        }
    }
}

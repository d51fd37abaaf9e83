//! Property tests for predicate and composite evaluation.

use std::cell::Cell;
use std::rc::Rc;

use gk_core::{ComparisonOp, Composite, NodeId, Predicate, Registry, Value, ValueKind, compare};
use proptest::prelude::*;

fn any_op() -> impl Strategy<Value = ComparisonOp> {
    prop_oneof![
        Just(ComparisonOp::Equals),
        Just(ComparisonOp::NotEquals),
        Just(ComparisonOp::GreaterThan),
        Just(ComparisonOp::GreaterOrEqual),
        Just(ComparisonOp::LessThan),
        Just(ComparisonOp::LessOrEqual),
    ]
}

/// A registry with one unit-event predicate per flag, each already
/// delivered an event that makes it hold or not.
fn leaves(reg: &mut Registry, states: &[bool]) -> Vec<NodeId> {
    states
        .iter()
        .map(|&holds| {
            let node = reg
                .add_predicate(Predicate::new(Value::Unit).inverted(!holds))
                .unwrap();
            reg.on_event(node, Value::Unit).unwrap();
            node
        })
        .collect()
}

proptest! {
    #[test]
    fn predicate_caches_inverted_comparison(
        observed in -100_i64..100,
        target in -100_i64..100,
        op in any_op(),
        inverted in any::<bool>(),
    ) {
        let mut reg = Registry::new();
        let source = reg.add_source(ValueKind::Int, "n");
        let node = reg
            .add_predicate(Predicate::new(target).observing(source).with_op(op).inverted(inverted))
            .unwrap();
        reg.subscribe(node, |_| {}).unwrap();
        reg.raise(source, Value::Int(observed)).unwrap();

        let expected = compare(&Value::Int(observed), &Value::Int(target), op) != inverted;
        prop_assert_eq!(reg.evaluate(node), expected);
    }

    #[test]
    fn empty_composite_is_not_inverted(inverted in any::<bool>(), any_of in any::<bool>()) {
        let mut reg = Registry::new();
        let composite = if any_of { Composite::any([]) } else { Composite::all([]) };
        let node = reg.add_composite(composite.inverted(inverted)).unwrap();
        prop_assert_eq!(reg.evaluate(node), !inverted);
    }

    #[test]
    fn and_or_follow_child_states(states in prop::collection::vec(any::<bool>(), 1..8)) {
        let mut reg = Registry::new();
        let children = leaves(&mut reg, &states);
        let all = reg.add_composite(Composite::all(children.clone())).unwrap();
        let any = reg.add_composite(Composite::any(children)).unwrap();

        prop_assert_eq!(reg.evaluate(all), states.iter().all(|s| *s));
        prop_assert_eq!(reg.evaluate(any), states.iter().any(|s| *s));
    }

    #[test]
    fn subscribed_and_fires_once_when_last_child_arrives(n in 1_usize..6) {
        let mut reg = Registry::new();
        let sources: Vec<_> = (0..n)
            .map(|i| reg.add_source(ValueKind::Unit, format!("e{i}")))
            .collect();
        let children: Vec<_> = sources
            .iter()
            .map(|s| reg.add_predicate(Predicate::new(Value::Unit).observing(*s)).unwrap())
            .collect();
        let gate = reg.add_composite(Composite::all(children)).unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        reg.subscribe(gate, move |_| counter.set(counter.get() + 1)).unwrap();

        for (i, source) in sources.iter().enumerate() {
            prop_assert_eq!(fired.get(), 0, "fired before event {}", i);
            reg.raise(*source, Value::Unit).unwrap();
        }
        prop_assert_eq!(fired.get(), 1);
        prop_assert!(reg.evaluate(gate));
    }

    #[test]
    fn force_fulfill_satisfies_equals(target in any::<i64>()) {
        let mut reg = Registry::new();
        let source = reg.add_source(ValueKind::Int, "n");
        let node = reg.add_predicate(Predicate::new(target).observing(source)).unwrap();
        reg.force_fulfill(node).unwrap();
        prop_assert!(reg.evaluate(node));
    }

    #[test]
    fn listener_released_after_last_unsubscribe(count in 1_usize..5) {
        let mut reg = Registry::new();
        let source = reg.add_source(ValueKind::Bool, "door");
        let node = reg.add_predicate(Predicate::new(true).observing(source)).unwrap();
        let subs: Vec<_> = (0..count).map(|_| reg.subscribe(node, |_| {}).unwrap()).collect();

        for (i, sub) in subs.iter().enumerate() {
            prop_assert_eq!(reg.listener_count(source), 1);
            reg.unsubscribe(*sub).unwrap();
            let remaining = count - i - 1;
            prop_assert_eq!(reg.subscriber_count(node), remaining);
        }
        prop_assert_eq!(reg.listener_count(source), 0);
    }
}

//! Property-based tests for resolution orders.
//!
//! Random hierarchies are built by letting each new type pick parents among
//! the types declared before it, which always yields a DAG. Not every DAG
//! has a consistent linearization; for those the only acceptable outcome is
//! a linearization error.

use oxidex_attr::{Error, Runtime, TypeId};
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashSet;

/// Parent picks per type; type `i` maps each pick into `0..i`.
fn hierarchy() -> impl Strategy<Value = Vec<Vec<Index>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..12)
}

fn build(rt: &Runtime, picks: &[Vec<Index>]) -> Vec<TypeId> {
    let mut ids = Vec::with_capacity(picks.len());
    for (i, choice) in picks.iter().enumerate() {
        let mut parents: Vec<String> = Vec::new();
        if i > 0 {
            for pick in choice {
                let parent = format!("T{}", pick.index(i));
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }
        let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
        ids.push(rt.declare_type(&format!("T{i}"), &parents).unwrap());
    }
    ids
}

/// Every type reachable through parent links, including `ty` itself.
fn ancestors(rt: &Runtime, ty: TypeId) -> HashSet<TypeId> {
    let mut seen = HashSet::new();
    let mut stack = vec![ty];
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            stack.extend(rt.graph().parents_of(next).unwrap().iter().copied());
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_order_lists_each_ancestor_once(picks in hierarchy()) {
        let rt = Runtime::new();
        let ids = build(&rt, &picks);

        for &ty in &ids {
            match rt.resolution_order_of(ty) {
                Ok(order) => {
                    prop_assert_eq!(order[0], ty);
                    let unique: HashSet<TypeId> = order.iter().copied().collect();
                    prop_assert_eq!(unique.len(), order.len());
                    prop_assert_eq!(unique, ancestors(&rt, ty));
                }
                Err(err) => prop_assert!(
                    matches!(err, Error::Linearization { .. }),
                    "unexpected error: {:?}",
                    err
                ),
            }
        }
    }

    #[test]
    fn prop_order_respects_local_precedence(picks in hierarchy()) {
        let rt = Runtime::new();
        let ids = build(&rt, &picks);

        for &ty in &ids {
            let Ok(order) = rt.resolution_order_of(ty) else {
                continue;
            };
            for &member in order.iter() {
                let parents = rt.graph().parents_of(member).unwrap();
                let positions: Vec<usize> = parents
                    .iter()
                    .map(|&p| order.position(p).unwrap())
                    .collect();
                let own = order.position(member).unwrap();
                prop_assert!(positions.iter().all(|&p| p > own));
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn prop_order_is_monotonic(picks in hierarchy()) {
        let rt = Runtime::new();
        let ids = build(&rt, &picks);

        for &ty in &ids {
            let Ok(order) = rt.resolution_order_of(ty) else {
                continue;
            };
            for &parent in rt.graph().parents_of(ty).unwrap().iter() {
                let parent_order = rt.resolution_order_of(parent).unwrap();
                let positions: Vec<usize> = parent_order
                    .iter()
                    .map(|&p| order.position(p).unwrap())
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn prop_order_is_deterministic(picks in hierarchy()) {
        let first = Runtime::new();
        let second = Runtime::new();
        let a = build(&first, &picks);
        let b = build(&second, &picks);

        for (&x, &y) in a.iter().zip(&b) {
            let left = first.resolution_order_names(x).ok();
            let right = second.resolution_order_names(y).ok();
            prop_assert_eq!(left, right);
        }
    }
}

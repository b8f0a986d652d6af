//! Property tests for structural implementation keys.
//!
//! Key equality is hole-aware and deliberately not transitive, so the
//! properties checked here are the ones lookups rely on: reflexivity,
//! symmetry, and that any two matching keys land in the same bucket.
#![cfg(feature = "proptest")]

use proptest::prelude::*;
use quarry::base::FileId;
use quarry::hir::{ImplIndexStore, ImplKey, MemoryImplStore, PathPart, QualifiedPath};
use quarry::syntax::{IntTy, LocalNodeId, NodeId, PrimTy};

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// A small segment alphabet so that generated paths collide often.
fn arb_part() -> impl Strategy<Value = PathPart> {
    prop_oneof![
        4 => prop::sample::select(vec!["Foo", "Bar", "inner", "outer"]).prop_map(PathPart::from_text),
        1 => Just(PathPart::Hole),
    ]
}

fn arb_path() -> impl Strategy<Value = QualifiedPath> {
    prop::collection::vec(arb_part(), 1..=3).prop_map(|parts| {
        let mut parts = parts.into_iter();
        let first = parts.next().unwrap_or(PathPart::Hole);
        parts.fold(QualifiedPath::ident(first), QualifiedPath::join)
    })
}

fn arb_prim() -> impl Strategy<Value = PrimTy> {
    prop_oneof![
        Just(PrimTy::Bool),
        Just(PrimTy::Char),
        Just(PrimTy::Int(IntTy::I32)),
        Just(PrimTy::Int(IntTy::U8)),
    ]
}

fn arb_key() -> impl Strategy<Value = ImplKey> {
    let leaf = prop_oneof![
        3 => arb_path().prop_map(ImplKey::Path),
        1 => arb_prim().prop_map(ImplKey::Primitive),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (any::<bool>(), inner.clone())
                .prop_map(|(mutable, inner)| ImplKey::Ref { mutable, inner: Box::new(inner) }),
            prop::collection::vec(inner.clone(), 0..3).prop_map(ImplKey::Tuple),
            (prop::collection::vec(inner.clone(), 0..2), inner)
                .prop_map(|(params, ret)| ImplKey::Fn { params, ret: Box::new(ret) }),
        ]
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn test_hole_matches_every_path(path in arb_path()) {
        let key = ImplKey::Path(path);
        prop_assert!(ImplKey::hole().matches(&key));
        prop_assert!(key.matches(&ImplKey::hole()));
        prop_assert_eq!(ImplKey::hole().bucket(), key.bucket());
    }

    #[test]
    fn test_matching_is_reflexive(key in arb_key()) {
        prop_assert!(key.matches(&key));
    }

    #[test]
    fn test_matching_is_symmetric_and_bucket_consistent(a in arb_key(), b in arb_key()) {
        prop_assert_eq!(a.matches(&b), b.matches(&a));
        if a.matches(&b) {
            prop_assert_eq!(a.bucket(), b.bucket());
        }
    }

    #[test]
    fn test_store_probe_returns_exactly_the_matching_impls(
        keys in prop::collection::vec(arb_key(), 1..12),
        query in arb_key(),
    ) {
        let store = MemoryImplStore::default();
        let file = FileId::new(0);
        for (i, key) in keys.iter().enumerate() {
            store.insert(key.clone(), NodeId::new(file, LocalNodeId::new(i as u32 + 1)));
        }

        let mut probed = store.probe(&query);
        probed.sort();
        let expected: Vec<NodeId> = keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.matches(&query))
            .map(|(i, _)| NodeId::new(file, LocalNodeId::new(i as u32 + 1)))
            .collect();
        prop_assert_eq!(probed, expected);
    }
}

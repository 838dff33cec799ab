//! Registration and ordering properties of the MIB trie.

mod common;

use proptest::prelude::*;
use smart_snmp::{
    Error, Mib, Oid, OidErrorKind, OidTable, RegisterErrorKind, RequestKind, Value, oid,
};

/// A `.0` scalar holding `value`.
fn scalar(value: u32) -> OidTable<Value> {
    let mut table = OidTable::new();
    table.insert(oid!(0), Value::Gauge32(value));
    table
}

fn under_internet(suffix: &[u32]) -> Oid {
    let mut oid = oid!(1, 3, 6, 1);
    oid.extend_from_slice(suffix);
    oid
}

/// Distinct registration points of equal depth, so none prefixes another,
/// in random insertion order.
fn arb_registrations() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::btree_set(prop::collection::vec(0u32..12, 3), 1..40)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn build(registrations: &[Vec<u32>]) -> (Mib, Vec<Oid>) {
    let mut mib = Mib::new();
    let mut instances = Vec::new();
    for (i, suffix) in registrations.iter().enumerate() {
        let oid = under_internet(suffix);
        mib.register(&oid, scalar(i as u32)).unwrap();
        instances.push(oid.child(0));
    }
    instances.sort();
    (mib, instances)
}

fn walk(mib: &mut Mib) -> Vec<Oid> {
    let mut cursor = oid!(1, 3, 6, 1);
    let mut out = Vec::new();
    loop {
        let result = mib.search_next(&cursor);
        if result.is_end_of_view() {
            return out;
        }
        cursor = result.oid.clone();
        out.push(result.oid);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_walk_yields_sorted_instances(registrations in arb_registrations()) {
        let (mut mib, instances) = build(&registrations);
        prop_assert_eq!(mib.len(), registrations.len());
        prop_assert_eq!(walk(&mut mib), instances);
    }

    #[test]
    fn test_search_next_is_least_greater(
        registrations in arb_registrations(),
        query in prop::collection::vec(0u32..13, 0..6),
    ) {
        let (mut mib, instances) = build(&registrations);
        let query = under_internet(&query);
        let result = mib.search_next(&query);
        match instances.iter().find(|oid| **oid > query) {
            Some(expected) => {
                prop_assert!(result.is_hit());
                prop_assert_eq!(&result.oid, expected);
            }
            None => prop_assert!(result.is_end_of_view()),
        }
    }

    #[test]
    fn test_exact_hits_only_registered(
        registrations in arb_registrations(),
        probe in prop::collection::vec(0u32..12, 3),
    ) {
        let (mut mib, instances) = build(&registrations);
        let oid = under_internet(&probe).child(0);
        let result = mib.search_exact(&oid, RequestKind::Get, None);
        prop_assert_eq!(result.is_hit(), instances.contains(&oid));
        if !result.is_hit() {
            prop_assert_eq!(result.value, Value::NoSuchObject);
        }
    }

    #[test]
    fn test_unregister_removes_only_subtree(registrations in arb_registrations()) {
        let (mut mib, instances) = build(&registrations);
        let victim = under_internet(&[registrations[0][0]]);
        prop_assert!(mib.unregister(&victim));

        let remaining: Vec<Oid> = instances
            .into_iter()
            .filter(|oid| !oid.starts_with(&victim))
            .collect();
        prop_assert_eq!(mib.len(), remaining.len());
        prop_assert_eq!(walk(&mut mib), remaining);
    }
}

#[test]
fn test_register_errors() {
    let mut mib = Mib::new();
    mib.register(&oid!(1, 3, 6, 1, 2, 1, 1), scalar(1)).unwrap();

    assert!(matches!(
        mib.register(&oid!(1, 3, 6, 1, 2, 1, 1), scalar(2)),
        Err(Error::Registration {
            kind: RegisterErrorKind::AlreadyRegistered,
            ..
        })
    ));
    assert!(matches!(
        mib.register(&oid!(1, 3, 6, 1, 2, 1), scalar(2)),
        Err(Error::Registration {
            kind: RegisterErrorKind::AlreadyRegistered,
            ..
        })
    ));
    assert!(matches!(
        mib.register(&oid!(1, 3, 6, 1, 2, 1, 1, 5), scalar(2)),
        Err(Error::Registration {
            kind: RegisterErrorKind::PathThroughInstance,
            ..
        })
    ));
    assert!(matches!(
        mib.register(&oid!(1, 3, 6, 2, 1), scalar(2)),
        Err(Error::InvalidOid {
            kind: OidErrorKind::OutsideInternet,
            ..
        })
    ));
    assert!(matches!(
        mib.register(&under_internet(&[1; 61]), scalar(2)),
        Err(Error::InvalidOid {
            kind: OidErrorKind::TooManyArcs { count: 65, max: 64 },
            ..
        })
    ));
    assert_eq!(mib.len(), 1);
}

#[test]
fn test_reregister_after_unregister() {
    let mut mib = Mib::new();
    let point = oid!(1, 3, 6, 1, 4, 1, 9999, 1);
    mib.register(&point, scalar(1)).unwrap();
    assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 9999)));
    assert!(!mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 9999)));
    assert!(mib.is_empty());

    mib.register(&point, scalar(2)).unwrap();
    let result = mib.search_exact(&point.child(0), RequestKind::Get, None);
    assert_eq!(result.value, Value::Gauge32(2));
}

#[test]
fn test_shared_resolver_survives_partial_unregister() {
    let mut mib = Mib::new();
    let mut table = OidTable::new();
    table.insert(oid!(0), Value::from("shared"));
    let handle = mib.add_resolver(table);
    mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 1), handle).unwrap();
    mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 2), handle).unwrap();

    assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 1)));
    let result = mib.search_exact(&oid!(1, 3, 6, 1, 4, 1, 2, 0), RequestKind::Get, None);
    assert_eq!(result.value, Value::from("shared"));
    assert!(!mib.discard_resolver(handle));

    assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 2)));
    let result = mib.search_exact(&oid!(1, 3, 6, 1, 4, 1, 2, 0), RequestKind::Get, None);
    assert_eq!(result.value, Value::NoSuchObject);
}

#[test]
fn test_root_cannot_be_unregistered() {
    let mut mib = Mib::new();
    mib.register(&oid!(1, 3, 6, 1, 2), scalar(1)).unwrap();
    assert!(!mib.unregister(&oid!(1, 3, 6, 1)));
    assert_eq!(mib.len(), 1);
}

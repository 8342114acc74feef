//! Behaviour of the generic fact containers and the constant lattice.

use percolator::analysis::dataflow::constant_propagation::{ApsInt, CpValue};
use percolator::analysis::dataflow::fact::{MapFact, SetFact};
use percolator::ir::{StmtId, VarId};
use proptest::prelude::*;

fn stmts(raw: impl IntoIterator<Item = u32>) -> SetFact<StmtId> {
    raw.into_iter().map(StmtId::from).collect()
}

#[test]
fn set_fact_reports_change_from_every_mutator() {
    let mut fact = SetFact::new();
    assert!(fact.is_empty());
    assert!(fact.add(StmtId::from(1)));
    assert!(!fact.add(StmtId::from(1)));
    assert!(fact.contains(StmtId::from(1)));
    assert!(!fact.remove(StmtId::from(2)));
    assert!(fact.remove(StmtId::from(1)));
    assert!(!fact.union(&SetFact::new()));
    assert!(fact.union(&stmts([1, 2, 3])));
    assert!(fact.intersect(&stmts([2, 3, 4])));
    assert_eq!(fact, stmts([2, 3]));
    fact.clear();
    assert!(fact.is_empty());
}

#[test]
fn set_fact_set_to_replaces_content() {
    let mut fact = stmts([1, 2]);
    fact.set_to(&stmts([7, 8, 9]));
    assert_eq!(fact, stmts([7, 8, 9]));
    assert_eq!(fact.len(), 3);
}

#[test]
fn map_fact_get_returns_none_for_absent_keys() {
    let mut fact: MapFact<VarId, u32> = MapFact::new();
    assert_eq!(fact.get(VarId::from(0)), None);
    assert!(fact.update(VarId::from(0), 42));
    assert_eq!(fact.get(VarId::from(0)), Some(&42));
    assert_eq!(fact.remove(VarId::from(0)), Some(42));
    assert_eq!(fact.remove(VarId::from(0)), None);
}

#[test]
fn map_fact_copy_from_is_pointwise() {
    let mut target: MapFact<VarId, u32> = MapFact::new();
    target.update(VarId::from(0), 1);
    target.update(VarId::from(1), 2);
    let mut source = MapFact::new();
    source.update(VarId::from(1), 5);
    assert!(target.copy_from(&source));
    // Keys absent from the source are untouched.
    assert_eq!(target.get(VarId::from(0)), Some(&1));
    assert_eq!(target.get(VarId::from(1)), Some(&5));
}

fn cp_value() -> impl Strategy<Value = CpValue> {
    prop_oneof![
        Just(CpValue::Undef),
        Just(CpValue::Nac),
        any::<i8>().prop_map(|v| CpValue::Const(ApsInt::from_i64(i64::from(v), 32, true))),
    ]
}

proptest! {
    #[test]
    fn set_union_laws(a in proptest::collection::btree_set(0u32..32, 0..12),
                      b in proptest::collection::btree_set(0u32..32, 0..12)) {
        let a = stmts(a);
        let b = stmts(b);
        prop_assert_eq!(a.union_with(&b), b.union_with(&a));
        prop_assert_eq!(a.union_with(&a), a.clone());
        let mut destructive = a.clone();
        let changed = destructive.union(&b);
        prop_assert_eq!(&destructive, &a.union_with(&b));
        prop_assert_eq!(changed, destructive != a);
    }

    #[test]
    fn set_intersection_dualises_union(a in proptest::collection::btree_set(0u32..32, 0..12),
                                       b in proptest::collection::btree_set(0u32..32, 0..12)) {
        let a = stmts(a);
        let b = stmts(b);
        prop_assert_eq!(a.intersect_with(&b), b.intersect_with(&a));
        let union = a.union_with(&b);
        prop_assert_eq!(union.intersect_with(&a), a.clone());
    }

    #[test]
    fn cp_meet_is_a_semilattice(a in cp_value(), b in cp_value(), c in cp_value()) {
        prop_assert_eq!(a.meet(a), a);
        prop_assert_eq!(a.meet(b), b.meet(a));
        prop_assert_eq!(a.meet(b).meet(c), a.meet(b.meet(c)));
        prop_assert_eq!(CpValue::Undef.meet(a), a);
        prop_assert_eq!(CpValue::Nac.meet(a), CpValue::Nac);
    }
}

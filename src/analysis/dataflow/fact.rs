//! Generic dataflow fact containers.
//!
//! Elements and keys are identities ([`crate::ir::VarId`],
//! [`crate::ir::StmtId`], …), never structurally compared values, so two
//! facts mentioning the same variable hold one element. Every mutating
//! operation reports whether it changed the fact — that boolean is the
//! solver's only progress signal, so it must stay accurate even for calls
//! that end up touching nothing.

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::StmtId;

/// A set-shaped dataflow fact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetFact<E: Copy + Ord> {
    items: BTreeSet<E>,
}

impl<E: Copy + Ord> SetFact<E> {
    /// Creates an empty fact.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: BTreeSet::new(),
        }
    }

    /// Whether the fact contains the element.
    #[must_use]
    pub fn contains(&self, element: E) -> bool {
        self.items.contains(&element)
    }

    /// Adds an element; reports whether the fact changed.
    pub fn add(&mut self, element: E) -> bool {
        self.items.insert(element)
    }

    /// Removes an element; reports whether the fact changed.
    pub fn remove(&mut self, element: E) -> bool {
        self.items.remove(&element)
    }

    /// Removes every element satisfying the predicate; reports whether the
    /// fact changed. The victims are collected before any removal, so the
    /// predicate observes a consistent snapshot.
    pub fn remove_if(&mut self, mut predicate: impl FnMut(E) -> bool) -> bool {
        let to_remove: Vec<E> = self.items.iter().copied().filter(|&e| predicate(e)).collect();
        for element in &to_remove {
            self.items.remove(element);
        }
        !to_remove.is_empty()
    }

    /// Removes every element of `other`; reports whether the fact changed.
    pub fn remove_all(&mut self, other: &Self) -> bool {
        self.remove_if(|e| other.contains(e))
    }

    /// Unions `other` into this fact; reports whether the fact changed.
    pub fn union(&mut self, other: &Self) -> bool {
        let old_len = self.items.len();
        self.items.extend(other.items.iter().copied());
        self.items.len() != old_len
    }

    /// A fresh fact holding the union of the two operands.
    #[must_use]
    pub fn union_with(&self, other: &Self) -> Self {
        Self {
            items: self.items.union(&other.items).copied().collect(),
        }
    }

    /// Intersects this fact with `other`; reports whether the fact changed.
    pub fn intersect(&mut self, other: &Self) -> bool {
        self.remove_if(|e| !other.contains(e))
    }

    /// A fresh fact holding the intersection of the two operands.
    #[must_use]
    pub fn intersect_with(&self, other: &Self) -> Self {
        Self {
            items: self.items.intersection(&other.items).copied().collect(),
        }
    }

    /// Makes this fact's content equal to `other`'s.
    pub fn set_to(&mut self, other: &Self) {
        self.items.clone_from(&other.items);
    }

    /// Empties the fact.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether the fact is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates over the elements. No order is guaranteed to callers.
    pub fn iter(&self) -> impl Iterator<Item = E> + '_ {
        self.items.iter().copied()
    }
}

impl<E: Copy + Ord> FromIterator<E> for SetFact<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// A map-shaped dataflow fact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapFact<K: Copy + Ord, V: Clone + PartialEq> {
    entries: BTreeMap<K, V>,
}

impl<K: Copy + Ord, V: Clone + PartialEq> MapFact<K, V> {
    /// Creates an empty fact.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The value bound to the key, or `None` when the key is absent.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    /// Binds `key` to `value`; reports whether the stored value changed.
    pub fn update(&mut self, key: K, value: V) -> bool {
        match self.entries.get_mut(&key) {
            Some(stored) if *stored == value => false,
            Some(stored) => {
                *stored = value;
                true
            }
            None => {
                self.entries.insert(key, value);
                true
            }
        }
    }

    /// Removes the binding for `key`, returning the previous value.
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.entries.remove(&key)
    }

    /// Updates this fact pointwise from `other`; the report is the OR of
    /// the per-entry changes.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (&key, value) in &other.entries {
            changed |= self.update(key, value.clone());
        }
        changed
    }

    /// Empties the fact.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the fact is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the keys.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    /// Iterates over the bindings. No order is guaranteed to callers.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.entries.iter().map(|(&k, v)| (k, v))
    }
}

/// The in/out facts of every node once a solve finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataflowResult<F> {
    in_facts: BTreeMap<StmtId, F>,
    out_facts: BTreeMap<StmtId, F>,
}

impl<F> DataflowResult<F> {
    pub(crate) fn new(in_facts: BTreeMap<StmtId, F>, out_facts: BTreeMap<StmtId, F>) -> Self {
        Self {
            in_facts,
            out_facts,
        }
    }

    /// The fact flowing into a node, or `None` for ids the solve never saw.
    #[must_use]
    pub fn in_fact_of(&self, node: StmtId) -> Option<&F> {
        self.in_facts.get(&node)
    }

    /// The fact flowing out of a node, or `None` for ids the solve never
    /// saw.
    #[must_use]
    pub fn out_fact_of(&self, node: StmtId) -> Option<&F> {
        self.out_facts.get(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: impl IntoIterator<Item = u32>) -> SetFact<StmtId> {
        raw.into_iter().map(StmtId::from).collect()
    }

    #[test]
    fn mutators_report_change_accurately() {
        let mut fact = ids([1, 2]);
        assert!(!fact.add(StmtId::from(1)));
        assert!(fact.add(StmtId::from(3)));
        assert!(fact.remove(StmtId::from(3)));
        assert!(!fact.remove(StmtId::from(3)));
        assert!(!fact.union(&ids([1, 2])));
        assert!(fact.union(&ids([4])));
        assert!(!fact.remove_all(&ids([9])));
        assert!(fact.remove_all(&ids([4])));
        assert_eq!(fact, ids([1, 2]));
    }

    #[test]
    fn union_and_intersection_leave_operands_alone() {
        let a = ids([1, 2, 3]);
        let b = ids([2, 3, 4]);
        assert_eq!(a.union_with(&b), ids([1, 2, 3, 4]));
        assert_eq!(a.intersect_with(&b), ids([2, 3]));
        assert_eq!(a, ids([1, 2, 3]));
        assert_eq!(b, ids([2, 3, 4]));
    }

    #[test]
    fn remove_if_sees_a_snapshot() {
        let mut fact = ids(0..10);
        assert!(fact.remove_if(|id| u32::from(id) % 2 == 0));
        assert_eq!(fact, ids([1, 3, 5, 7, 9]));
        assert!(!fact.remove_if(|_| false));
    }

    #[test]
    fn map_update_and_copy_from_report_change() {
        let mut a: MapFact<StmtId, i64> = MapFact::new();
        assert!(a.update(StmtId::from(1), 10));
        assert!(!a.update(StmtId::from(1), 10));
        assert!(a.update(StmtId::from(1), 11));

        let mut b = MapFact::new();
        assert!(b.update(StmtId::from(2), 20));
        assert!(a.copy_from(&b));
        assert!(!a.copy_from(&b));
        assert_eq!(a.get(StmtId::from(1)), Some(&11));
        assert_eq!(a.get(StmtId::from(2)), Some(&20));
        assert_eq!(a.len(), 2);
    }
}

//! Relations and the per-run relation store
//!
//! A [`Relation`] is a duplicate-free set of ground tuples of one arity.
//! Iteration follows insertion order, so the tuples added since some earlier
//! length form a contiguous slice ([`Relation::since`]). Semi-naive
//! evaluation reads its deltas this way.
//!
//! # Example
//!
//! ```ignore
//! let mut edge = Relation::new(2);
//! assert!(edge.insert(Tuple::new(vec![Term::int(1), Term::int(2)])));
//! assert!(!edge.insert(Tuple::new(vec![Term::int(1), Term::int(2)])));
//! ```

use datalog_ast::{Predicate, Tuple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// A tuple whose length differs from the relation's arity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("arity mismatch: expected {expected} columns, got tuple {tuple}")]
pub struct ArityMismatch {
    pub expected: usize,
    pub tuple: Tuple,
}

/// A set of same-arity tuples with insertion-stable iteration
#[derive(Debug, Clone)]
pub struct Relation {
    arity: usize,
    tuples: Vec<Tuple>,
    index: FxHashSet<Tuple>,
}

impl Relation {
    /// Create an empty relation
    pub fn new(arity: usize) -> Self {
        Relation {
            arity,
            tuples: Vec::new(),
            index: FxHashSet::default(),
        }
    }

    /// The relation of arity zero holding the empty tuple
    ///
    /// Joining with it is the identity, which makes it the starting point
    /// for evaluating a rule body.
    pub fn unit() -> Self {
        let mut relation = Relation::new(0);
        relation.insert(Tuple::unit());
        relation
    }

    /// Build a relation from tuples, dropping duplicates.
    ///
    /// # Panics
    ///
    /// Panics if any tuple has a length other than `arity`.
    pub fn from_tuples(arity: usize, tuples: impl IntoIterator<Item = Tuple>) -> Self {
        let mut relation = Relation::new(arity);
        for tuple in tuples {
            relation.insert(tuple);
        }
        relation
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Add a tuple, returning `true` if it was not already present.
    ///
    /// # Panics
    ///
    /// Panics if the tuple's length differs from the relation's arity. The
    /// evaluator only builds tuples from compiled templates, so a mismatch is
    /// a bug. Use [`Relation::try_insert`] for caller-supplied data.
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        assert_eq!(
            tuple.arity(),
            self.arity,
            "tuple {} does not fit a relation of arity {}",
            tuple,
            self.arity
        );
        if self.index.contains(&tuple) {
            return false;
        }
        self.index.insert(tuple.clone());
        self.tuples.push(tuple);
        true
    }

    /// Checked variant of [`Relation::insert`]
    pub fn try_insert(&mut self, tuple: Tuple) -> Result<bool, ArityMismatch> {
        if tuple.arity() != self.arity {
            return Err(ArityMismatch {
                expected: self.arity,
                tuple,
            });
        }
        Ok(self.insert(tuple))
    }

    /// Add every tuple of `other`, returning how many were new
    pub fn add_all(&mut self, other: &Relation) -> usize {
        other
            .iter()
            .filter(|tuple| self.insert((*tuple).clone()))
            .count()
    }

    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.index.contains(tuple)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Tuple> {
        self.tuples.iter()
    }

    /// Tuples inserted after the relation had `mark` tuples
    pub fn since(&self, mark: usize) -> &[Tuple] {
        &self.tuples[mark.min(self.tuples.len())..]
    }

    /// Tuples in sorted order, for deterministic output
    pub fn sorted(&self) -> Vec<Tuple> {
        let mut tuples = self.tuples.clone();
        tuples.sort();
        tuples
    }
}

impl PartialEq for Relation {
    /// Set equality; insertion order is ignored
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity
            && self.len() == other.len()
            && self.iter().all(|tuple| other.contains(tuple))
    }
}

impl Eq for Relation {}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a Tuple;
    type IntoIter = std::slice::Iter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tuple) in self.sorted().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tuple)?;
        }
        write!(f, "}}")
    }
}

/// Map from predicate to its relation, owned by one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationStore {
    relations: FxHashMap<Predicate, Relation>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, predicate: &Predicate) -> Option<&Relation> {
        self.relations.get(predicate)
    }

    /// Get the relation for `predicate`, creating an empty one if needed
    pub fn get_or_create(&mut self, predicate: Predicate) -> &mut Relation {
        self.relations
            .entry(predicate)
            .or_insert_with(|| Relation::new(predicate.arity))
    }

    /// Add one tuple. See [`Relation::insert`] for the arity contract.
    pub fn insert(&mut self, predicate: Predicate, tuple: Tuple) -> bool {
        self.get_or_create(predicate).insert(tuple)
    }

    /// Add all tuples of `relation` under `predicate`, returning how many were new
    pub fn add_all(&mut self, predicate: Predicate, relation: &Relation) -> usize {
        self.get_or_create(predicate).add_all(relation)
    }

    /// Add every relation of `other`, returning how many tuples were new
    pub fn merge(&mut self, other: &RelationStore) -> usize {
        other
            .iter()
            .map(|(predicate, relation)| self.add_all(*predicate, relation))
            .sum()
    }

    pub fn contains(&self, predicate: &Predicate, tuple: &Tuple) -> bool {
        self.get(predicate).is_some_and(|relation| relation.contains(tuple))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Predicate, &Relation)> {
        self.relations.iter()
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.relations.keys()
    }

    /// Total number of tuples across all relations
    pub fn total_tuples(&self) -> usize {
        self.relations.values().map(Relation::len).sum()
    }

    /// Check if no relation holds a tuple
    pub fn is_empty(&self) -> bool {
        self.relations.values().all(Relation::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::Term;

    fn tuple(values: &[i64]) -> Tuple {
        Tuple::new(values.iter().map(|v| Term::int(*v)).collect())
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut relation = Relation::new(2);
        assert!(relation.insert(tuple(&[1, 2])));
        assert!(!relation.insert(tuple(&[1, 2])));
        assert!(relation.insert(tuple(&[2, 1])));
        assert_eq!(relation.len(), 2);
        assert!(relation.contains(&tuple(&[2, 1])));
    }

    #[test]
    fn test_insertion_order_and_since() {
        let mut relation = Relation::new(1);
        relation.insert(tuple(&[3]));
        relation.insert(tuple(&[1]));
        let mark = relation.len();
        relation.insert(tuple(&[2]));
        relation.insert(tuple(&[3]));

        let order: Vec<_> = relation.iter().cloned().collect();
        assert_eq!(order, vec![tuple(&[3]), tuple(&[1]), tuple(&[2])]);
        assert_eq!(relation.since(mark), &[tuple(&[2])]);
        assert!(relation.since(10).is_empty());
    }

    #[test]
    fn test_try_insert_arity_mismatch() {
        let mut relation = Relation::new(2);
        let err = relation.try_insert(tuple(&[1])).unwrap_err();
        assert_eq!(err.expected, 2);
        assert!(relation.is_empty());
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_insert_arity_mismatch_panics() {
        let mut relation = Relation::new(2);
        relation.insert(tuple(&[1, 2, 3]));
    }

    #[test]
    fn test_add_all_counts_new_tuples() {
        let mut left = Relation::from_tuples(1, vec![tuple(&[1]), tuple(&[2])]);
        let right = Relation::from_tuples(1, vec![tuple(&[2]), tuple(&[3])]);
        assert_eq!(left.add_all(&right), 1);
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Relation::from_tuples(1, vec![tuple(&[1]), tuple(&[2])]);
        let b = Relation::from_tuples(1, vec![tuple(&[2]), tuple(&[1])]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{(1), (2)}");
    }

    #[test]
    fn test_unit_relation() {
        let unit = Relation::unit();
        assert_eq!(unit.arity(), 0);
        assert_eq!(unit.len(), 1);
    }

    #[test]
    fn test_store_get_or_create_and_totals() {
        let edge = Predicate::new("edge", 2);
        let node = Predicate::new("node", 1);
        let mut store = RelationStore::new();
        assert!(store.get(&edge).is_none());

        store.insert(edge, tuple(&[1, 2]));
        store.insert(edge, tuple(&[2, 3]));
        store.insert(node, tuple(&[1]));
        assert_eq!(store.get_or_create(edge).len(), 2);
        assert_eq!(store.total_tuples(), 3);

        let mut other = RelationStore::new();
        other.insert(edge, tuple(&[2, 3]));
        other.insert(edge, tuple(&[3, 4]));
        assert_eq!(store.merge(&other), 1);
        assert!(store.contains(&edge, &tuple(&[3, 4])));
    }
}

//! Equi-join and semi-join
//!
//! The column mapping has one entry per left column. `Some(j)` requires the
//! left column to equal right column `j`; `None` leaves it unconstrained. An
//! all-`None` mapping is a cartesian product.

use crate::{illegal, AlgebraError};
use datalog_ast::{Term, Tuple};
use datalog_core::Relation;
use rustc_hash::FxHashMap;

/// What a join returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Left tuple followed by right tuple, for every matching pair
    Inner,
    /// Left tuples that have at least one match
    Semi,
}

/// Join `left` with `right` on the columns named by `mapping`.
///
/// # Errors
///
/// `IllegalArgument` if `mapping.len()` differs from the left arity or a
/// mapped right column is out of range.
pub fn join(
    left: &Relation,
    right: &Relation,
    mapping: &[Option<usize>],
    kind: JoinKind,
) -> Result<Relation, AlgebraError> {
    if mapping.len() != left.arity() {
        return Err(illegal(format!(
            "join mapping has {} entries for a left relation of arity {}",
            mapping.len(),
            left.arity()
        )));
    }
    let pairs: Vec<(usize, usize)> = mapping
        .iter()
        .enumerate()
        .filter_map(|(l, r)| r.map(|r| (l, r)))
        .collect();
    if let Some((_, r)) = pairs.iter().find(|(_, r)| *r >= right.arity()) {
        return Err(illegal(format!(
            "join mapping refers to right column {} of a relation of arity {}",
            r,
            right.arity()
        )));
    }

    let arity = match kind {
        JoinKind::Inner => left.arity() + right.arity(),
        JoinKind::Semi => left.arity(),
    };
    let mut result = Relation::new(arity);
    if left.is_empty() || right.is_empty() {
        return Ok(result);
    }

    // Build a hash index on the right side keyed by its join columns
    let mut index: FxHashMap<Vec<&Term>, Vec<&Tuple>> = FxHashMap::default();
    for tuple in right {
        let key = pairs.iter().map(|&(_, r)| &tuple.0[r]).collect();
        index.entry(key).or_default().push(tuple);
    }

    for tuple in left {
        let key: Vec<&Term> = pairs.iter().map(|&(l, _)| &tuple.0[l]).collect();
        let Some(matches) = index.get(&key) else {
            continue;
        };
        match kind {
            JoinKind::Inner => {
                for other in matches {
                    result.insert(tuple.concat(other));
                }
            }
            JoinKind::Semi => {
                result.insert(tuple.clone());
            }
        }
    }

    Ok(result)
}

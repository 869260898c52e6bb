//! Projection and selection

use crate::{illegal, AlgebraError};
use datalog_ast::{ComparisonOp, Term, Tuple};
use datalog_core::Relation;

/// Build a relation from the given columns of every tuple.
///
/// Columns may be reordered, dropped or repeated. The result is deduplicated.
pub fn project(relation: &Relation, columns: &[usize]) -> Result<Relation, AlgebraError> {
    if let Some(column) = columns.iter().find(|&&c| c >= relation.arity()) {
        return Err(illegal(format!(
            "projection column {} out of range for arity {}",
            column,
            relation.arity()
        )));
    }
    Ok(Relation::from_tuples(
        columns.len(),
        relation.iter().map(|tuple| tuple.project(columns)),
    ))
}

/// One position of a selection pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PatternEntry {
    /// Matches anything
    Any,
    /// Matches a term equal to the given one
    Equals(Term),
    /// Matches the same term as the given (earlier or later) column
    SameAs(usize),
}

/// Right-hand side of a threshold comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(Term),
    Column(usize),
}

/// `column op operand`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: usize,
    pub op: ComparisonOp,
    pub operand: Operand,
}

/// A selection condition over whole tuples
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// One entry per column
    Pattern(Vec<PatternEntry>),
    /// All conditions must hold
    Compare(Vec<Condition>),
}

impl Selection {
    fn validate(&self, arity: usize) -> Result<(), AlgebraError> {
        match self {
            Selection::Pattern(entries) => {
                if entries.len() != arity {
                    return Err(illegal(format!(
                        "selection pattern has {} entries for arity {}",
                        entries.len(),
                        arity
                    )));
                }
                for entry in entries {
                    if let PatternEntry::SameAs(column) = entry {
                        check_column(*column, arity)?;
                    }
                }
            }
            Selection::Compare(conditions) => {
                for condition in conditions {
                    check_column(condition.column, arity)?;
                    if let Operand::Column(column) = condition.operand {
                        check_column(column, arity)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn matches(&self, tuple: &Tuple) -> bool {
        let terms = tuple.terms();
        match self {
            Selection::Pattern(entries) => {
                entries
                    .iter()
                    .zip(terms)
                    .all(|(entry, term)| match entry {
                        PatternEntry::Any => true,
                        PatternEntry::Equals(expected) => term == expected,
                        PatternEntry::SameAs(column) => term == &terms[*column],
                    })
            }
            Selection::Compare(conditions) => conditions.iter().all(|condition| {
                let left = &terms[condition.column];
                let right = match &condition.operand {
                    Operand::Constant(term) => term,
                    Operand::Column(column) => &terms[*column],
                };
                condition.op.holds(left.compare_semantic(right))
            }),
        }
    }
}

fn check_column(column: usize, arity: usize) -> Result<(), AlgebraError> {
    if column >= arity {
        return Err(illegal(format!(
            "selection column {} out of range for arity {}",
            column, arity
        )));
    }
    Ok(())
}

/// Keep the tuples that satisfy `selection`
pub fn select(relation: &Relation, selection: &Selection) -> Result<Relation, AlgebraError> {
    selection.validate(relation.arity())?;
    Ok(Relation::from_tuples(
        relation.arity(),
        relation
            .iter()
            .filter(|tuple| selection.matches(tuple))
            .cloned(),
    ))
}

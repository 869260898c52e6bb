//! Relational operators over [`datalog_core::Relation`]
//!
//! Every operator takes its inputs by reference and returns a fresh,
//! deduplicated relation. Malformed arguments (arity mismatches, columns out
//! of range) are reported as [`AlgebraError::IllegalArgument`].
//!
//! # Example
//!
//! ```ignore
//! // path(X, Z) :- path(X, Y), edge(Y, Z).
//! let joined = join(&path, &edge, &[None, Some(0)], JoinKind::Inner)?;
//! let result = project(&joined, &[0, 3])?;
//! ```

mod join;
mod select;
mod set_ops;

pub use join::{join, JoinKind};
pub use select::{project, select, Condition, Operand, PatternEntry, Selection};
pub use set_ops::{difference, union};

/// Errors raised by the relational operators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlgebraError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

pub(crate) fn illegal(message: String) -> AlgebraError {
    AlgebraError::IllegalArgument(message)
}

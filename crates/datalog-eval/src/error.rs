use datalog_algebra::AlgebraError;
use datalog_ast::Symbol;
use datalog_core::ProgramError;
use datalog_magic::RewriteError;
use datalog_safety::{SafetyError, StratificationError};

/// Errors that can occur during evaluation
///
/// Structural errors (stratification, safety) are raised before any
/// fixpoint work; no partial results are returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// Program is not stratifiable (cycle through negation)
    #[error("Stratification error: {0}")]
    NotStratified(#[from] StratificationError),
    /// Program violates safety rules
    #[error("Safety error: {0}")]
    UnsafeRule(#[from] SafetyError),
    /// A relational operator received malformed arguments
    #[error("Algebra error: {0}")]
    Algebra(#[from] AlgebraError),
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),
    #[error("Magic sets error: {0}")]
    Rewrite(#[from] RewriteError),
    /// A built-in divided by zero while configured to stop
    #[error("Division by zero in '{rule}'")]
    DivisionByZero { rule: String },
    /// The model grew past the configured tuple limit
    #[error("Tuple limit of {limit} exceeded ({size} tuples)")]
    TupleLimitExceeded { limit: usize, size: usize },
    /// A literal could not be scheduled because its inputs are never bound
    #[error("Unbound variables {variables:?} in '{rule}'")]
    UnboundVariables { rule: String, variables: Vec<Symbol> },
}

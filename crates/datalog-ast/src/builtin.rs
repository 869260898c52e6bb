//! Built-in atom descriptors
//!
//! Only the shape of a built-in lives here. Evaluation is in the
//! `datalog-builtins` crate.

use crate::term::{write_joined, Term};
use crate::value::Datatype;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,          // =
    NotEqual,       // !=
    LessThan,       // <
    LessOrEqual,    // <=
    GreaterThan,    // >
    GreaterOrEqual, // >=
}

impl ComparisonOp {
    /// Decide the comparison from the result of a semantic compare.
    ///
    /// Incomparable operands (`None`) are never equal, so only `!=` holds.
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (ComparisonOp::NotEqual, ordering) => ordering != Some(Ordering::Equal),
            (_, None) => false,
            (ComparisonOp::Equal, Some(ord)) => ord == Ordering::Equal,
            (ComparisonOp::LessThan, Some(ord)) => ord == Ordering::Less,
            (ComparisonOp::LessOrEqual, Some(ord)) => ord != Ordering::Greater,
            (ComparisonOp::GreaterThan, Some(ord)) => ord == Ordering::Greater,
            (ComparisonOp::GreaterOrEqual, Some(ord)) => ord != Ordering::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        }
    }
}

/// Ternary arithmetic operators: `op(X, Y, Z)` means `X op Y = Z`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

impl ArithmeticOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "ADD",
            ArithmeticOp::Subtract => "SUBTRACT",
            ArithmeticOp::Multiply => "MULTIPLY",
            ArithmeticOp::Divide => "DIVIDE",
            ArithmeticOp::Modulus => "MODULUS",
        }
    }
}

/// The built-in predicates known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Comparison(ComparisonOp),
    Arithmetic(ArithmeticOp),
    /// Holds when the argument has the given datatype
    IsType(Datatype),
    /// Holds when the argument is any numeric
    IsNumeric,
    /// Always holds
    True,
    /// Never holds
    False,
}

impl BuiltinKind {
    pub fn arity(self) -> usize {
        match self {
            BuiltinKind::Comparison(_) => 2,
            BuiltinKind::Arithmetic(_) => 3,
            BuiltinKind::IsType(_) | BuiltinKind::IsNumeric => 1,
            BuiltinKind::True | BuiltinKind::False => 0,
        }
    }

    /// Check if this is `=`, the built-in that can bind one side
    pub fn is_equality(self) -> bool {
        self == BuiltinKind::Comparison(ComparisonOp::Equal)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BuiltinKind::Arithmetic(_))
    }

    /// Name in prefix form: `ADD`, `IS_INTEGER`, `=`
    pub fn name(self) -> String {
        match self {
            BuiltinKind::Comparison(op) => op.symbol().to_string(),
            BuiltinKind::Arithmetic(op) => op.name().to_string(),
            BuiltinKind::IsType(datatype) => format!("IS_{}", datatype.to_string().to_uppercase()),
            BuiltinKind::IsNumeric => "IS_NUMERIC".to_string(),
            BuiltinKind::True => "TRUE".to_string(),
            BuiltinKind::False => "FALSE".to_string(),
        }
    }
}

/// A built-in applied to terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuiltinAtom {
    pub kind: BuiltinKind,
    pub terms: Vec<Term>,
}

impl BuiltinAtom {
    pub fn new(kind: BuiltinKind, terms: Vec<Term>) -> Self {
        debug_assert_eq!(kind.arity(), terms.len(), "wrong number of built-in arguments");
        BuiltinAtom { kind, terms }
    }

    pub fn compare(op: ComparisonOp, left: Term, right: Term) -> Self {
        BuiltinAtom::new(BuiltinKind::Comparison(op), vec![left, right])
    }

    pub fn equal(left: Term, right: Term) -> Self {
        BuiltinAtom::compare(ComparisonOp::Equal, left, right)
    }

    pub fn arithmetic(op: ArithmeticOp, x: Term, y: Term, z: Term) -> Self {
        BuiltinAtom::new(BuiltinKind::Arithmetic(op), vec![x, y, z])
    }
}

impl fmt::Display for BuiltinAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.terms.as_slice()) {
            (BuiltinKind::Comparison(op), [left, right]) => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            (BuiltinKind::True | BuiltinKind::False, []) => f.write_str(&self.kind.name()),
            // Prefix form, also for argument lists of the wrong length
            (kind, terms) => {
                write!(f, "{}(", kind.name())?;
                write_joined(f, terms)?;
                write!(f, ")")
            }
        }
    }
}

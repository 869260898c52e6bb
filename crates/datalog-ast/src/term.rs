//! Terms and tuples
//!
//! Terms are ordered by category first (`variable < constant < compound`),
//! then by payload. A [`Tuple`] compares lexicographically.

use crate::value::Value;
use crate::Symbol;
use internment::Intern;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Variable bindings produced by matching and consumed by substitution
pub type Bindings = HashMap<Symbol, Term>;

/// A term can be a variable, constant, or compound term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Variable: `?X`
    Variable(Symbol),
    /// Constant value
    Constant(Value),
    /// Compound term: functor with arguments (f(a, b))
    Compound(Symbol, Vec<Term>),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Variable(Intern::new(name.to_string()))
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Term::Constant(value.into())
    }

    pub fn string(s: &str) -> Self {
        Term::Constant(Value::string(s))
    }

    pub fn int(i: i64) -> Self {
        Term::Constant(Value::Integer(i))
    }

    pub fn compound(functor: &str, args: Vec<Term>) -> Self {
        Term::Compound(Intern::new(functor.to_string()), args)
    }

    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Check if this term is ground (contains no variables)
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) => true,
            Term::Compound(_, args) => args.iter().all(|t| t.is_ground()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Term::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Append the variables of this term to `out`, skipping ones already present
    pub fn collect_variables(&self, out: &mut Vec<Symbol>) {
        match self {
            Term::Variable(name) => {
                if !out.contains(name) {
                    out.push(*name);
                }
            }
            Term::Constant(_) => {}
            Term::Compound(_, args) => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Replace bound variables. Unbound variables are left in place.
    pub fn substitute(&self, bindings: &Bindings) -> Term {
        match self {
            Term::Variable(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Term::Constant(_) => self.clone(),
            Term::Compound(functor, args) => Term::Compound(
                *functor,
                args.iter().map(|arg| arg.substitute(bindings)).collect(),
            ),
        }
    }

    /// Match this term (a pattern) against a ground term, extending `bindings`.
    ///
    /// Matching is syntactic: a variable already bound must be bound to an
    /// equal term. Returns `false` and may leave partial bindings behind on
    /// failure.
    pub fn match_ground(&self, ground: &Term, bindings: &mut Bindings) -> bool {
        match (self, ground) {
            (Term::Variable(name), _) => match bindings.get(name) {
                Some(bound) => bound == ground,
                None => {
                    bindings.insert(*name, ground.clone());
                    true
                }
            },
            (Term::Constant(a), Term::Constant(b)) => a == b,
            (Term::Compound(f, args), Term::Compound(g, ground_args)) => {
                f == g
                    && args.len() == ground_args.len()
                    && args
                        .iter()
                        .zip(ground_args)
                        .all(|(arg, ground_arg)| arg.match_ground(ground_arg, bindings))
            }
            _ => false,
        }
    }

    /// Compare two ground terms the way built-ins see them.
    ///
    /// Constants use [`Value::compare_semantic`]. Compound terms with the same
    /// functor and arity compare argument-wise; anything else is comparable
    /// only when structurally equal.
    pub fn compare_semantic(&self, other: &Term) -> Option<Ordering> {
        match (self, other) {
            (Term::Constant(a), Term::Constant(b)) => a.compare_semantic(b),
            (Term::Compound(f, args), Term::Compound(g, other_args))
                if f == g && args.len() == other_args.len() =>
            {
                for (a, b) in args.iter().zip(other_args) {
                    match a.compare_semantic(b)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(Ordering::Equal)
            }
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "?{}", name),
            Term::Constant(value) => write!(f, "{}", value),
            Term::Compound(functor, args) => {
                write!(f, "{}(", functor)?;
                write_joined(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Constant(value)
    }
}

/// A fixed-length sequence of terms. Stored tuples are always ground.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tuple(pub Vec<Term>);

impl Tuple {
    pub fn new(terms: Vec<Term>) -> Self {
        Tuple(terms)
    }

    /// The zero-arity tuple
    pub fn unit() -> Self {
        Tuple(Vec::new())
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, column: usize) -> Option<&Term> {
        self.0.get(column)
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn is_ground(&self) -> bool {
        self.0.iter().all(Term::is_ground)
    }

    /// Concatenate two tuples
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut terms = Vec::with_capacity(self.arity() + other.arity());
        terms.extend_from_slice(&self.0);
        terms.extend_from_slice(&other.0);
        Tuple(terms)
    }

    /// Build a new tuple from the given columns, in order
    pub fn project(&self, columns: &[usize]) -> Tuple {
        Tuple(columns.iter().map(|&c| self.0[c].clone()).collect())
    }
}

impl From<Vec<Term>> for Tuple {
    fn from(terms: Vec<Term>) -> Self {
        Tuple(terms)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_joined(f, &self.0)?;
        write!(f, ")")
    }
}

pub(crate) fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

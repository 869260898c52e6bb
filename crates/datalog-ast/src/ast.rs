//! Rule-level syntax: predicates, atoms, literals, rules and queries
//!
//! # Key Components
//!
//! - **Predicate**: name plus arity; `p/1` and `p/2` are different predicates
//! - **Atom**: predicate applied to terms (e.g., `parent('john', 'mary')`)
//! - **Literal**: positive atom, negated atom, or built-in
//! - **Rule**: one head atom and an ordered body
//! - **Query**: a conjunctive body whose answer columns are its variables
//!
//! # Syntax Examples
//!
//! - **Rules**: `ancestor(?X, ?Z) :- parent(?X, ?Y), ancestor(?Y, ?Z).`
//! - **Queries**: `?- ancestor(?X, 'mary').`
//! - **Negation**: `not reachable(?X, ?Y)`

use crate::builtin::BuiltinAtom;
use crate::term::{write_joined, Term};
use crate::Symbol;
use internment::Intern;
use std::fmt;

/// A predicate is identified by its name and arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Predicate {
    pub name: Symbol,
    pub arity: usize,
}

impl Predicate {
    pub fn new(name: &str, arity: usize) -> Self {
        Predicate {
            name: Intern::new(name.to_string()),
            arity,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// An atom is a predicate applied to terms: `parent('john', 'mary')`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: Predicate,
    pub terms: Vec<Term>,
}

impl Atom {
    /// Create a new atom; the arity is taken from `terms`
    pub fn new(name: &str, terms: Vec<Term>) -> Self {
        Atom {
            predicate: Predicate::new(name, terms.len()),
            terms,
        }
    }

    /// Create an atom for an existing predicate symbol
    pub fn with_symbol(name: Symbol, terms: Vec<Term>) -> Self {
        Atom {
            predicate: Predicate {
                name,
                arity: terms.len(),
            },
            terms,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_ground)
    }

    /// Distinct variables in first-occurrence order
    pub fn variables(&self) -> Vec<Symbol> {
        let mut vars = Vec::new();
        for term in &self.terms {
            term.collect_variables(&mut vars);
        }
        vars
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate.name)?;
        write_joined(f, &self.terms)?;
        write!(f, ")")
    }
}

/// A body literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Positive atom: `parent(?X, ?Y)`
    Positive(Atom),
    /// Negated atom: `not parent(?X, ?Y)`
    Negative(Atom),
    /// Built-in: `?X < 5`, `ADD(?X, 1, ?Y)`
    BuiltIn(BuiltinAtom),
}

impl Literal {
    /// Get the underlying atom from a literal (None for built-ins)
    pub fn atom(&self) -> Option<&Atom> {
        match self {
            Literal::Positive(atom) | Literal::Negative(atom) => Some(atom),
            Literal::BuiltIn(_) => None,
        }
    }

    /// Check if the literal is positive
    pub fn is_positive(&self) -> bool {
        matches!(self, Literal::Positive(_))
    }

    /// Check if the literal is negative
    pub fn is_negative(&self) -> bool {
        matches!(self, Literal::Negative(_))
    }

    /// Check if the literal is a built-in
    pub fn is_builtin(&self) -> bool {
        matches!(self, Literal::BuiltIn(_))
    }

    pub fn terms(&self) -> &[Term] {
        match self {
            Literal::Positive(atom) | Literal::Negative(atom) => &atom.terms,
            Literal::BuiltIn(builtin) => &builtin.terms,
        }
    }

    /// Distinct variables in first-occurrence order
    pub fn variables(&self) -> Vec<Symbol> {
        let mut vars = Vec::new();
        for term in self.terms() {
            term.collect_variables(&mut vars);
        }
        vars
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Positive(atom) => write!(f, "{}", atom),
            Literal::Negative(atom) => write!(f, "not {}", atom),
            Literal::BuiltIn(builtin) => write!(f, "{}", builtin),
        }
    }
}

/// A rule has a head and a body: `ancestor(?X, ?Y) :- parent(?X, ?Y).`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<Literal>,
}

impl Rule {
    pub fn new(head: Atom, body: Vec<Literal>) -> Self {
        Rule { head, body }
    }

    /// Positive ordinary atoms of the body, in order
    pub fn positive_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|literal| match literal {
            Literal::Positive(atom) => Some(atom),
            _ => None,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            write_joined(f, &self.body)?;
        }
        write!(f, ".")
    }
}

/// A query: `?- parent(?X, 'mary').`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub body: Vec<Literal>,
}

impl Query {
    pub fn new(body: Vec<Literal>) -> Self {
        Query { body }
    }

    /// The answer columns: distinct variables in first-occurrence order
    pub fn variables(&self) -> Vec<Symbol> {
        let mut vars = Vec::new();
        for literal in &self.body {
            for term in literal.terms() {
                term.collect_variables(&mut vars);
            }
        }
        vars
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?- ")?;
        write_joined(f, &self.body)?;
        write!(f, ".")
    }
}

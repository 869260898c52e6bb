//! Core syntax for the Datalog engine
//!
//! This crate defines the values, terms and tuples the relational engine
//! stores, and the rule-level structures (atoms, literals, rules, queries)
//! the evaluator compiles.
//!
//! # Key Components
//!
//! - **Value**: typed constants with numeric widening
//! - **Term / Tuple**: variables, constants and compound terms
//! - **Predicate / Atom / Literal / Rule / Query**: program structure
//! - **BuiltinAtom**: comparison, arithmetic and type-check built-ins

mod ast;
mod builtin;
mod term;
mod value;

use internment::Intern;

/// Interned string for efficient storage and comparison
pub type Symbol = Intern<String>;

pub use ast::{Atom, Literal, Predicate, Query, Rule};
pub use builtin::{ArithmeticOp, BuiltinAtom, BuiltinKind, ComparisonOp};
pub use term::{Bindings, Term, Tuple};
pub use value::{Datatype, MalformedLiteralError, Value};

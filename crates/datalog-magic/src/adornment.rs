//! Adornments and the naming of adorned and magic predicates

use datalog_ast::{Atom, BuiltinAtom, Literal, Predicate, Symbol, Term};
use internment::Intern;
use std::collections::HashSet;
use std::fmt;

/// Prefix of magic predicate names
pub const MAGIC_PREFIX: &str = "magic_";

/// Bound (`b`) / free (`f`) pattern of an atom's arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Adornment(Vec<bool>);

impl Adornment {
    /// An argument is bound when all of its variables are bound
    pub fn of(terms: &[Term], bound: &HashSet<Symbol>) -> Self {
        Adornment(terms.iter().map(|term| is_bound(term, bound)).collect())
    }

    pub fn has_bound(&self) -> bool {
        self.0.iter().any(|b| *b)
    }

    /// The terms at bound positions
    pub fn bound_terms(&self, terms: &[Term]) -> Vec<Term> {
        terms
            .iter()
            .zip(&self.0)
            .filter(|(_, bound)| **bound)
            .map(|(term, _)| term.clone())
            .collect()
    }

    /// `p` becomes `p^bf`
    pub fn adorn(&self, predicate: Predicate) -> Predicate {
        Predicate {
            name: Intern::new(format!("{}^{}", predicate.name, self)),
            arity: predicate.arity,
        }
    }

    /// The magic atom for `atom` under this adornment: `magic_p^bf(bound terms)`
    pub fn magic_atom(&self, atom: &Atom) -> Atom {
        let name = Intern::new(format!("{}{}^{}", MAGIC_PREFIX, atom.predicate.name, self));
        Atom::with_symbol(name, self.bound_terms(&atom.terms))
    }
}

impl fmt::Display for Adornment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bound in &self.0 {
            f.write_str(if *bound { "b" } else { "f" })?;
        }
        Ok(())
    }
}

pub(crate) fn is_bound(term: &Term, bound: &HashSet<Symbol>) -> bool {
    let mut vars = Vec::new();
    term.collect_variables(&mut vars);
    vars.iter().all(|v| bound.contains(v))
}

/// Check whether a built-in can run once `bound` is known. Unknown
/// arguments must be plain variables.
pub(crate) fn builtin_evaluable(builtin: &BuiltinAtom, bound: &HashSet<Symbol>) -> bool {
    let known: Vec<bool> = builtin.terms.iter().map(|t| is_bound(t, bound)).collect();
    let unknown_are_variables = builtin
        .terms
        .iter()
        .zip(&known)
        .all(|(term, known)| *known || term.is_variable());
    unknown_are_variables && datalog_builtins::can_evaluate(builtin.kind, &known)
}

/// Check whether `builtin` would bind a variable that one of the `later`
/// positive literals mentions. Such a built-in is left out of the sideways
/// passing so the literal binds the variable itself.
pub(crate) fn binds_later_positive(
    builtin: &BuiltinAtom,
    bound: &HashSet<Symbol>,
    later: &[Literal],
) -> bool {
    builtin
        .terms
        .iter()
        .filter_map(|term| match term {
            Term::Variable(name) if !bound.contains(name) => Some(name),
            _ => None,
        })
        .any(|name| {
            later
                .iter()
                .any(|literal| literal.is_positive() && literal.variables().contains(name))
        })
}

//! Programs: facts, rules and queries
//!
//! Facts are kept as relations keyed by predicate. Rules and queries are kept
//! in insertion order; nothing here checks safety or stratification.

use crate::relation::{ArityMismatch, Relation, RelationStore};
use datalog_ast::{Atom, Datatype, MalformedLiteralError, Predicate, Query, Rule, Term, Tuple, Value};
use std::collections::BTreeSet;

/// Errors raised while building a program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// A fact must not contain variables
    #[error("fact '{0}' is not ground")]
    NonGroundFact(String),
    #[error(transparent)]
    ArityMismatch(#[from] ArityMismatch),
    #[error(transparent)]
    MalformedLiteral(#[from] MalformedLiteralError),
}

/// A Datalog program: stored facts, rules and queries
#[derive(Debug, Clone, Default)]
pub struct Program {
    facts: RelationStore,
    rules: Vec<Rule>,
    queries: Vec<Query>,
}

impl Program {
    /// Create a new empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ground fact, returning `true` if it was new
    pub fn add_fact(&mut self, atom: Atom) -> Result<bool, ProgramError> {
        if !atom.is_ground() {
            return Err(ProgramError::NonGroundFact(atom.to_string()));
        }
        self.add_tuple(atom.predicate, Tuple::new(atom.terms))
    }

    /// Add a ground tuple under `predicate`
    pub fn add_tuple(&mut self, predicate: Predicate, tuple: Tuple) -> Result<bool, ProgramError> {
        if !tuple.is_ground() {
            return Err(ProgramError::NonGroundFact(format!(
                "{}{}",
                predicate.name, tuple
            )));
        }
        Ok(self.facts.get_or_create(predicate).try_insert(tuple)?)
    }

    /// Add a fact given as typed lexical forms, as in
    /// `price("tea", 3)` from `[(String, "tea"), (Integer, "3")]`.
    ///
    /// Nothing is added if any argument fails to parse.
    pub fn add_lexical_fact(
        &mut self,
        name: &str,
        arguments: &[(Datatype, &str)],
    ) -> Result<bool, ProgramError> {
        let terms = arguments
            .iter()
            .map(|(datatype, lexical)| Value::parse(*datatype, lexical).map(Term::constant))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_tuple(Predicate::new(name, terms.len()), Tuple::new(terms))
    }

    /// Add every tuple of `relation` under `predicate`
    pub fn add_relation(
        &mut self,
        predicate: Predicate,
        relation: &Relation,
    ) -> Result<usize, ProgramError> {
        if relation.arity() != predicate.arity {
            if let Some(tuple) = relation.iter().next() {
                return Err(ArityMismatch {
                    expected: predicate.arity,
                    tuple: tuple.clone(),
                }
                .into());
            }
        }
        for tuple in relation {
            if !tuple.is_ground() {
                return Err(ProgramError::NonGroundFact(format!(
                    "{}{}",
                    predicate.name, tuple
                )));
            }
        }
        Ok(self.facts.add_all(predicate, relation))
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn add_query(&mut self, query: Query) {
        self.queries.push(query);
    }

    pub fn facts(&self) -> &RelationStore {
        &self.facts
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Replace the rules, keeping facts and queries
    pub fn with_rules(&self, rules: Vec<Rule>) -> Program {
        Program {
            facts: self.facts.clone(),
            rules,
            queries: self.queries.clone(),
        }
    }

    /// Predicates that head at least one rule
    pub fn idb_predicates(&self) -> BTreeSet<Predicate> {
        self.rules.iter().map(|rule| rule.head.predicate).collect()
    }

    /// Every predicate mentioned by a fact, rule or query
    pub fn predicates(&self) -> BTreeSet<Predicate> {
        let mut predicates: BTreeSet<Predicate> = self.facts.predicates().copied().collect();
        for rule in &self.rules {
            predicates.insert(rule.head.predicate);
            predicates.extend(rule.body.iter().filter_map(|l| l.atom()).map(|a| a.predicate));
        }
        for query in &self.queries {
            predicates.extend(query.body.iter().filter_map(|l| l.atom()).map(|a| a.predicate));
        }
        predicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{Literal, Term};

    #[test]
    fn test_add_fact() {
        let mut program = Program::new();
        let fact = Atom::new("parent", vec![Term::string("john"), Term::string("mary")]);
        assert_eq!(program.add_fact(fact.clone()), Ok(true));
        assert_eq!(program.add_fact(fact), Ok(false));
        assert_eq!(program.facts().total_tuples(), 1);
    }

    #[test]
    fn test_add_non_ground_fact() {
        let mut program = Program::new();
        let result = program.add_fact(Atom::new("parent", vec![Term::var("X")]));
        assert!(matches!(result, Err(ProgramError::NonGroundFact(_))));
    }

    #[test]
    fn test_add_lexical_fact() {
        let mut program = Program::new();
        let added = program.add_lexical_fact(
            "price",
            &[(Datatype::String, "tea"), (Datatype::Decimal, "3.50")],
        );
        assert_eq!(added, Ok(true));
        assert_eq!(program.facts().total_tuples(), 1);

        let err = program
            .add_lexical_fact("price", &[(Datatype::String, "pie"), (Datatype::Integer, "7.5")])
            .unwrap_err();
        assert_eq!(
            err,
            ProgramError::MalformedLiteral(MalformedLiteralError {
                datatype: Datatype::Integer,
                lexical: "7.5".to_string(),
            })
        );
        assert_eq!(program.facts().total_tuples(), 1);
    }

    #[test]
    fn test_add_relation_arity_mismatch() {
        let mut program = Program::new();
        let relation = Relation::from_tuples(1, vec![Tuple::new(vec![Term::int(1)])]);
        let result = program.add_relation(Predicate::new("edge", 2), &relation);
        assert!(matches!(result, Err(ProgramError::ArityMismatch(_))));
    }

    #[test]
    fn test_predicates() {
        let mut program = Program::new();
        program
            .add_fact(Atom::new("edge", vec![Term::int(1), Term::int(2)]))
            .unwrap();
        program.add_rule(Rule::new(
            Atom::new("path", vec![Term::var("X"), Term::var("Y")]),
            vec![Literal::Positive(Atom::new(
                "edge",
                vec![Term::var("X"), Term::var("Y")],
            ))],
        ));

        let idb: Vec<_> = program.idb_predicates().into_iter().collect();
        assert_eq!(idb, vec![Predicate::new("path", 2)]);
        assert_eq!(program.predicates().len(), 2);
    }
}

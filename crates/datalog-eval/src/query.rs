//! Query evaluation
//!
//! A query body is compiled like a rule body whose head lists the query's
//! variables in first-occurrence order, and runs against a finished model.
//!
//! # Query Types
//!
//! - **Ground queries**: No variables; the result holds the empty tuple if
//!   the query is true and nothing otherwise
//! - **Variable queries**: One column per variable, one row per answer
//!
//! # Example
//!
//! ```ignore
//! // ?- parent(?X, 'mary').
//! let result = model.execute(&query)?;
//! for bindings in result.bindings() {
//!     println!("{}", bindings[&x]);
//! }
//! ```

use crate::compiler::{CompiledRule, RuleInputs};
use crate::config::EvaluationConfig;
use crate::error::EvaluationError;
use crate::evaluation::EvaluationStats;
use datalog_ast::{Atom, Bindings, Predicate, Query, Rule, Symbol, Term, Tuple};
use datalog_core::{Relation, RelationStore};
use datalog_safety::check_query_safety;
use rayon::prelude::*;
use std::fmt;
use tracing::debug;

/// Head name of the rule a query is compiled into
const QUERY_HEAD: &str = "?-";

/// Answers to one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Output variables, in first-occurrence order
    pub variables: Vec<Symbol>,
    /// One column per output variable
    pub relation: Relation,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.relation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relation.is_empty()
    }

    /// Check if the query has at least one answer
    pub fn is_true(&self) -> bool {
        !self.relation.is_empty()
    }

    /// Answers in sorted order
    pub fn sorted(&self) -> Vec<Tuple> {
        self.relation.sorted()
    }

    /// Answers as variable bindings, in sorted order
    pub fn bindings(&self) -> Vec<Bindings> {
        self.sorted()
            .into_iter()
            .map(|tuple| self.variables.iter().copied().zip(tuple.0).collect())
            .collect()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, variable) in self.variables.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{}", variable)?;
        }
        write!(f, ") = {}", self.relation)
    }
}

/// The relations of a finished evaluation
#[derive(Debug, Clone, Default)]
pub struct Model {
    relations: RelationStore,
    undefined: RelationStore,
    stats: EvaluationStats,
    config: EvaluationConfig,
}

impl Model {
    pub(crate) fn new(
        relations: RelationStore,
        undefined: RelationStore,
        stats: EvaluationStats,
        config: EvaluationConfig,
    ) -> Self {
        Model {
            relations,
            undefined,
            stats,
            config,
        }
    }

    /// True facts, given and derived
    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn relation(&self, predicate: &Predicate) -> Option<&Relation> {
        self.relations.get(predicate)
    }

    /// Facts that are neither true nor false. Only the well-founded strategy
    /// produces any.
    pub fn undefined(&self) -> &RelationStore {
        &self.undefined
    }

    pub fn stats(&self) -> &EvaluationStats {
        &self.stats
    }

    /// Answer one query against the true facts
    pub fn execute(&self, query: &Query) -> Result<QueryResult, EvaluationError> {
        check_query_safety(query, &self.config.safety)?;

        let variables = query.variables();
        let head = Atom::new(
            QUERY_HEAD,
            variables.iter().map(|v| Term::Variable(*v)).collect(),
        );
        let compiled = CompiledRule::compile(&Rule::new(head, query.body.clone()))?;
        let relation = compiled.execute(RuleInputs::new(&self.relations), &self.config)?;
        debug!(%query, answers = relation.len(), "query executed");
        Ok(QueryResult {
            variables,
            relation,
        })
    }

    /// Answer several queries, on the rayon pool when `parallel_queries` is set
    pub fn execute_all(&self, queries: &[Query]) -> Result<Vec<QueryResult>, EvaluationError> {
        if self.config.parallel_queries {
            queries.par_iter().map(|query| self.execute(query)).collect()
        } else {
            queries.iter().map(|query| self.execute(query)).collect()
        }
    }
}

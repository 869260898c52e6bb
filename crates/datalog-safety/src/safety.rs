//! Safety checking for Datalog rules
//!
//! This module checks that every variable of a rule is *limited*: bound to a
//! finite set of values by the body. This ensures finite evaluation.
//!
//! # Limited variables
//!
//! 1. Variables of positive ordinary literals are limited.
//! 2. An equality `X = t` limits `X` once every variable of `t` is limited
//!    (either side may be the unknown one).
//! 3. With [`SafetyConfig::ternary_targets_imply_limited`], an arithmetic
//!    built-in limits its one remaining variable once the others are
//!    limited and the built-in can be solved for it.
//!
//! Rule 2 and 3 are applied until nothing changes.
//!
//! # Safety Rules
//!
//! A rule is safe if:
//! 1. All variables in the head are limited
//! 2. All variables in negative literals are limited, unless
//!    [`SafetyConfig::allow_unlimited_variables_in_negated_ordinary_predicates`]
//!    is set
//! 3. All variables in built-in predicates are limited
//!
//! # Example
//!
//! ```ignore
//! // Safe:   s(?X, ?Y) :- p(?X, ?Z), r(?Y, ?Z).
//! // Unsafe: w(?X, ?Y) :- s(?X), not p(2, ?Y).  // ?Y appears only in negation
//! ```

use datalog_ast::{Literal, Query, Rule, Symbol, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options controlling which rules count as safe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SafetyConfig {
    /// Variables that occur only in negated ordinary literals are read as
    /// existentially quantified inside the negation
    pub allow_unlimited_variables_in_negated_ordinary_predicates: bool,
    /// Arithmetic built-ins limit their remaining unknown
    pub ternary_targets_imply_limited: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            allow_unlimited_variables_in_negated_ordinary_predicates: false,
            ternary_targets_imply_limited: true,
        }
    }
}

/// Error indicating a rule is unsafe
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SafetyError {
    /// Variables that are not limited by the body
    #[error("Unsafe rule '{rule}': variables {} are not limited", format_variables(.variables))]
    UnsafeRule {
        rule: String,
        variables: Vec<Symbol>,
    },
    /// Variables of a query that are not limited by its positive literals
    #[error("Unsafe query '{query}': variables {} are not limited", format_variables(.variables))]
    UnsafeQuery {
        query: String,
        variables: Vec<Symbol>,
    },
}

impl SafetyError {
    /// The offending variables
    pub fn variables(&self) -> &[Symbol] {
        match self {
            SafetyError::UnsafeRule { variables, .. } | SafetyError::UnsafeQuery { variables, .. } => {
                variables
            }
        }
    }
}

fn format_variables(variables: &[Symbol]) -> String {
    let names: Vec<String> = variables.iter().map(|v| format!("?{}", v)).collect();
    names.join(", ")
}

/// Compute the limited variables of a body
pub fn limited_variables(body: &[Literal], config: &SafetyConfig) -> HashSet<Symbol> {
    let mut limited = HashSet::new();
    for literal in body {
        if let Literal::Positive(atom) = literal {
            limited.extend(atom.variables());
        }
    }

    // Close over built-ins that can bind
    let mut changed = true;
    while changed {
        changed = false;
        for literal in body {
            let Literal::BuiltIn(builtin) = literal else {
                continue;
            };
            let binds = builtin.kind.is_equality()
                || (builtin.kind.is_arithmetic() && config.ternary_targets_imply_limited);
            if !binds {
                continue;
            }
            let known: Vec<bool> = builtin
                .terms
                .iter()
                .map(|term| is_limited(term, &limited))
                .collect();
            // Only a plain variable can receive a computed value
            let unknown_are_variables = builtin
                .terms
                .iter()
                .zip(&known)
                .all(|(term, known)| *known || term.is_variable());
            if known.iter().all(|k| *k)
                || !unknown_are_variables
                || !datalog_builtins::can_evaluate(builtin.kind, &known)
            {
                continue;
            }
            for (term, known) in builtin.terms.iter().zip(&known) {
                if let (Term::Variable(name), false) = (term, known) {
                    changed |= limited.insert(*name);
                }
            }
        }
    }

    limited
}

fn is_limited(term: &Term, limited: &HashSet<Symbol>) -> bool {
    let mut vars = Vec::new();
    term.collect_variables(&mut vars);
    vars.iter().all(|v| limited.contains(v))
}

/// Variables of `body` (plus `extra`) that the safety rules require to be
/// limited but are not, in first-occurrence order
fn unlimited_variables(body: &[Literal], extra: &[Symbol], config: &SafetyConfig) -> Vec<Symbol> {
    let limited = limited_variables(body, config);
    let mut required: Vec<Symbol> = extra.to_vec();
    for literal in body {
        match literal {
            Literal::Positive(_) => {}
            Literal::Negative(_)
                if config.allow_unlimited_variables_in_negated_ordinary_predicates => {}
            Literal::Negative(_) | Literal::BuiltIn(_) => {
                for var in literal.variables() {
                    if !required.contains(&var) {
                        required.push(var);
                    }
                }
            }
        }
    }
    required.retain(|var| !limited.contains(var));
    required
}

/// Check if a rule is safe
pub fn check_rule_safety(rule: &Rule, config: &SafetyConfig) -> Result<(), SafetyError> {
    let variables = unlimited_variables(&rule.body, &rule.head.variables(), config);
    if variables.is_empty() {
        Ok(())
    } else {
        Err(SafetyError::UnsafeRule {
            rule: rule.to_string(),
            variables,
        })
    }
}

/// Check if all rules in a program are safe
pub fn check_program_safety(rules: &[Rule], config: &SafetyConfig) -> Result<(), SafetyError> {
    for rule in rules {
        check_rule_safety(rule, config)?;
    }
    Ok(())
}

/// Check if a query is safe. Every query variable is an answer column, so
/// all of them must be limited, including ones that occur only in negation.
pub fn check_query_safety(query: &Query, config: &SafetyConfig) -> Result<(), SafetyError> {
    let variables = unlimited_variables(&query.body, &query.variables(), config);
    if variables.is_empty() {
        Ok(())
    } else {
        Err(SafetyError::UnsafeQuery {
            query: query.to_string(),
            variables,
        })
    }
}

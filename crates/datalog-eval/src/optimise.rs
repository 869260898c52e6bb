//! Rule optimisers
//!
//! Rewrites of single rules that leave their meaning unchanged.

use crate::config::RuleOptimiser;
use datalog_ast::{Atom, Bindings, BuiltinAtom, Literal, Rule, Symbol, Term};
use std::collections::HashSet;

/// Apply `optimisers` to every rule, in order
pub fn optimise_rules(rules: &[Rule], optimisers: &[RuleOptimiser]) -> Vec<Rule> {
    rules
        .iter()
        .map(|rule| {
            optimisers
                .iter()
                .fold(rule.clone(), |rule, optimiser| match optimiser {
                    RuleOptimiser::RemoveDuplicateLiterals => remove_duplicate_literals(&rule),
                    RuleOptimiser::ReorderLiterals => reorder_literals(&rule),
                    RuleOptimiser::ReplaceVariablesWithConstants => {
                        replace_variables_with_constants(&rule)
                    }
                })
        })
        .collect()
}

/// Keep the first occurrence of each body literal
pub fn remove_duplicate_literals(rule: &Rule) -> Rule {
    let mut seen: HashSet<&Literal> = HashSet::new();
    let body = rule
        .body
        .iter()
        .filter(|literal| seen.insert(*literal))
        .cloned()
        .collect();
    Rule::new(rule.head.clone(), body)
}

/// Order positive literals so that each one shares a variable with those
/// before it where possible; the rest of the body follows in its original
/// order.
///
/// The first literal picked is the first one with a ground argument, or the
/// first positive literal if none has.
pub fn reorder_literals(rule: &Rule) -> Rule {
    let mut positives: Vec<&Literal> = rule.body.iter().filter(|l| l.is_positive()).collect();
    let others = rule.body.iter().filter(|l| !l.is_positive());
    let mut bound: HashSet<Symbol> = HashSet::new();
    let mut body = Vec::with_capacity(rule.body.len());

    while !positives.is_empty() {
        let next = if bound.is_empty() {
            positives
                .iter()
                .position(|l| l.terms().iter().any(|t| t.is_ground()))
                .unwrap_or(0)
        } else {
            positives
                .iter()
                .position(|l| l.variables().iter().any(|v| bound.contains(v)))
                .unwrap_or(0)
        };
        let literal = positives.remove(next);
        bound.extend(literal.variables());
        body.push(literal.clone());
    }
    body.extend(others.cloned());
    Rule::new(rule.head.clone(), body)
}

/// Drop each equality `?X = c` and put `c` in place of `?X` everywhere else
/// in the rule.
///
/// Only strings, IRIs and booleans are substituted. A numeric constant is
/// equal to values of other numeric types, and a literal holding it would
/// match them only structurally.
pub fn replace_variables_with_constants(rule: &Rule) -> Rule {
    let mut rule = rule.clone();
    while let Some((index, variable, constant)) = rule
        .body
        .iter()
        .enumerate()
        .find_map(|(index, literal)| fixed_variable(literal).map(|(v, c)| (index, v, c)))
    {
        rule.body.remove(index);
        let bindings: Bindings = [(variable, constant)].into_iter().collect();
        rule = substitute_rule(&rule, &bindings);
    }
    rule
}

fn fixed_variable(literal: &Literal) -> Option<(Symbol, Term)> {
    let Literal::BuiltIn(builtin) = literal else {
        return None;
    };
    if !builtin.kind.is_equality() {
        return None;
    }
    match builtin.terms.as_slice() {
        [Term::Variable(variable), constant @ Term::Constant(value)]
        | [constant @ Term::Constant(value), Term::Variable(variable)]
            if !value.is_numeric() =>
        {
            Some((*variable, constant.clone()))
        }
        _ => None,
    }
}

fn substitute_rule(rule: &Rule, bindings: &Bindings) -> Rule {
    let terms = |terms: &[Term]| -> Vec<Term> {
        terms.iter().map(|t| t.substitute(bindings)).collect()
    };
    let atom = |atom: &Atom| Atom {
        predicate: atom.predicate,
        terms: terms(&atom.terms),
    };
    let body = rule
        .body
        .iter()
        .map(|literal| match literal {
            Literal::Positive(a) => Literal::Positive(atom(a)),
            Literal::Negative(a) => Literal::Negative(atom(a)),
            Literal::BuiltIn(b) => Literal::BuiltIn(BuiltinAtom {
                kind: b.kind,
                terms: terms(&b.terms),
            }),
        })
        .collect();
    Rule::new(atom(&rule.head), body)
}

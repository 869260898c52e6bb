//! The magic-sets program transformation
//!
//! Bindings flow left to right through each body (the sideways information
//! passing strategy): an argument is bound if it is ground or all of its
//! variables occur in an earlier positive literal, in the bound part of the
//! head, or are computed by an earlier built-in. A built-in whose output a
//! later positive literal also binds does not pass that output on.

use crate::adornment::{binds_later_positive, builtin_evaluable, is_bound, Adornment};
use datalog_ast::{Atom, Literal, Predicate, Query, Rule, Symbol, Term};
use datalog_core::{Program, ProgramError};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Errors raised while rewriting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to build rewritten program: {0}")]
    Program(#[from] ProgramError),
}

/// A rewritten program together with the query to run against it
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub program: Program,
    pub query: Query,
}

/// Rewrite `program` for answering `query`.
///
/// Returns `Ok(None)` when the optimisation does not apply: the query has no
/// constant in a positive ordinary literal, or it does not mention a rule
/// head. The input program is never modified.
pub fn rewrite(program: &Program, query: &Query) -> Result<Option<Rewritten>, RewriteError> {
    let idb = program.idb_predicates();
    let positives = || {
        query.body.iter().filter_map(|literal| match literal {
            Literal::Positive(atom) => Some(atom),
            _ => None,
        })
    };
    let has_constant = positives().any(|atom| atom.terms.iter().any(Term::is_ground));
    let mentions_idb = positives().any(|atom| idb.contains(&atom.predicate));
    if !has_constant || !mentions_idb {
        debug!(query = %query, "magic sets not applicable");
        return Ok(None);
    }

    let mut rewriter = Rewriter::new(program, idb);
    let query_body = rewriter.rewrite_body(&query.body, HashSet::new(), Vec::new());
    rewriter.drain_worklist();
    rewriter.add_negation_dependencies();

    let mut rewritten = Program::new();
    for (predicate, relation) in program.facts().iter() {
        rewritten.add_relation(*predicate, relation)?;
    }
    for seed in rewriter.seeds {
        rewritten.add_fact(seed)?;
    }
    let rule_count = rewriter.rules.len();
    for rule in rewriter.rules {
        rewritten.add_rule(rule);
    }
    let query = Query::new(query_body);
    rewritten.add_query(query.clone());

    debug!(
        adorned = rewriter.done.len(),
        rules = rule_count,
        query = %query,
        "magic sets rewrite complete"
    );
    Ok(Some(Rewritten {
        program: rewritten,
        query,
    }))
}

struct Rewriter<'a> {
    program: &'a Program,
    idb: BTreeSet<Predicate>,
    rules_by_head: HashMap<Predicate, Vec<&'a Rule>>,
    rules: Vec<Rule>,
    seen_rules: HashSet<Rule>,
    seeds: Vec<Atom>,
    done: HashSet<(Predicate, Adornment)>,
    worklist: VecDeque<(Predicate, Adornment)>,
    /// Predicates read through negation; they keep their original rules
    negated: BTreeSet<Predicate>,
}

impl<'a> Rewriter<'a> {
    fn new(program: &'a Program, idb: BTreeSet<Predicate>) -> Self {
        let mut rules_by_head: HashMap<Predicate, Vec<&Rule>> = HashMap::new();
        for rule in program.rules() {
            rules_by_head.entry(rule.head.predicate).or_default().push(rule);
        }
        Rewriter {
            program,
            idb,
            rules_by_head,
            rules: Vec::new(),
            seen_rules: HashSet::new(),
            seeds: Vec::new(),
            done: HashSet::new(),
            worklist: VecDeque::new(),
            negated: BTreeSet::new(),
        }
    }

    fn push_rule(&mut self, rule: Rule) {
        if self.seen_rules.insert(rule.clone()) {
            self.rules.push(rule);
        }
    }

    fn schedule(&mut self, predicate: Predicate, adornment: Adornment) {
        if self.done.insert((predicate, adornment.clone())) {
            self.worklist.push_back((predicate, adornment));
        }
    }

    /// Record how bindings reach `head`: a seed fact when nothing precedes
    /// it, a magic rule otherwise
    fn add_magic(&mut self, head: Atom, prefix: &[Literal]) {
        match prefix {
            [] => self.seeds.push(head),
            // magic_p(X) :- magic_p(X). adds nothing
            [Literal::Positive(only)] if *only == head => {}
            _ => self.push_rule(Rule::new(head, prefix.to_vec())),
        }
    }

    /// Rewrite a body left to right.
    ///
    /// `prefix` holds the literals that can feed a magic rule at the current
    /// position; `bound` holds the variables they bind.
    fn rewrite_body(
        &mut self,
        body: &[Literal],
        mut bound: HashSet<Symbol>,
        mut prefix: Vec<Literal>,
    ) -> Vec<Literal> {
        let mut rewritten = prefix.clone();
        for (index, literal) in body.iter().enumerate() {
            match literal {
                Literal::Positive(atom) if self.idb.contains(&atom.predicate) => {
                    let adornment = Adornment::of(&atom.terms, &bound);
                    if adornment.has_bound() {
                        self.add_magic(adornment.magic_atom(atom), &prefix);
                    }
                    let adorned = Literal::Positive(Atom {
                        predicate: adornment.adorn(atom.predicate),
                        terms: atom.terms.clone(),
                    });
                    self.schedule(atom.predicate, adornment);
                    rewritten.push(adorned.clone());
                    prefix.push(adorned);
                    bound.extend(atom.variables());
                }
                Literal::Positive(atom) => {
                    rewritten.push(literal.clone());
                    prefix.push(literal.clone());
                    bound.extend(atom.variables());
                }
                Literal::Negative(atom) => {
                    self.negated.insert(atom.predicate);
                    rewritten.push(literal.clone());
                    if atom.terms.iter().all(|term| is_bound(term, &bound)) {
                        prefix.push(literal.clone());
                    }
                }
                Literal::BuiltIn(builtin) => {
                    rewritten.push(literal.clone());
                    if builtin_evaluable(builtin, &bound)
                        && !binds_later_positive(builtin, &bound, &body[index + 1..])
                    {
                        prefix.push(literal.clone());
                        bound.extend(literal.variables());
                    }
                }
            }
        }
        rewritten
    }

    fn drain_worklist(&mut self) {
        while let Some((predicate, adornment)) = self.worklist.pop_front() {
            let rules = self
                .rules_by_head
                .get(&predicate)
                .cloned()
                .unwrap_or_default();

            for rule in rules {
                let mut bound = HashSet::new();
                let mut prefix = Vec::new();
                if adornment.has_bound() {
                    for term in adornment.bound_terms(&rule.head.terms) {
                        let mut vars = Vec::new();
                        term.collect_variables(&mut vars);
                        bound.extend(vars);
                    }
                    prefix.push(Literal::Positive(adornment.magic_atom(&rule.head)));
                }
                let body = self.rewrite_body(&rule.body, bound, prefix);
                let head = Atom {
                    predicate: adornment.adorn(predicate),
                    terms: rule.head.terms.clone(),
                };
                self.push_rule(Rule::new(head, body));
            }

            // Stored facts of a rule-defined predicate flow into its adorned copy
            let has_facts = self
                .program
                .facts()
                .get(&predicate)
                .is_some_and(|relation| !relation.is_empty());
            if has_facts {
                let vars: Vec<Term> = (0..predicate.arity)
                    .map(|i| Term::var(&format!("V{}", i)))
                    .collect();
                let original = Atom {
                    predicate,
                    terms: vars.clone(),
                };
                let mut body = Vec::new();
                if adornment.has_bound() {
                    body.push(Literal::Positive(adornment.magic_atom(&original)));
                }
                body.push(Literal::Positive(original));
                let head = Atom {
                    predicate: adornment.adorn(predicate),
                    terms: vars,
                };
                self.push_rule(Rule::new(head, body));
            }
        }
    }

    /// Keep the original rules of every predicate read through negation,
    /// and of everything those rules depend on
    fn add_negation_dependencies(&mut self) {
        let mut pending: Vec<Predicate> = self.negated.iter().copied().collect();
        let mut visited: HashSet<Predicate> = HashSet::new();
        while let Some(predicate) = pending.pop() {
            if !visited.insert(predicate) {
                continue;
            }
            let rules = self
                .rules_by_head
                .get(&predicate)
                .cloned()
                .unwrap_or_default();
            for rule in rules {
                pending.extend(rule.body.iter().filter_map(|l| l.atom()).map(|a| a.predicate));
                self.push_rule(rule.clone());
            }
        }
    }
}

//! Datalog evaluation
//!
//! Stratified bottom-up evaluation: the program is stratified, checked for
//! safety, and each stratum is driven to its fixpoint before the next one
//! starts. Negated predicates always live in an earlier, finished stratum.
//!
//! # Example
//!
//! ```ignore
//! use datalog_eval::{evaluate_stratified, EvaluationConfig};
//!
//! let (relations, stats) = evaluate_stratified(&program, &EvaluationConfig::default())?;
//! println!("{} passes, {} facts derived", stats.iterations, stats.facts_derived);
//! ```

use crate::compiler::{CompiledRule, RuleInputs};
use crate::config::{EvaluationConfig, EvaluationTechnique};
use crate::error::EvaluationError;
use datalog_ast::{Predicate, Rule};
use datalog_core::{Program, Relation, RelationStore};
use datalog_safety::{check_program_safety, stratify};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use tracing::{debug, trace};

/// Statistics about one evaluation run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvaluationStats {
    /// Number of strata evaluated
    pub strata: usize,
    /// Number of fixed-point passes performed, over all strata
    pub iterations: usize,
    /// Total number of rule applications (one rule variant evaluated once = 1)
    pub rule_applications: usize,
    /// Number of new facts derived (not counting duplicates)
    pub facts_derived: usize,
}

impl EvaluationStats {
    pub(crate) fn absorb(&mut self, other: &EvaluationStats) {
        self.strata += other.strata;
        self.iterations += other.iterations;
        self.rule_applications += other.rule_applications;
        self.facts_derived += other.facts_derived;
    }
}

/// Where a stratified run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationPhase {
    Stratified { strata: usize },
    SafetyChecked,
    Evaluating { stratum: usize },
    Converged { stratum: usize },
    Done,
    Failed,
}

impl fmt::Display for EvaluationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationPhase::Stratified { strata } => write!(f, "stratified into {} strata", strata),
            EvaluationPhase::SafetyChecked => write!(f, "safety checked"),
            EvaluationPhase::Evaluating { stratum } => write!(f, "evaluating stratum {}", stratum),
            EvaluationPhase::Converged { stratum } => write!(f, "stratum {} converged", stratum),
            EvaluationPhase::Done => write!(f, "done"),
            EvaluationPhase::Failed => write!(f, "failed"),
        }
    }
}

fn enter(phase: EvaluationPhase) {
    debug!(%phase, "evaluation phase");
}

/// Compute the perfect model of `program`.
///
/// 1. Stratifies the rules (cycles through negation are rejected)
/// 2. Checks every rule for safety
/// 3. Evaluates each stratum to fixed point with the configured technique
///
/// Returns the program's facts together with everything derived.
pub fn evaluate_stratified(
    program: &Program,
    config: &EvaluationConfig,
) -> Result<(RelationStore, EvaluationStats), EvaluationError> {
    let result = run_stratified(program.rules(), program.facts().clone(), config);
    if result.is_err() {
        enter(EvaluationPhase::Failed);
    }
    result
}

fn run_stratified(
    rules: &[Rule],
    mut store: RelationStore,
    config: &EvaluationConfig,
) -> Result<(RelationStore, EvaluationStats), EvaluationError> {
    let stratification = stratify(rules)?;
    enter(EvaluationPhase::Stratified {
        strata: stratification.num_strata(),
    });

    check_program_safety(rules, &config.safety)?;
    enter(EvaluationPhase::SafetyChecked);

    let mut stats = EvaluationStats::default();
    for (index, stratum) in stratification.strata.iter().enumerate() {
        enter(EvaluationPhase::Evaluating { stratum: index });
        let compiled = compile_rules(&stratum.rules)?;
        let stratum_stats = fixpoint(&compiled, &mut store, None, config)?;
        stats.absorb(&stratum_stats);
        stats.strata += 1;
        enter(EvaluationPhase::Converged { stratum: index });
    }
    enter(EvaluationPhase::Done);
    Ok((store, stats))
}

pub(crate) fn compile_rules(rules: &[Rule]) -> Result<Vec<CompiledRule>, EvaluationError> {
    rules.iter().map(CompiledRule::compile).collect()
}

/// Drive `rules` to their least fixpoint over `store`.
///
/// Negated literals read `negative` when given, else `store` itself; they
/// must not refer to predicates derived by `rules` in the latter case.
pub(crate) fn fixpoint(
    rules: &[CompiledRule],
    store: &mut RelationStore,
    negative: Option<&RelationStore>,
    config: &EvaluationConfig,
) -> Result<EvaluationStats, EvaluationError> {
    match config.evaluation_technique {
        EvaluationTechnique::Naive => naive_fixpoint(rules, store, negative, config),
        EvaluationTechnique::SemiNaive => semi_naive_fixpoint(rules, store, negative, config),
    }
}

/// Naive evaluation: repeatedly apply all rules against all facts until
/// a pass adds nothing.
fn naive_fixpoint(
    rules: &[CompiledRule],
    store: &mut RelationStore,
    negative: Option<&RelationStore>,
    config: &EvaluationConfig,
) -> Result<EvaluationStats, EvaluationError> {
    let mut stats = EvaluationStats::default();
    loop {
        stats.iterations += 1;
        let mut derived = Vec::with_capacity(rules.len());
        {
            let inputs = inputs(store, negative);
            for rule in rules {
                stats.rule_applications += 1;
                derived.push((rule.head_predicate(), rule.execute(inputs, config)?));
            }
        }

        let added = add_derived(store, &derived);
        stats.facts_derived += added;
        trace!(pass = stats.iterations, added, "naive pass");
        check_limit(store, config)?;
        if added == 0 {
            return Ok(stats);
        }
    }
}

/// Semi-naive evaluation: after the first pass, each rule is evaluated once
/// per positive literal over a predicate of this rule set, with that literal
/// reading only the facts added by the previous pass.
fn semi_naive_fixpoint(
    rules: &[CompiledRule],
    store: &mut RelationStore,
    negative: Option<&RelationStore>,
    config: &EvaluationConfig,
) -> Result<EvaluationStats, EvaluationError> {
    let heads: FxHashSet<Predicate> = rules.iter().map(CompiledRule::head_predicate).collect();
    let mut stats = EvaluationStats::default();
    let mut delta: FxHashMap<Predicate, Relation> = FxHashMap::default();
    let mut first_iteration = true;

    loop {
        stats.iterations += 1;
        let mut derived = Vec::new();
        {
            let inputs = inputs(store, negative);
            for rule in rules {
                if first_iteration {
                    stats.rule_applications += 1;
                    derived.push((rule.head_predicate(), rule.execute(inputs, config)?));
                    continue;
                }
                for (step, predicate) in rule.positive_steps() {
                    if !heads.contains(&predicate) {
                        continue;
                    }
                    let Some(changes) = delta.get(&predicate) else {
                        continue;
                    };
                    stats.rule_applications += 1;
                    let result = rule.execute(inputs.with_delta(step, changes), config)?;
                    derived.push((rule.head_predicate(), result));
                }
            }
        }
        first_iteration = false;

        // Remember where each relation ends so the next delta is what this pass adds
        let marks: Vec<(Predicate, usize)> = heads
            .iter()
            .map(|p| (*p, store.get(p).map_or(0, Relation::len)))
            .collect();
        let added = add_derived(store, &derived);
        stats.facts_derived += added;
        check_limit(store, config)?;

        delta = marks
            .into_iter()
            .filter_map(|(predicate, mark)| {
                let relation = store.get(&predicate)?;
                let changes = relation.since(mark);
                (!changes.is_empty()).then(|| {
                    (
                        predicate,
                        Relation::from_tuples(predicate.arity, changes.iter().cloned()),
                    )
                })
            })
            .collect();
        trace!(
            pass = stats.iterations,
            added,
            delta_predicates = delta.len(),
            "semi-naive pass"
        );
        if delta.is_empty() {
            return Ok(stats);
        }
    }
}

fn inputs<'a>(store: &'a RelationStore, negative: Option<&'a RelationStore>) -> RuleInputs<'a> {
    RuleInputs {
        negative: negative.unwrap_or(store),
        ..RuleInputs::new(store)
    }
}

fn add_derived(store: &mut RelationStore, derived: &[(Predicate, Relation)]) -> usize {
    derived
        .iter()
        .filter(|(_, relation)| !relation.is_empty())
        .map(|(predicate, relation)| store.add_all(*predicate, relation))
        .sum()
}

fn check_limit(store: &RelationStore, config: &EvaluationConfig) -> Result<(), EvaluationError> {
    let size = store.total_tuples();
    if config.max_tuples > 0 && size > config.max_tuples {
        return Err(EvaluationError::TupleLimitExceeded {
            limit: config.max_tuples,
            size,
        });
    }
    Ok(())
}

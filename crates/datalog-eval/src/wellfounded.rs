//! Well-founded evaluation by alternating fixpoint
//!
//! `Γ(J)` is the least model of the rules when every negated literal is
//! read against the fixed interpretation `J`. Starting from the facts,
//! `U = Γ(K)` overestimates and `K' = Γ(U)` underestimates the model; `K`
//! grows until it stops changing. Facts in `K` are true, facts in `U` but
//! not in `K` are undefined.

use crate::compiler::CompiledRule;
use crate::config::EvaluationConfig;
use crate::error::EvaluationError;
use crate::evaluation::{compile_rules, fixpoint, EvaluationStats};
use datalog_algebra::difference;
use datalog_core::{Program, RelationStore};
use datalog_safety::check_program_safety;
use tracing::debug;

/// True and undefined facts of the well-founded model
#[derive(Debug, Clone, Default)]
pub struct WellFoundedModel {
    pub true_facts: RelationStore,
    pub undefined: RelationStore,
    pub stats: EvaluationStats,
}

/// Compute the well-founded model of `program`. Stratification is not
/// required; safety is.
pub fn evaluate_well_founded(
    program: &Program,
    config: &EvaluationConfig,
) -> Result<WellFoundedModel, EvaluationError> {
    check_program_safety(program.rules(), &config.safety)?;
    let rules = compile_rules(program.rules())?;
    let mut stats = EvaluationStats::default();

    let mut known = program.facts().clone();
    let mut round = 0;
    loop {
        round += 1;
        let possible = gamma(&rules, program, &known, config, &mut stats)?;
        let next = gamma(&rules, program, &possible, config, &mut stats)?;
        let converged = next.total_tuples() == known.total_tuples();
        debug!(
            round,
            known = next.total_tuples(),
            possible = possible.total_tuples(),
            "alternating fixpoint round"
        );
        known = next;
        if converged {
            let undefined = subtract(&possible, &known)?;
            return Ok(WellFoundedModel {
                true_facts: known,
                undefined,
                stats,
            });
        }
    }
}

fn gamma(
    rules: &[CompiledRule],
    program: &Program,
    interpretation: &RelationStore,
    config: &EvaluationConfig,
    stats: &mut EvaluationStats,
) -> Result<RelationStore, EvaluationError> {
    let mut store = program.facts().clone();
    let run = fixpoint(rules, &mut store, Some(interpretation), config)?;
    stats.absorb(&run);
    Ok(store)
}

fn subtract(
    possible: &RelationStore,
    known: &RelationStore,
) -> Result<RelationStore, EvaluationError> {
    let mut result = RelationStore::new();
    for (predicate, relation) in possible.iter() {
        let rest = match known.get(predicate) {
            Some(true_part) => difference(relation, true_part)?,
            None => relation.clone(),
        };
        if !rest.is_empty() {
            result.add_all(*predicate, &rest);
        }
    }
    Ok(result)
}

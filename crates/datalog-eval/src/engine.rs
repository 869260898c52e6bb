//! Engine facade
//!
//! ```ignore
//! let engine = Engine::new(EvaluationConfig::default().with_magic_sets());
//! let answers = engine.execute(&program, &query)?;
//! ```

use crate::config::{EvaluationConfig, EvaluationStrategy};
use crate::error::EvaluationError;
use crate::evaluation::evaluate_stratified;
use crate::optimise::optimise_rules;
use crate::query::{Model, QueryResult};
use crate::wellfounded::evaluate_well_founded;
use datalog_ast::Query;
use datalog_core::{Program, RelationStore};
use datalog_magic::rewrite;
use std::borrow::Cow;
use tracing::debug;

/// Evaluates programs under one configuration
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EvaluationConfig,
}

impl Engine {
    pub fn new(config: EvaluationConfig) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate `program` to its model under the configured strategy
    pub fn evaluate(&self, program: &Program) -> Result<Model, EvaluationError> {
        let program = self.optimise(program);
        match self.config.evaluation_strategy {
            EvaluationStrategy::Stratified => {
                let (relations, stats) = evaluate_stratified(&program, &self.config)?;
                Ok(Model::new(
                    relations,
                    RelationStore::new(),
                    stats,
                    self.config.clone(),
                ))
            }
            EvaluationStrategy::WellFounded => {
                let model = evaluate_well_founded(&program, &self.config)?;
                Ok(Model::new(
                    model.true_facts,
                    model.undefined,
                    model.stats,
                    self.config.clone(),
                ))
            }
        }
    }

    /// Answer one query.
    ///
    /// With magic sets enabled (stratified strategy only) the program is
    /// rewritten for this query first; if the rewrite does not apply, the
    /// original program is evaluated.
    pub fn execute(&self, program: &Program, query: &Query) -> Result<QueryResult, EvaluationError> {
        if self.config.uses_magic_sets()
            && self.config.evaluation_strategy == EvaluationStrategy::Stratified
        {
            if let Some(rewritten) = rewrite(program, query)? {
                debug!(
                    %query,
                    rules = rewritten.program.rules().len(),
                    "evaluating magic-sets program"
                );
                let model = self.evaluate(&rewritten.program)?;
                let mut result = model.execute(&rewritten.query)?;
                // Report the original query's variables
                result.variables = query.variables();
                return Ok(result);
            }
            debug!(%query, "magic sets not applicable");
        }
        self.evaluate(program)?.execute(query)
    }

    /// Evaluate `program` once and answer every query it carries
    pub fn execute_program(&self, program: &Program) -> Result<Vec<QueryResult>, EvaluationError> {
        if self.config.uses_magic_sets() {
            return program
                .queries()
                .iter()
                .map(|query| self.execute(program, query))
                .collect();
        }
        self.evaluate(program)?.execute_all(program.queries())
    }

    fn optimise<'a>(&self, program: &'a Program) -> Cow<'a, Program> {
        if self.config.rule_optimisers.is_empty() {
            return Cow::Borrowed(program);
        }
        let rules = optimise_rules(program.rules(), &self.config.rule_optimisers);
        Cow::Owned(program.with_rules(rules))
    }
}

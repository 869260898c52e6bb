//! Evaluation configuration
//!
//! Every field has a default, so a JSON document only needs the keys it
//! changes:
//!
//! ```ignore
//! let config = EvaluationConfig::from_json_str(r#"{
//!     "evaluation-technique": "naive",
//!     "program-optimisers": ["magic-sets"],
//!     "max-tuples": 100000
//! }"#)?;
//! ```

use datalog_safety::SafetyConfig;
use serde::{Deserialize, Serialize};

/// How each stratum is driven to its fixpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationTechnique {
    /// Re-evaluate every rule against all facts on every pass
    Naive,
    /// After the first pass, only evaluate derivations that use a fact from
    /// the previous pass
    #[default]
    SemiNaive,
}

/// Which model is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationStrategy {
    /// Perfect model of a stratified program
    #[default]
    Stratified,
    /// Well-founded model; programs need not be stratified
    WellFounded,
}

/// Whole-program rewrites applied before evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramOptimiser {
    MagicSets,
}

/// Per-rule rewrites applied before compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleOptimiser {
    /// Drop literals that occur more than once in a body
    RemoveDuplicateLiterals,
    /// Join positive literals that share variables with earlier ones first
    ReorderLiterals,
    /// Substitute `c` for `?X` when the body holds `?X = c` and `c` is not
    /// numeric
    ReplaceVariablesWithConstants,
}

/// What happens when a built-in divides by zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DivideByZeroBehaviour {
    /// The built-in fails for that binding
    #[default]
    Discard,
    /// Evaluation aborts with an error
    Stop,
}

/// Configuration for one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EvaluationConfig {
    pub evaluation_technique: EvaluationTechnique,
    pub evaluation_strategy: EvaluationStrategy,
    pub program_optimisers: Vec<ProgramOptimiser>,
    pub rule_optimisers: Vec<RuleOptimiser>,
    pub safety: SafetyConfig,
    pub divide_by_zero: DivideByZeroBehaviour,
    /// Abort once the model holds more tuples than this; 0 means no limit
    pub max_tuples: usize,
    /// Run the queries of a program on the rayon thread pool
    pub parallel_queries: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            evaluation_technique: EvaluationTechnique::SemiNaive,
            evaluation_strategy: EvaluationStrategy::Stratified,
            program_optimisers: Vec::new(),
            rule_optimisers: Vec::new(),
            safety: SafetyConfig::default(),
            divide_by_zero: DivideByZeroBehaviour::Discard,
            max_tuples: 0,
            parallel_queries: false,
        }
    }
}

/// Invalid configuration document
#[derive(Debug, thiserror::Error)]
#[error("invalid evaluation config: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

impl EvaluationConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn naive() -> Self {
        EvaluationConfig {
            evaluation_technique: EvaluationTechnique::Naive,
            ..Self::default()
        }
    }

    pub fn with_magic_sets(mut self) -> Self {
        if !self.uses_magic_sets() {
            self.program_optimisers.push(ProgramOptimiser::MagicSets);
        }
        self
    }

    pub fn uses_magic_sets(&self) -> bool {
        self.program_optimisers.contains(&ProgramOptimiser::MagicSets)
    }
}

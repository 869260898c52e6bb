pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod optimise;
pub mod query;
pub mod wellfounded;

// Re-export the engine facade
pub use engine::Engine;

// Re-export configuration
pub use config::{
    ConfigError, DivideByZeroBehaviour, EvaluationConfig, EvaluationStrategy,
    EvaluationTechnique, ProgramOptimiser, RuleOptimiser,
};

pub use error::EvaluationError;

// Re-export evaluation
pub use compiler::{CompiledRule, RuleInputs};
pub use evaluation::{evaluate_stratified, EvaluationPhase, EvaluationStats};
pub use optimise::{
    optimise_rules, remove_duplicate_literals, reorder_literals, replace_variables_with_constants,
};
pub use wellfounded::{evaluate_well_founded, WellFoundedModel};

// Re-export query
pub use query::{Model, QueryResult};

pub mod safety;
pub mod stratification;

pub use safety::{
    check_program_safety, check_query_safety, check_rule_safety, limited_variables, SafetyConfig,
    SafetyError,
};
pub use stratification::{stratify, Stratification, StratificationError, Stratum};

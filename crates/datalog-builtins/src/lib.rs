mod builtins;

pub use builtins::{can_evaluate, evaluate, BuiltinOutcome};

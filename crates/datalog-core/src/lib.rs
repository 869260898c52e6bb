pub mod program;
pub mod relation;

pub use program::{Program, ProgramError};
pub use relation::{ArityMismatch, Relation, RelationStore};

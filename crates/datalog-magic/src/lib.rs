//! Magic-sets rewriting
//!
//! Rewrites a program so that bottom-up evaluation only derives facts
//! relevant to one query. Rule-defined predicates reached through positive
//! literals are specialised per binding pattern (`path^bf`), and *magic*
//! predicates (`magic_path^bf`) collect the bindings each specialisation is
//! asked for.
//!
//! # Example
//!
//! ```ignore
//! // ?- path(1, ?Y).
//! if let Some(rewritten) = rewrite(&program, &query)? {
//!     let model = engine.evaluate(&rewritten.program)?;
//!     let answers = model.execute(&rewritten.query)?;
//! }
//! ```
//!
//! Predicates read through negation are not specialised; their original
//! rules are kept, together with the rules of everything they depend on.

mod adornment;
mod rewrite;

pub use adornment::{Adornment, MAGIC_PREFIX};
pub use rewrite::{rewrite, RewriteError, Rewritten};

//! Cross-crate evaluation tests
//!
//! Scenario tests run small programs end to end through the engine.
//! Property-based tests generate random graphs and check that naive,
//! semi-naive, magic-sets and well-founded evaluation agree.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod proptest_equivalence;

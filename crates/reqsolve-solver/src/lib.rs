//! The search driver.
//!
//! Drives one audit: pull candidate solutions lazily from a loaded rule
//! tree, audit each against a fresh claim ledger, keep the best-ranked
//! result, and stop on the first fully passing one.

mod solve;

pub use solve::{estimate, find_best_solution, Audit, SolveOutcome};

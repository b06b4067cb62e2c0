//! reqsolve-core - Core types for the degree-audit constraint engine
//!
//! This crate provides the fundamental abstractions under the rule engine:
//! - The clause predicate language and its value coercion rules
//! - Transcript data items (course instances, area pointers)
//! - Limits, which cap combinatorial blow-up during enumeration
//! - The per-audit claim ledger with multicountable overrides
//! - Rank arithmetic for comparing audit results

pub mod claim;
pub mod clause;
pub mod combinatorics;
pub mod constants;
pub mod context;
pub mod data;
pub mod exception;
pub mod limit;
pub mod path;
pub mod rank;
pub mod value;

pub use claim::{Claim, ClaimAttempt};
pub use clause::{Clausable, Clause, ClauseKey, Operator, Predicate};
pub use constants::Constants;
pub use context::{ClaimSnapshot, MulticountableSet, RequirementContext};
pub use data::{AreaKind, AreaPointer, AreaStatus, CourseInstance, Grade};
pub use exception::Exception;
pub use limit::{Limit, LimitSet};
pub use path::{ReqPath, RulePath};
pub use rank::Rank;
pub use value::Value;

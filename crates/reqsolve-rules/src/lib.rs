//! Rule trees, solution enumeration, and auditing.
//!
//! This crate layers the requirement language on top of
//! [`reqsolve_core`]: loading YAML specifications into validated
//! [`Rule`] trees, lazily enumerating candidate [`Solution`]s, and
//! auditing solutions into ranked [`RuleResult`]s.
//!
//! The three type families mirror each other variant-for-variant: a
//! `Rule` is the static specification, a `Solution` is one concrete
//! binding of transcript items to it, and a `RuleResult` is that binding
//! after claims were attempted and assertions resolved.

pub mod aggregate;
pub mod load;
pub mod result;
pub mod rule;
pub mod solution;

mod stream;

pub use aggregate::AggregateKey;
pub use load::{load_multicountable, SpecError, SpecLoader};
pub use result::{
    AssertionResult, CountItemResult, CountResult, CourseResult, QueryResult, ReferenceResult,
    RequirementResult, RuleResult,
};
pub use rule::{
    AssertionRule, CountRule, CourseRule, QueryRule, QuerySource, ReferenceRule, RepeatMode,
    RequirementRule, Rule, SolutionStream,
};
pub use solution::{
    AssertionSolution, CountItem, CountSolution, CourseSolution, QueryOutput, QuerySolution,
    ReferenceSolution, RequirementSolution, Solution,
};

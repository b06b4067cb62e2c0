//! The validated rule tree.
//!
//! A [`Rule`] is the static specification of one requirement node: no
//! transcript data bound, no claims made. Each variant knows how to
//! enumerate its own candidate [`Solution`](crate::solution::Solution)s
//! lazily and how to estimate that count without materializing it.

mod assertion;
mod count;
mod course;
mod query;
mod requirement;

pub use assertion::AssertionRule;
pub use count::CountRule;
pub(crate) use count::shaped_max;
pub use course::CourseRule;
pub use query::{QueryRule, QuerySource, RepeatMode};
pub use requirement::{ReferenceRule, RequirementRule};

use serde::Serialize;

use reqsolve_core::{Rank, RequirementContext, RulePath};

use crate::load::SpecError;
use crate::solution::Solution;

/// A lazy stream of candidate solutions.
pub type SolutionStream<'a> = Box<dyn Iterator<Item = Solution> + 'a>;

/// One node of a validated requirement specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Rule {
    Course(CourseRule),
    Count(CountRule),
    Query(QueryRule),
    Requirement(RequirementRule),
    Reference(ReferenceRule),
    Assertion(AssertionRule),
}

impl Rule {
    pub fn path(&self) -> &RulePath {
        match self {
            Rule::Course(r) => &r.path,
            Rule::Count(r) => &r.path,
            Rule::Query(r) => &r.path,
            Rule::Requirement(r) => &r.path,
            Rule::Reference(r) => &r.path,
            Rule::Assertion(r) => &r.path,
        }
    }

    /// Lazily enumerates this rule's candidate solutions against the
    /// context's transcript. Nothing is claimed during enumeration.
    pub fn solutions<'a>(&'a self, ctx: &'a RequirementContext) -> SolutionStream<'a> {
        match self {
            Rule::Course(r) => r.solutions(ctx),
            Rule::Count(r) => r.solutions(ctx),
            Rule::Query(r) => r.solutions(ctx),
            Rule::Requirement(r) => r.solutions(ctx),
            Rule::Reference(r) => r.solutions(ctx),
            Rule::Assertion(r) => r.solutions(ctx),
        }
    }

    /// Upper bound on the number of solutions [`Rule::solutions`] would
    /// yield, computed combinatorially without enumerating.
    pub fn estimate(&self, ctx: &RequirementContext) -> u64 {
        match self {
            Rule::Course(r) => r.estimate(ctx),
            Rule::Count(r) => r.estimate(ctx),
            Rule::Query(r) => r.estimate(ctx),
            Rule::Requirement(r) => r.estimate(ctx),
            Rule::Reference(r) => r.estimate(ctx),
            Rule::Assertion(_) => 1,
        }
    }

    /// The best possible rank any solution of this rule could audit to.
    pub fn max_rank(&self) -> Rank {
        match self {
            Rule::Course(_) => Rank::ONE,
            Rule::Count(r) => r.max_rank(),
            Rule::Query(r) => r.max_rank(),
            Rule::Requirement(r) => r.max_rank(),
            Rule::Reference(r) => r.requirement.max_rank(),
            Rule::Assertion(r) => r.max_rank(),
        }
    }

    /// Re-checks structural invariants.
    ///
    /// The loader validates once per tree before any audit; calling this
    /// again on an already-validated tree is a no-op (no state changes, no
    /// error).
    pub fn validate(&self) -> Result<(), SpecError> {
        match self {
            Rule::Course(r) => r.validate(),
            Rule::Count(r) => {
                r.validate()?;
                for item in &r.items {
                    item.validate()?;
                }
                Ok(())
            }
            Rule::Query(r) => r.validate(),
            Rule::Requirement(r) => match &r.result {
                Some(inner) => inner.validate(),
                None => Ok(()),
            },
            Rule::Reference(r) => match &r.requirement.result {
                Some(inner) => inner.validate(),
                None => Ok(()),
            },
            Rule::Assertion(_) => Ok(()),
        }
    }
}

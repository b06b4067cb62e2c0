//! Audited results.
//!
//! A [`RuleResult`] mirrors the rule tree it came from, with claim
//! attempts and resolved assertions attached. Results are pure data: all
//! ledger interaction happened during [`Solution::audit`]
//! (crate::solution::Solution::audit), so a result can be ranked,
//! serialized, and compared without a context.

use rust_decimal::Decimal;
use serde::Serialize;

use reqsolve_core::{Claim, ClaimAttempt, CourseInstance, Operator, Rank, RulePath};

use crate::aggregate::AggregateKey;
use crate::rule::{shaped_max, Rule};
use crate::solution::QueryOutput;

/// The audited counterpart of one rule node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleResult {
    Course(CourseResult),
    Count(CountResult),
    Query(QueryResult),
    Requirement(RequirementResult),
    Reference(ReferenceResult),
    Assertion(AssertionResult),
}

impl RuleResult {
    /// Whether this node is satisfied.
    pub fn ok(&self) -> bool {
        match self {
            RuleResult::Course(r) => r.ok(),
            RuleResult::Count(r) => r.ok(),
            RuleResult::Query(r) => r.ok(),
            RuleResult::Requirement(r) => r.ok(),
            RuleResult::Reference(r) => r.inner.ok(),
            RuleResult::Assertion(r) => r.ok,
        }
    }

    /// Banked progress toward [`RuleResult::max_rank`]. A satisfied node
    /// always ranks at its maximum.
    pub fn rank(&self) -> Rank {
        match self {
            RuleResult::Course(r) => r.rank(),
            RuleResult::Count(r) => r.rank(),
            RuleResult::Query(r) => r.rank(),
            RuleResult::Requirement(r) => r.rank(),
            RuleResult::Reference(r) => r.inner.rank(),
            RuleResult::Assertion(r) => r.rank(),
        }
    }

    pub fn max_rank(&self) -> Rank {
        match self {
            RuleResult::Course(_) => Rank::ONE,
            RuleResult::Count(r) => r.max_rank(),
            RuleResult::Query(r) => r.max_rank(),
            RuleResult::Requirement(r) => r.max_rank(),
            RuleResult::Reference(r) => r.inner.max_rank(),
            RuleResult::Assertion(r) => r.max_rank(),
        }
    }

    /// Every successful claim made beneath this node, in audit order.
    pub fn claims(&self) -> Vec<Claim> {
        match self {
            RuleResult::Course(r) => r.claims(),
            RuleResult::Count(r) => r.claims(),
            RuleResult::Query(r) => r.claims(),
            RuleResult::Requirement(r) => match &r.inner {
                Some(inner) => inner.claims(),
                None => Vec::new(),
            },
            RuleResult::Reference(r) => r.inner.claims(),
            RuleResult::Assertion(_) => Vec::new(),
        }
    }

    pub fn path(&self) -> &RulePath {
        match self {
            RuleResult::Course(r) => &r.path,
            RuleResult::Count(r) => &r.path,
            RuleResult::Query(r) => &r.path,
            RuleResult::Requirement(r) => &r.path,
            RuleResult::Reference(r) => &r.path,
            RuleResult::Assertion(r) => &r.path,
        }
    }
}

/// A course rule after matching and claiming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseResult {
    pub path: RulePath,
    pub course: String,
    pub matched: Option<CourseInstance>,
    pub claim_attempt: Option<ClaimAttempt>,
    pub overridden: bool,
}

impl CourseResult {
    pub fn ok(&self) -> bool {
        if self.overridden {
            return true;
        }
        matches!(&self.claim_attempt, Some(attempt) if attempt.ok())
    }

    fn rank(&self) -> Rank {
        if self.ok() {
            Rank::ONE
        } else {
            Rank::ZERO
        }
    }

    fn claims(&self) -> Vec<Claim> {
        match &self.claim_attempt {
            Some(attempt) if attempt.ok() => vec![attempt.claim.clone()],
            _ => Vec::new(),
        }
    }
}

/// One child slot of an audited count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountItemResult {
    Audited(RuleResult),
    Skipped(Rule),
}

impl CountItemResult {
    fn max_rank(&self) -> Rank {
        match self {
            CountItemResult::Audited(result) => result.max_rank(),
            CountItemResult::Skipped(rule) => rule.max_rank(),
        }
    }
}

/// A count rule after auditing its chosen children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountResult {
    pub path: RulePath,
    pub count: usize,
    pub at_most: bool,
    pub items: Vec<CountItemResult>,
    pub assertions: Vec<AssertionResult>,
    pub overridden: bool,
}

impl CountResult {
    fn ok_children(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, CountItemResult::Audited(r) if r.ok()))
            .count()
    }

    pub fn ok(&self) -> bool {
        if self.overridden {
            return true;
        }
        self.ok_children() >= self.count && self.assertions.iter().all(|a| a.ok)
    }

    fn rank(&self) -> Rank {
        if self.overridden {
            return self.max_rank();
        }
        let children: Rank = self
            .items
            .iter()
            .filter_map(|item| match item {
                CountItemResult::Audited(result) => Some(result.rank()),
                CountItemResult::Skipped(_) => None,
            })
            .sum();
        let assertions: Rank = self.assertions.iter().map(|a| a.rank()).sum();
        children + assertions
    }

    fn max_rank(&self) -> Rank {
        let mut child_maxes: Vec<Rank> = self.items.iter().map(|item| item.max_rank()).collect();
        let assertions: Rank = self.assertions.iter().map(|a| a.max_rank()).sum();
        shaped_max(self.count, &mut child_maxes) + assertions
    }

    fn claims(&self) -> Vec<Claim> {
        self.items
            .iter()
            .filter_map(|item| match item {
                CountItemResult::Audited(result) => Some(result.claims()),
                CountItemResult::Skipped(_) => None,
            })
            .flatten()
            .collect()
    }
}

/// A query rule after claiming its output and resolving its assertions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub path: RulePath,
    pub claim: bool,
    pub output: QueryOutput,
    pub claim_attempts: Vec<ClaimAttempt>,
    pub assertions: Vec<AssertionResult>,
    pub overridden: bool,
}

impl QueryResult {
    pub fn ok(&self) -> bool {
        self.overridden || self.assertions.iter().all(|a| a.ok)
    }

    fn rank(&self) -> Rank {
        if self.overridden {
            return self.max_rank();
        }
        self.assertions.iter().map(|a| a.rank()).sum()
    }

    fn max_rank(&self) -> Rank {
        self.assertions.iter().map(|a| a.max_rank()).sum()
    }

    fn claims(&self) -> Vec<Claim> {
        self.claim_attempts
            .iter()
            .filter(|attempt| attempt.ok())
            .map(|attempt| attempt.claim.clone())
            .collect()
    }
}

/// A named requirement after auditing its inner result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementResult {
    pub path: RulePath,
    pub name: String,
    pub audited: bool,
    pub inner: Option<Box<RuleResult>>,
    pub overridden: bool,
}

impl RequirementResult {
    pub fn ok(&self) -> bool {
        if self.overridden {
            return true;
        }
        match &self.inner {
            Some(inner) => inner.ok(),
            // No inner result: audited externally, or declared empty.
            None => true,
        }
    }

    fn rank(&self) -> Rank {
        if self.overridden {
            return self.max_rank();
        }
        match &self.inner {
            Some(inner) => inner.rank(),
            None => Rank::ONE,
        }
    }

    fn max_rank(&self) -> Rank {
        match &self.inner {
            Some(inner) => inner.max_rank(),
            None => Rank::ONE,
        }
    }
}

/// A reference, carrying its requirement's audited result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceResult {
    pub path: RulePath,
    pub name: String,
    pub inner: Box<RuleResult>,
}

/// One resolved assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionResult {
    pub path: RulePath,
    pub key: AggregateKey,
    pub operator: Operator,
    pub expected: Decimal,
    pub resolved: Decimal,
    pub ok: bool,
    pub overridden: bool,
}

impl AssertionResult {
    /// Progress toward the bound: the full bound when satisfied, otherwise
    /// the resolved value clamped into `0..=expected`.
    pub fn rank(&self) -> Rank {
        if self.ok {
            return self.max_rank();
        }
        let clamped = self.resolved.max(Decimal::ZERO).min(self.expected);
        Rank::from_decimal(clamped.max(Decimal::ZERO))
    }

    pub fn max_rank(&self) -> Rank {
        Rank::from_decimal(self.expected.max(Decimal::ZERO))
    }
}

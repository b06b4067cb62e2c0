//! Assertion rules: aggregate-and-compare.
//!
//! Assertions are not enumerated on their own; the enclosing query or
//! count resolves them in place while computing a result, applying the
//! aggregation to the successfully claimed items and comparing against the
//! bound.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use reqsolve_core::{Clause, CourseInstance, Operator, Rank, RequirementContext, RulePath};

use crate::aggregate::AggregateKey;
use crate::result::AssertionResult;
use crate::rule::SolutionStream;
use crate::solution::{AssertionSolution, Solution};

/// One `aggregate operator bound` assertion, optionally over a filtered
/// subset of the claimed items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionRule {
    pub path: RulePath,
    pub key: AggregateKey,
    pub operator: Operator,
    pub expected: Decimal,
    pub where_: Option<Clause>,
}

impl AssertionRule {
    pub fn new(path: RulePath, key: AggregateKey, operator: Operator, expected: Decimal) -> Self {
        AssertionRule {
            path,
            key,
            operator,
            expected,
            where_: None,
        }
    }

    pub fn with_where(mut self, clause: Clause) -> Self {
        self.where_ = Some(clause);
        self
    }

    /// If this assertion is a plain numeric bound on the number of course
    /// lines, returns the operator and bound so subset enumeration can
    /// prune sizes that could never satisfy it.
    ///
    /// A `where` filter disqualifies the assertion: the counted set would
    /// no longer be the enumerated set.
    pub fn count_bound(&self) -> Option<(Operator, usize)> {
        if !self.key.is_course_count() || self.where_.is_some() {
            return None;
        }
        if !matches!(
            self.operator,
            Operator::GreaterThanOrEqualTo | Operator::LessThanOrEqualTo | Operator::EqualTo
        ) {
            return None;
        }
        if self.expected.fract() != Decimal::ZERO || self.expected < Decimal::ZERO {
            return None;
        }
        let bound = self.expected.to_u64()?;
        Some((self.operator, bound as usize))
    }

    /// Resolves this assertion over a set of successfully claimed courses.
    pub fn resolve(&self, courses: &[&CourseInstance], ctx: &RequirementContext) -> AssertionResult {
        let filtered: Vec<&CourseInstance> = match &self.where_ {
            Some(clause) => courses
                .iter()
                .copied()
                .filter(|c| clause.apply(*c))
                .collect(),
            None => courses.to_vec(),
        };
        self.finish(self.key.apply(&filtered), ctx)
    }

    /// Resolves this assertion over a bare item count (area queries, where
    /// only counting is meaningful).
    pub fn resolve_len(&self, len: usize, ctx: &RequirementContext) -> AssertionResult {
        self.finish(Decimal::from(len), ctx)
    }

    fn finish(&self, resolved: Decimal, ctx: &RequirementContext) -> AssertionResult {
        let (resolved, overridden) = match ctx.value_override_at(&self.path) {
            Some(value) => (value, true),
            None => (resolved, false),
        };
        let ok = self.holds(resolved);
        AssertionResult {
            path: self.path.clone(),
            key: self.key,
            operator: self.operator,
            expected: self.expected,
            resolved,
            ok,
            overridden,
        }
    }

    fn holds(&self, resolved: Decimal) -> bool {
        let ordering = resolved.cmp(&self.expected);
        match self.operator {
            Operator::LessThan => ordering == Ordering::Less,
            Operator::LessThanOrEqualTo => ordering != Ordering::Greater,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqualTo => ordering != Ordering::Less,
            Operator::EqualTo => ordering == Ordering::Equal,
            Operator::NotEqualTo => ordering != Ordering::Equal,
            // Membership operators never apply to aggregates.
            Operator::In | Operator::NotIn => false,
        }
    }

    pub fn max_rank(&self) -> Rank {
        Rank::from_decimal(self.expected.max(Decimal::ZERO))
    }

    /// A standalone assertion resolves against the whole transcript.
    pub fn solutions<'a>(&'a self, _ctx: &'a RequirementContext) -> SolutionStream<'a> {
        Box::new(std::iter::once(Solution::Assertion(AssertionSolution {
            rule: self.clone(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqsolve_core::ClauseKey;

    fn assertion(key: AggregateKey, operator: Operator, expected: i64) -> AssertionRule {
        AssertionRule::new(RulePath::root(), key, operator, Decimal::from(expected))
    }

    fn ctx(courses: Vec<CourseInstance>) -> RequirementContext {
        RequirementContext::new(courses, vec![])
    }

    #[test]
    fn test_count_bound_detection() {
        let simple = assertion(AggregateKey::CountCourses, Operator::GreaterThanOrEqualTo, 2);
        assert_eq!(
            simple.count_bound(),
            Some((Operator::GreaterThanOrEqualTo, 2))
        );

        let not_count = assertion(AggregateKey::SumCredits, Operator::GreaterThanOrEqualTo, 2);
        assert_eq!(not_count.count_bound(), None);

        let strict = assertion(AggregateKey::CountCourses, Operator::GreaterThan, 2);
        assert_eq!(strict.count_bound(), None);

        let filtered = assertion(AggregateKey::CountCourses, Operator::EqualTo, 2).with_where(
            Clause::single(ClauseKey::Subject, Operator::EqualTo, "CSCI"),
        );
        assert_eq!(filtered.count_bound(), None);
    }

    #[test]
    fn test_resolve_count() {
        let a = CourseInstance::new("1", "x1", "CSCI", "251");
        let b = CourseInstance::new("2", "x2", "CSCI", "252");
        let context = ctx(vec![]);
        let rule = assertion(AggregateKey::CountCourses, Operator::GreaterThanOrEqualTo, 2);

        let result = rule.resolve(&[&a, &b], &context);
        assert!(result.ok);
        assert_eq!(result.resolved, Decimal::from(2));

        let result = rule.resolve(&[&a], &context);
        assert!(!result.ok);
        assert_eq!(result.resolved, Decimal::ONE);
    }

    #[test]
    fn test_resolve_with_where_filter() {
        let a = CourseInstance::new("1", "x1", "CSCI", "251");
        let b = CourseInstance::new("2", "x2", "ART", "102");
        let context = ctx(vec![]);
        let rule = assertion(AggregateKey::CountCourses, Operator::EqualTo, 1).with_where(
            Clause::single(ClauseKey::Subject, Operator::EqualTo, "CSCI"),
        );
        let result = rule.resolve(&[&a, &b], &context);
        assert!(result.ok);
    }

    #[test]
    fn test_value_override() {
        use reqsolve_core::Exception;

        let rule = assertion(AggregateKey::CountCourses, Operator::GreaterThanOrEqualTo, 3);
        let context = RequirementContext::new(vec![], vec![]).with_exceptions(vec![
            Exception::Value {
                path: rule.path.clone(),
                value: Decimal::from(3),
            },
        ]);
        let result = rule.resolve(&[], &context);
        assert!(result.ok);
        assert!(result.overridden);
        assert_eq!(result.resolved, Decimal::from(3));
    }

    #[test]
    fn test_rank_is_clamped_progress() {
        let context = ctx(vec![]);
        let rule = assertion(AggregateKey::CountCourses, Operator::GreaterThanOrEqualTo, 2);
        let a = CourseInstance::new("1", "x1", "CSCI", "251");

        let failing = rule.resolve(&[&a], &context);
        assert_eq!(failing.rank(), Rank::ONE);
        assert_eq!(failing.max_rank(), Rank::of(2));

        let passing = rule.resolve(&[&a, &a], &context);
        assert_eq!(passing.rank(), passing.max_rank());
    }
}

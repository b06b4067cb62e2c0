//! Query rules: `from` a source collection, filtered, limited, asserted.

use std::collections::HashSet;

use serde::Serialize;

use reqsolve_core::combinatorics::{binomial, Combinations};
use reqsolve_core::limit::LimitedTranscripts;
use reqsolve_core::{Clause, CourseInstance, LimitSet, Operator, Rank, RequirementContext, RulePath};

use crate::load::SpecError;
use crate::rule::{AssertionRule, SolutionStream};
use crate::solution::{QueryOutput, QuerySolution, Solution};

/// The collection a query draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuerySource {
    Courses,
    Areas,
}

/// Whether repeated takes of one course all enter the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    All,
    First,
}

/// A rule over a filtered slice of the transcript (or the declared areas),
/// satisfied when its assertions hold over the claimed subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRule {
    pub path: RulePath,
    pub source: QuerySource,
    pub where_: Option<Clause>,
    pub limits: LimitSet,
    /// When false, the whole filtered set is yielded once, unclaimed.
    pub claim: bool,
    pub allow_claimed: bool,
    pub repeats: RepeatMode,
    pub assertions: Vec<AssertionRule>,
}

impl QueryRule {
    pub fn new(path: RulePath, source: QuerySource) -> Self {
        QueryRule {
            path,
            source,
            where_: None,
            limits: LimitSet::none(),
            claim: true,
            allow_claimed: false,
            repeats: RepeatMode::All,
            assertions: Vec::new(),
        }
    }

    pub fn with_where(mut self, clause: Clause) -> Self {
        self.where_ = Some(clause);
        self
    }

    pub fn with_limits(mut self, limits: LimitSet) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_claim(mut self, claim: bool) -> Self {
        self.claim = claim;
        self
    }

    pub fn with_repeats(mut self, repeats: RepeatMode) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_assertions(mut self, assertions: Vec<AssertionRule>) -> Self {
        self.assertions = assertions;
        self
    }

    /// The filtered course pool: transcript order, optional first-take
    /// dedup, `where` filter, plus any courses inserted at this path by
    /// exception.
    fn filtered_courses(&self, ctx: &RequirementContext) -> Vec<CourseInstance> {
        let mut seen_crsids: HashSet<&str> = HashSet::new();
        let mut pool: Vec<CourseInstance> = Vec::new();
        for course in ctx.transcript() {
            if self.repeats == RepeatMode::First && !seen_crsids.insert(course.crsid.as_str()) {
                continue;
            }
            if let Some(clause) = &self.where_ {
                if !clause.apply(course) {
                    continue;
                }
            }
            pool.push(course.clone());
        }
        // Inserted courses bypass the filter; they were added on purpose.
        for clbid in ctx.inserted_clbids_at(&self.path) {
            if pool.iter().any(|c| c.clbid == clbid) {
                continue;
            }
            if let Some(course) = ctx.find_course_by_clbid(clbid) {
                pool.push(course.clone());
            }
        }
        pool
    }

    /// The inclusive range of subset sizes worth enumerating for a
    /// candidate of `n` items.
    ///
    /// When every assertion is a plain numeric course-count bound, only
    /// sizes that could satisfy all bounds are generated: `>=` floors the
    /// range, `<=` caps it, `==` pins it. Otherwise all sizes `1..=n` are
    /// tried, smallest first.
    fn size_bounds(&self, n: usize) -> (usize, usize) {
        let simple = self.assertions.iter().map(|a| a.count_bound());
        if self.assertions.is_empty() || simple.clone().any(|b| b.is_none()) {
            return (1.min(n), n);
        }
        let mut lo = 0usize;
        let mut hi = n;
        for bound in simple.flatten() {
            match bound {
                (Operator::GreaterThanOrEqualTo, b) => lo = lo.max(b),
                (Operator::LessThanOrEqualTo, b) => hi = hi.min(b),
                (Operator::EqualTo, b) => {
                    lo = lo.max(b);
                    hi = hi.min(b);
                }
                _ => {}
            }
        }
        (lo, hi)
    }

    pub fn solutions<'a>(&'a self, ctx: &'a RequirementContext) -> SolutionStream<'a> {
        match self.source {
            QuerySource::Areas => {
                let filtered: Vec<_> = ctx
                    .areas()
                    .iter()
                    .filter(|area| match &self.where_ {
                        Some(clause) => clause.apply(*area),
                        None => true,
                    })
                    .cloned()
                    .collect();
                Box::new(std::iter::once(Solution::Query(QuerySolution {
                    rule: self.clone(),
                    output: QueryOutput::Areas(filtered),
                })))
            }
            QuerySource::Courses => {
                let pool = self.filtered_courses(ctx);
                Box::new(QuerySolutions {
                    rule: self,
                    candidates: self.limits.limited_transcripts(&pool),
                    state: None,
                    done: false,
                })
            }
        }
    }

    pub fn estimate(&self, ctx: &RequirementContext) -> u64 {
        match self.source {
            QuerySource::Areas => 1,
            QuerySource::Courses => {
                let pool = self.filtered_courses(ctx);
                let mut total: u64 = 0;
                for candidate in self.limits.limited_transcripts(&pool) {
                    if !self.claim {
                        total = total.saturating_add(1);
                        continue;
                    }
                    let (lo, hi) = self.size_bounds(candidate.len());
                    for size in lo..=hi {
                        total = total.saturating_add(binomial(candidate.len(), size));
                    }
                }
                total
            }
        }
    }

    pub fn max_rank(&self) -> Rank {
        self.assertions.iter().map(|a| a.max_rank()).sum()
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.assertions.is_empty() && self.source == QuerySource::Courses {
            return Err(SpecError::MissingAssertion {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

struct SubsetState {
    items: Vec<CourseInstance>,
    size: usize,
    hi: usize,
    combos: Combinations,
}

struct QuerySolutions<'a> {
    rule: &'a QueryRule,
    candidates: LimitedTranscripts<'a>,
    state: Option<SubsetState>,
    done: bool,
}

impl QuerySolutions<'_> {
    fn solution(&self, items: Vec<CourseInstance>) -> Solution {
        Solution::Query(QuerySolution {
            rule: self.rule.clone(),
            output: QueryOutput::Courses(items),
        })
    }
}

impl Iterator for QuerySolutions<'_> {
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        if self.done {
            return None;
        }
        loop {
            if let Some(state) = self.state.as_mut() {
                if let Some(combo) = state.combos.next() {
                    let items: Vec<_> = combo.iter().map(|&i| state.items[i].clone()).collect();
                    return Some(self.solution(items));
                }
                if state.size < state.hi {
                    state.size += 1;
                    state.combos = Combinations::new(state.items.len(), state.size);
                    continue;
                }
                self.state = None;
            }

            let Some(candidate) = self.candidates.next() else {
                self.done = true;
                return None;
            };

            // Claim-attempt mode off: the whole filtered set, exactly once
            // per candidate transcript.
            if !self.rule.claim {
                return Some(self.solution(candidate));
            }

            let (lo, hi) = self.rule.size_bounds(candidate.len());
            if lo > hi {
                continue;
            }
            self.state = Some(SubsetState {
                combos: Combinations::new(candidate.len(), lo),
                items: candidate,
                size: lo,
                hi,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use reqsolve_core::ClauseKey;

    use crate::aggregate::AggregateKey;

    fn course(clbid: &str, subject: &str, number: &str) -> CourseInstance {
        CourseInstance::new(clbid, format!("c-{}-{}", subject, number), subject, number)
    }

    fn count_at_least(n: i64) -> AssertionRule {
        AssertionRule::new(
            RulePath::root().append(".assert"),
            AggregateKey::CountCourses,
            Operator::GreaterThanOrEqualTo,
            Decimal::from(n),
        )
    }

    fn csci_query(assertions: Vec<AssertionRule>) -> QueryRule {
        QueryRule::new(RulePath::root(), QuerySource::Courses)
            .with_where(Clause::single(
                ClauseKey::Subject,
                Operator::EqualTo,
                "CSCI",
            ))
            .with_assertions(assertions)
    }

    #[test]
    fn test_count_pruning_generates_only_viable_sizes() {
        let ctx = RequirementContext::new(
            vec![
                course("1", "CSCI", "251"),
                course("2", "CSCI", "252"),
                course("3", "ART", "102"),
            ],
            vec![],
        );
        let rule = csci_query(vec![count_at_least(2)]);
        let solutions: Vec<_> = rule.solutions(&ctx).collect();
        // Two CSCI courses, bound >= 2: exactly the full pair.
        assert_eq!(solutions.len(), 1);
        assert_eq!(rule.estimate(&ctx), 1);
    }

    #[test]
    fn test_equality_bound_pins_subset_size() {
        let ctx = RequirementContext::new(
            vec![
                course("1", "CSCI", "251"),
                course("2", "CSCI", "252"),
                course("3", "CSCI", "253"),
            ],
            vec![],
        );
        let mut assertion = count_at_least(2);
        assertion.operator = Operator::EqualTo;
        let rule = csci_query(vec![assertion]);
        // C(3,2) = 3 subsets, nothing else.
        assert_eq!(rule.solutions(&ctx).count(), 3);
        assert_eq!(rule.estimate(&ctx), 3);
    }

    #[test]
    fn test_non_simple_assertion_falls_back_to_all_sizes() {
        let ctx = RequirementContext::new(
            vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")],
            vec![],
        );
        let assertion = AssertionRule::new(
            RulePath::root().append(".assert"),
            AggregateKey::SumCredits,
            Operator::GreaterThanOrEqualTo,
            Decimal::ONE,
        );
        let rule = csci_query(vec![assertion]);
        // Sizes 1..=2: C(2,1) + C(2,2) = 3.
        assert_eq!(rule.solutions(&ctx).count(), 3);
        assert_eq!(rule.estimate(&ctx), 3);
    }

    #[test]
    fn test_claim_false_yields_whole_set_once() {
        let ctx = RequirementContext::new(
            vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")],
            vec![],
        );
        let rule = csci_query(vec![count_at_least(1)]).with_claim(false);
        let solutions: Vec<_> = rule.solutions(&ctx).collect();
        assert_eq!(solutions.len(), 1);
        let Solution::Query(q) = &solutions[0] else {
            panic!("expected query solution");
        };
        let QueryOutput::Courses(items) = &q.output else {
            panic!("expected course output");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(rule.estimate(&ctx), 1);
    }

    #[test]
    fn test_repeats_first_dedups_by_crsid() {
        let first_take = CourseInstance::new("1", "x1", "CSCI", "251").with_term(2009, 1);
        let retake = CourseInstance::new("2", "x1", "CSCI", "251").with_term(2010, 1);
        let ctx = RequirementContext::new(vec![first_take, retake], vec![]);

        let rule = csci_query(vec![count_at_least(1)]).with_repeats(RepeatMode::First);
        let pool = rule.filtered_courses(&ctx);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].clbid, "1");
    }

    #[test]
    fn test_impossible_bounds_yield_nothing() {
        let ctx = RequirementContext::new(vec![course("1", "CSCI", "251")], vec![]);
        let rule = csci_query(vec![count_at_least(3)]);
        assert_eq!(rule.solutions(&ctx).count(), 0);
        assert_eq!(rule.estimate(&ctx), 0);
    }

    #[test]
    fn test_validate_requires_assertions() {
        let rule = QueryRule::new(RulePath::root(), QuerySource::Courses);
        assert!(rule.validate().is_err());
        assert!(csci_query(vec![count_at_least(1)]).validate().is_ok());
    }
}

//! Candidate solutions.
//!
//! A [`Solution`] is one concrete binding of transcript items to a rule:
//! enumerated lazily, nothing claimed yet. Auditing a solution is the
//! stateful step; it attempts claims against the shared ledger and
//! produces a [`RuleResult`](crate::result::RuleResult).

use serde::Serialize;

use reqsolve_core::{AreaPointer, CourseInstance, RequirementContext, RulePath};

use crate::result::{
    AssertionResult, CountItemResult, CountResult, CourseResult, QueryResult, ReferenceResult,
    RequirementResult, RuleResult,
};
use crate::rule::{AssertionRule, CourseRule, QueryRule, Rule};

/// One concrete, as-yet-unaudited candidate binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Solution {
    Course(CourseSolution),
    Count(CountSolution),
    Query(QuerySolution),
    Requirement(RequirementSolution),
    Reference(ReferenceSolution),
    Assertion(AssertionSolution),
}

impl Solution {
    /// Audits this solution against the context's claim ledger.
    ///
    /// Claim order is the solution's own item order, so auditing the same
    /// solution against the same ledger state is deterministic.
    pub fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        match self {
            Solution::Course(s) => s.audit(ctx),
            Solution::Count(s) => s.audit(ctx),
            Solution::Query(s) => s.audit(ctx),
            Solution::Requirement(s) => s.audit(ctx),
            Solution::Reference(s) => s.audit(ctx),
            Solution::Assertion(s) => s.audit(ctx),
        }
    }
}

/// A course rule, ready to bind a matching transcript line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSolution {
    pub rule: CourseRule,
}

impl CourseSolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        let rule = &self.rule;
        let overridden = ctx.forced_pass_at(&rule.path);

        // Inserted course-lines take precedence over catalog matching.
        let mut candidates: Vec<&CourseInstance> = ctx
            .inserted_clbids_at(&rule.path)
            .into_iter()
            .filter_map(|clbid| ctx.find_course_by_clbid(clbid))
            .collect();
        candidates.extend(ctx.find_courses_by_code(&rule.course));

        let matched = candidates.into_iter().find(|c| match rule.grade {
            Some(min) => c.grade.points >= min,
            None => true,
        });

        match matched {
            Some(course) => {
                let attempt = ctx.make_claim(course, &rule.path, rule.allow_claimed);
                RuleResult::Course(CourseResult {
                    path: rule.path.clone(),
                    course: rule.course.clone(),
                    matched: Some(course.clone()),
                    claim_attempt: Some(attempt),
                    overridden,
                })
            }
            None => RuleResult::Course(CourseResult {
                path: rule.path.clone(),
                course: rule.course.clone(),
                matched: None,
                claim_attempt: None,
                overridden,
            }),
        }
    }
}

/// One child slot of a count solution: solved, or carried unchosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountItem {
    Solved(Solution),
    Skipped(Rule),
}

/// A count rule with a concrete selection of child solutions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountSolution {
    pub path: RulePath,
    pub count: usize,
    pub at_most: bool,
    pub audit_clauses: Vec<AssertionRule>,
    pub items: Vec<CountItem>,
}

impl CountSolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        let overridden = ctx.forced_pass_at(&self.path);

        let items: Vec<CountItemResult> = self
            .items
            .iter()
            .map(|item| match item {
                CountItem::Solved(solution) => CountItemResult::Audited(solution.audit(ctx)),
                CountItem::Skipped(rule) => CountItemResult::Skipped(rule.clone()),
            })
            .collect();

        // Post-audit assertions see the courses claimed by passing
        // children only.
        let claimed_clbids: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                CountItemResult::Audited(result) if result.ok() => Some(result.claims()),
                _ => None,
            })
            .flatten()
            .map(|claim| claim.clbid)
            .collect();
        let claimed: Vec<&CourseInstance> = claimed_clbids
            .iter()
            .filter_map(|clbid| ctx.find_course_by_clbid(clbid))
            .collect();

        let assertions: Vec<AssertionResult> = self
            .audit_clauses
            .iter()
            .map(|a| a.resolve(&claimed, ctx))
            .collect();

        RuleResult::Count(CountResult {
            path: self.path.clone(),
            count: self.count,
            at_most: self.at_most,
            items,
            assertions,
            overridden,
        })
    }
}

/// The items a query solution drew from its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryOutput {
    Courses(Vec<CourseInstance>),
    Areas(Vec<AreaPointer>),
}

/// A query rule with one concrete subset of its filtered pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySolution {
    pub rule: QueryRule,
    pub output: QueryOutput,
}

impl QuerySolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        let rule = &self.rule;
        let overridden = ctx.forced_pass_at(&rule.path);

        match &self.output {
            QueryOutput::Courses(courses) => {
                let mut claim_attempts = Vec::new();
                let mut successful: Vec<&CourseInstance> = Vec::new();
                if rule.claim {
                    for course in courses {
                        let attempt = ctx.make_claim(course, &rule.path, rule.allow_claimed);
                        if attempt.ok() {
                            successful.push(course);
                        }
                        claim_attempts.push(attempt);
                    }
                } else {
                    successful.extend(courses.iter());
                }

                let assertions: Vec<AssertionResult> = rule
                    .assertions
                    .iter()
                    .map(|a| a.resolve(&successful, ctx))
                    .collect();

                RuleResult::Query(QueryResult {
                    path: rule.path.clone(),
                    claim: rule.claim,
                    output: self.output.clone(),
                    claim_attempts,
                    assertions,
                    overridden,
                })
            }
            QueryOutput::Areas(areas) => {
                let assertions: Vec<AssertionResult> = rule
                    .assertions
                    .iter()
                    .map(|a| a.resolve_len(areas.len(), ctx))
                    .collect();
                RuleResult::Query(QueryResult {
                    path: rule.path.clone(),
                    claim: false,
                    output: self.output.clone(),
                    claim_attempts: Vec::new(),
                    assertions,
                    overridden,
                })
            }
        }
    }
}

/// A named requirement with its inner solution (or none, when audited
/// externally).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementSolution {
    pub path: RulePath,
    pub name: String,
    pub audited: bool,
    pub inner: Option<Box<Solution>>,
}

impl RequirementSolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        let overridden = ctx.forced_pass_at(&self.path);
        let inner = self.inner.as_ref().map(|s| Box::new(s.audit(ctx)));
        RuleResult::Requirement(RequirementResult {
            path: self.path.clone(),
            name: self.name.clone(),
            audited: self.audited,
            inner,
            overridden,
        })
    }
}

/// A reference delegating to its resolved requirement's solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSolution {
    pub path: RulePath,
    pub name: String,
    pub inner: Box<Solution>,
}

impl ReferenceSolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        RuleResult::Reference(ReferenceResult {
            path: self.path.clone(),
            name: self.name.clone(),
            inner: Box::new(self.inner.audit(ctx)),
        })
    }
}

/// A standalone assertion, resolved over the whole transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionSolution {
    pub rule: AssertionRule,
}

impl AssertionSolution {
    fn audit(&self, ctx: &RequirementContext) -> RuleResult {
        let courses: Vec<&CourseInstance> = ctx.transcript().iter().collect();
        RuleResult::Assertion(self.rule.resolve(&courses, ctx))
    }
}

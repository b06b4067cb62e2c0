//! Named requirements and references to them.

use serde::Serialize;

use reqsolve_core::{Rank, RequirementContext, RulePath};

use crate::rule::{Rule, SolutionStream};
use crate::solution::{ReferenceSolution, RequirementSolution, Solution};

/// A named requirement wrapping an inner result rule.
///
/// A requirement with no result that is audited externally (department or
/// registrar) is trivially satisfied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementRule {
    pub path: RulePath,
    pub name: String,
    pub result: Option<Box<Rule>>,
    pub audited: bool,
}

impl RequirementRule {
    pub fn new(path: RulePath, name: impl Into<String>) -> Self {
        RequirementRule {
            path,
            name: name.into(),
            result: None,
            audited: false,
        }
    }

    pub fn with_result(mut self, result: Rule) -> Self {
        self.result = Some(Box::new(result));
        self
    }

    pub fn with_audited(mut self, audited: bool) -> Self {
        self.audited = audited;
        self
    }

    pub fn solutions<'a>(&'a self, ctx: &'a RequirementContext) -> SolutionStream<'a> {
        match &self.result {
            Some(inner) => {
                let path = self.path.clone();
                let name = self.name.clone();
                let audited = self.audited;
                Box::new(inner.solutions(ctx).map(move |solution| {
                    Solution::Requirement(RequirementSolution {
                        path: path.clone(),
                        name: name.clone(),
                        audited,
                        inner: Some(Box::new(solution)),
                    })
                }))
            }
            None => Box::new(std::iter::once(Solution::Requirement(
                RequirementSolution {
                    path: self.path.clone(),
                    name: self.name.clone(),
                    audited: self.audited,
                    inner: None,
                },
            ))),
        }
    }

    pub fn estimate(&self, ctx: &RequirementContext) -> u64 {
        match &self.result {
            Some(inner) => inner.estimate(ctx),
            None => 1,
        }
    }

    pub fn max_rank(&self) -> Rank {
        match &self.result {
            Some(inner) => inner.max_rank(),
            None => Rank::ONE,
        }
    }
}

/// A use of a named requirement declared elsewhere in the specification.
///
/// References resolve at load time (each reference site gets the
/// requirement mounted at its own path, so claims carry the right
/// requirement segments); cyclic references are load errors, never a
/// runtime concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRule {
    pub path: RulePath,
    pub name: String,
    pub requirement: Box<RequirementRule>,
}

impl ReferenceRule {
    pub fn new(path: RulePath, name: impl Into<String>, requirement: RequirementRule) -> Self {
        ReferenceRule {
            path,
            name: name.into(),
            requirement: Box::new(requirement),
        }
    }

    pub fn solutions<'a>(&'a self, ctx: &'a RequirementContext) -> SolutionStream<'a> {
        let path = self.path.clone();
        let name = self.name.clone();
        Box::new(self.requirement.solutions(ctx).map(move |solution| {
            Solution::Reference(ReferenceSolution {
                path: path.clone(),
                name: name.clone(),
                inner: Box::new(solution),
            })
        }))
    }

    pub fn estimate(&self, ctx: &RequirementContext) -> u64 {
        self.requirement.estimate(ctx)
    }
}

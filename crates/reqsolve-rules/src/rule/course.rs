//! Course-reference rules.

use rust_decimal::Decimal;
use serde::Serialize;

use reqsolve_core::{RequirementContext, RulePath};

use crate::load::SpecError;
use crate::rule::SolutionStream;
use crate::solution::{CourseSolution, Solution};

/// A rule satisfied by one specific course, e.g. `CSCI 251`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRule {
    pub path: RulePath,
    /// The `SUBJ NUM` code this rule matches.
    pub course: String,
    /// When set, this rule may bind a course another rule already claimed.
    pub allow_claimed: bool,
    /// Minimum grade points the matched course must carry.
    pub grade: Option<Decimal>,
    /// Hidden rules still claim but are elided from rendered reports.
    pub hidden: bool,
}

impl CourseRule {
    pub fn new(path: RulePath, course: impl Into<String>) -> Self {
        CourseRule {
            path,
            course: course.into(),
            allow_claimed: false,
            grade: None,
            hidden: false,
        }
    }

    pub fn with_allow_claimed(mut self, allow_claimed: bool) -> Self {
        self.allow_claimed = allow_claimed;
        self
    }

    pub fn with_grade(mut self, grade: Decimal) -> Self {
        self.grade = Some(grade);
        self
    }

    /// No combinatorics: exactly one candidate solution, binding happens
    /// at audit time.
    pub fn solutions<'a>(&'a self, _ctx: &'a RequirementContext) -> SolutionStream<'a> {
        Box::new(std::iter::once(Solution::Course(CourseSolution {
            rule: self.clone(),
        })))
    }

    pub fn estimate(&self, _ctx: &RequirementContext) -> u64 {
        1
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        validate_course_code(&self.course)
    }
}

/// Checks the `SUBJ NUM` shape of a course reference.
pub(crate) fn validate_course_code(code: &str) -> Result<(), SpecError> {
    let mut parts = code.split_whitespace();
    let (Some(subject), Some(number), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SpecError::MalformedCourse {
            course: code.to_string(),
        });
    };
    let subject_ok = !subject.is_empty() && subject.chars().all(|c| c.is_ascii_uppercase() || c == '/');
    let number_ok = number.chars().next().is_some_and(|c| c.is_ascii_digit());
    if !subject_ok || !number_ok {
        return Err(SpecError::MalformedCourse {
            course: code.to_string(),
        });
    }
    Ok(())
}

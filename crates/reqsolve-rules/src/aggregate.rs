//! The fixed registry of assertion aggregations.
//!
//! An assertion reduces a set of claimed courses to one number (a count, a
//! credit sum, a grade average) and compares it against a bound. The
//! registry is a closed enum so audit dispatch is exhaustive; unknown
//! aggregation text fails at load.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use reqsolve_core::CourseInstance;

/// A named reducer over a set of courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateKey {
    /// Number of course-lines.
    CountCourses,
    /// Number of distinct courses (by crsid; repeats collapse).
    CountDistinctCourses,
    /// Number of distinct subjects.
    CountSubjects,
    /// Number of distinct terms.
    CountTerms,
    /// Number of distinct years.
    CountYears,
    /// Total credits.
    SumCredits,
    /// Credit-weighted grade-point average, truncated to two decimals.
    AverageGrades,
    /// Mean credits per course, truncated to two decimals.
    AverageCredits,
}

impl AggregateKey {
    /// Parses the `fn(collection)` spelling used in specifications.
    pub fn parse(s: &str) -> Option<AggregateKey> {
        Some(match s {
            "count(courses)" => AggregateKey::CountCourses,
            "count(distinct_courses)" => AggregateKey::CountDistinctCourses,
            "count(subjects)" => AggregateKey::CountSubjects,
            "count(terms)" => AggregateKey::CountTerms,
            "count(years)" => AggregateKey::CountYears,
            "sum(credits)" => AggregateKey::SumCredits,
            "average(grades)" => AggregateKey::AverageGrades,
            "average(credits)" => AggregateKey::AverageCredits,
            _ => return None,
        })
    }

    /// The spelling used in specifications and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKey::CountCourses => "count(courses)",
            AggregateKey::CountDistinctCourses => "count(distinct_courses)",
            AggregateKey::CountSubjects => "count(subjects)",
            AggregateKey::CountTerms => "count(terms)",
            AggregateKey::CountYears => "count(years)",
            AggregateKey::SumCredits => "sum(credits)",
            AggregateKey::AverageGrades => "average(grades)",
            AggregateKey::AverageCredits => "average(credits)",
        }
    }

    /// Returns true for the count-of-course-lines key, which is the only
    /// aggregation the subset-size pruning can reason about.
    pub fn is_course_count(&self) -> bool {
        matches!(self, AggregateKey::CountCourses)
    }

    /// Reduces a set of courses to the aggregate value.
    pub fn apply(&self, courses: &[&CourseInstance]) -> Decimal {
        match self {
            AggregateKey::CountCourses => Decimal::from(courses.len()),
            AggregateKey::CountDistinctCourses => {
                let distinct: BTreeSet<&str> =
                    courses.iter().map(|c| c.crsid.as_str()).collect();
                Decimal::from(distinct.len())
            }
            AggregateKey::CountSubjects => {
                let distinct: BTreeSet<&str> =
                    courses.iter().map(|c| c.subject.as_str()).collect();
                Decimal::from(distinct.len())
            }
            AggregateKey::CountTerms => {
                let distinct: BTreeSet<i64> = courses.iter().map(|c| c.term()).collect();
                Decimal::from(distinct.len())
            }
            AggregateKey::CountYears => {
                let distinct: BTreeSet<i32> = courses.iter().map(|c| c.year).collect();
                Decimal::from(distinct.len())
            }
            AggregateKey::SumCredits => courses.iter().map(|c| c.credits).sum(),
            AggregateKey::AverageGrades => {
                let eligible: Vec<_> = courses
                    .iter()
                    .filter(|c| c.grade.counts_in_gpa)
                    .collect();
                let credits: Decimal = eligible.iter().map(|c| c.credits).sum();
                if credits.is_zero() {
                    return Decimal::ZERO;
                }
                let points: Decimal =
                    eligible.iter().map(|c| c.grade.points * c.credits).sum();
                // Truncated, never rounded: 5.0 over 3.0 credits is 1.66.
                (points / credits).trunc_with_scale(2)
            }
            AggregateKey::AverageCredits => {
                if courses.is_empty() {
                    return Decimal::ZERO;
                }
                let total: Decimal = courses.iter().map(|c| c.credits).sum();
                (total / Decimal::from(courses.len())).trunc_with_scale(2)
            }
        }
    }
}

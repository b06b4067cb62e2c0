//! The clause predicate language.
//!
//! A clause is a small predicate tree evaluated against transcript items:
//! a single `key operator expected` comparison, or a boolean `$and`/`$or`
//! over sub-clauses. Keys are a closed enum so an unknown key is a load-time
//! error and field dispatch per data type is exhaustive.
//!
//! `$and`/`$or` deliberately do not short-circuit: every child is evaluated
//! (clause application has no side effects) and the results are combined
//! with all/any.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::value::{compare_values, tuple_intersects, Value};

/// Comparison operators available to clause predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    EqualTo,
    NotEqualTo,
    In,
    NotIn,
}

impl Operator {
    /// Parses the `$`-prefixed operator spelling used in specifications.
    pub fn parse(s: &str) -> Option<Operator> {
        Some(match s {
            "$lt" => Operator::LessThan,
            "$lte" => Operator::LessThanOrEqualTo,
            "$gt" => Operator::GreaterThan,
            "$gte" => Operator::GreaterThanOrEqualTo,
            "$eq" => Operator::EqualTo,
            "$neq" | "$ne" => Operator::NotEqualTo,
            "$in" => Operator::In,
            "$nin" => Operator::NotIn,
            _ => return None,
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::EqualTo => "==",
            Operator::NotEqualTo => "!=",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        };
        write!(f, "{}", s)
    }
}

/// The closed set of queryable fields across all data types.
///
/// Course fields and area fields share one key space; asking a course for an
/// area-only key (or vice versa) yields no value, which a predicate treats
/// as non-matching (vacuously true only for negated operators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKey {
    // Course fields
    Clbid,
    Crsid,
    Course,
    Subject,
    Number,
    Section,
    Level,
    Credits,
    Grade,
    GradeLetter,
    Attributes,
    Term,
    Year,
    Semester,
    IsLab,
    IsInProgress,
    IsRepeat,
    IsIncomplete,
    // Area-pointer fields
    Code,
    Status,
    Kind,
    Degree,
    Name,
}

impl ClauseKey {
    /// Parses a key as it appears in a specification mapping.
    pub fn parse(s: &str) -> Option<ClauseKey> {
        Some(match s {
            "clbid" => ClauseKey::Clbid,
            "crsid" => ClauseKey::Crsid,
            "course" => ClauseKey::Course,
            "subject" => ClauseKey::Subject,
            "number" => ClauseKey::Number,
            "section" => ClauseKey::Section,
            "level" => ClauseKey::Level,
            "credits" => ClauseKey::Credits,
            "grade" => ClauseKey::Grade,
            "grade_letter" => ClauseKey::GradeLetter,
            "attributes" | "gereqs" => ClauseKey::Attributes,
            "term" => ClauseKey::Term,
            "year" => ClauseKey::Year,
            "semester" => ClauseKey::Semester,
            "is_lab" => ClauseKey::IsLab,
            "is_in_progress" => ClauseKey::IsInProgress,
            "is_repeat" => ClauseKey::IsRepeat,
            "is_incomplete" => ClauseKey::IsIncomplete,
            "code" => ClauseKey::Code,
            "status" => ClauseKey::Status,
            "kind" => ClauseKey::Kind,
            "degree" => ClauseKey::Degree,
            "name" => ClauseKey::Name,
            _ => return None,
        })
    }
}

/// An item that exposes fields to the clause evaluator.
pub trait Clausable {
    /// Returns the value for `key`, or `None` if the key does not apply to
    /// this data type.
    fn field(&self, key: ClauseKey) -> Option<Value>;
}

/// A single `key operator expected` comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub key: ClauseKey,
    pub operator: Operator,
    pub expected: Value,
}

impl Predicate {
    pub fn new(key: ClauseKey, operator: Operator, expected: impl Into<Value>) -> Self {
        Predicate {
            key,
            operator,
            expected: expected.into(),
        }
    }

    /// Applies this predicate to an item by extracting its field value.
    pub fn apply<T: Clausable>(&self, item: &T) -> bool {
        match item.field(self.key) {
            Some(actual) => self.compare(&actual),
            // Missing field: only negated operators hold vacuously.
            None => matches!(self.operator, Operator::NotEqualTo | Operator::NotIn),
        }
    }

    /// Compares an already-extracted value against the expected operand.
    ///
    /// Scalar-vs-tuple `==` auto-coerces to `in`, and `!=` to `not-in`.
    /// Tuple-vs-tuple supports only membership operators, interpreted as
    /// "string-set intersection is non-empty" (never subset).
    pub fn compare(&self, actual: &Value) -> bool {
        let either_tuple = actual.is_tuple() || self.expected.is_tuple();
        let operator = match (self.operator, either_tuple) {
            (Operator::EqualTo, true) => Operator::In,
            (Operator::NotEqualTo, true) => Operator::NotIn,
            (op, _) => op,
        };

        match operator {
            Operator::In => tuple_intersects(actual, &self.expected),
            Operator::NotIn => !tuple_intersects(actual, &self.expected),
            op => {
                let Some(ordering) = compare_values(actual, &self.expected) else {
                    // Ordering comparisons against tuples never hold.
                    return false;
                };
                match op {
                    Operator::LessThan => ordering == Ordering::Less,
                    Operator::LessThanOrEqualTo => ordering != Ordering::Greater,
                    Operator::GreaterThan => ordering == Ordering::Greater,
                    Operator::GreaterThanOrEqualTo => ordering != Ordering::Less,
                    Operator::EqualTo => ordering == Ordering::Equal,
                    Operator::NotEqualTo => ordering != Ordering::Equal,
                    Operator::In | Operator::NotIn => unreachable!("handled above"),
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.key, self.operator, self.expected)
    }
}

/// A predicate tree: a single comparison or a boolean combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    Single(Predicate),
    And(Vec<Clause>),
    Or(Vec<Clause>),
}

impl Clause {
    /// Shorthand for a single-predicate clause.
    pub fn single(key: ClauseKey, operator: Operator, expected: impl Into<Value>) -> Self {
        Clause::Single(Predicate::new(key, operator, expected))
    }

    /// Asks an item whether this clause applies to it.
    pub fn apply<T: Clausable>(&self, item: &T) -> bool {
        match self {
            Clause::Single(predicate) => predicate.apply(item),
            // No short-circuit: evaluate every child, then combine.
            Clause::And(children) => children
                .iter()
                .map(|c| c.apply(item))
                .collect::<Vec<_>>()
                .into_iter()
                .all(|b| b),
            Clause::Or(children) => children
                .iter()
                .map(|c| c.apply(item))
                .collect::<Vec<_>>()
                .into_iter()
                .any(|b| b),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Single(p) => write!(f, "{}", p),
            Clause::And(children) => {
                write!(f, "(")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            Clause::Or(children) => {
                write!(f, "(")?;
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}

//! Clause operand values and comparison semantics.
//!
//! Values are what clause predicates compare against: scalars extracted from
//! transcript data, or tuples for set-style membership. Comparison follows
//! the audit engine's coercion rules:
//!
//! - If exactly one side is a string, the other side is coerced to a string
//!   before comparing.
//! - Integers and decimals compare numerically with each other.
//! - Tuples only participate in membership-style comparisons; the two tuple
//!   modes ([`tuple_intersects`] and [`tuple_equivalent`]) are distinct and
//!   used at distinct call sites.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

/// A scalar or tuple operand in a clause comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
    Tuple(Vec<Value>),
}

impl Value {
    /// Creates a string value.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Creates a tuple of string values.
    pub fn str_tuple<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Tuple(items.into_iter().map(Value::str).collect())
    }

    /// Returns true if this value is a tuple.
    pub fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    /// Renders the value as the string used for coerced comparisons.
    pub fn coerce_to_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Tuple(items) => items
                .iter()
                .map(Value::coerce_to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// The string set of a tuple (each element coerced to string).
    ///
    /// A scalar is treated as a one-element set so that scalar-vs-tuple
    /// membership checks share one code path.
    pub fn string_set(&self) -> BTreeSet<String> {
        match self {
            Value::Tuple(items) => items.iter().map(Value::coerce_to_string).collect(),
            other => {
                let mut set = BTreeSet::new();
                set.insert(other.coerce_to_string());
                set
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Orders two scalar values under the engine's coercion rules.
///
/// Returns `None` when either side is a tuple (tuples never order) or the
/// two sides cannot be brought to a common type.
pub fn compare_values(actual: &Value, expected: &Value) -> Option<Ordering> {
    use Value::*;
    match (actual, expected) {
        (Tuple(_), _) | (_, Tuple(_)) => None,
        (Str(a), Str(b)) => Some(a.cmp(b)),
        (Int(a), Int(b)) => Some(a.cmp(b)),
        (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
        (Int(a), Decimal(b)) => Some(rust_decimal::Decimal::from(*a).cmp(b)),
        (Decimal(a), Int(b)) => Some(a.cmp(&rust_decimal::Decimal::from(*b))),
        (Bool(a), Bool(b)) => Some(a.cmp(b)),
        // Exactly one side is a string: coerce the other side to string.
        (Str(a), b) => Some(a.cmp(&b.coerce_to_string())),
        (a, Str(b)) => Some(a.coerce_to_string().cmp(b)),
        (Bool(_), _) | (_, Bool(_)) => None,
    }
}

/// Plain clause-application tuple mode: the string sets intersect.
///
/// Used when an `in` clause is applied to a tuple-valued field (e.g. course
/// attributes against an attribute list). Intersection only; this is NOT a
/// subset check.
pub fn tuple_intersects(left: &Value, right: &Value) -> bool {
    let a = left.string_set();
    let b = right.string_set();
    a.intersection(&b).next().is_some()
}

/// Multicountable-equivalence tuple mode: the string sets intersect AND one
/// side is a subset of the other.
///
/// Used when matching declared equivalence identities, which is stricter
/// than plain application. Kept separate from [`tuple_intersects`] on
/// purpose; the two call sites have different intent.
pub fn tuple_equivalent(left: &Value, right: &Value) -> bool {
    let a = left.string_set();
    let b = right.string_set();
    if a.intersection(&b).next().is_none() {
        return false;
    }
    a.is_subset(&b) || b.is_subset(&a)
}

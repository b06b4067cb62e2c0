//! Symbolic constants resolved inside rule specifications.
//!
//! Specifications may reference per-student facts by `$`-prefixed
//! placeholder instead of a literal, e.g. `year: $matriculation-year`.
//! The loader resolves placeholders through a [`Constants`] value supplied
//! by the caller; an unresolvable placeholder is a specification error
//! (raised by the loader, which owns that error type).

use rust_decimal::Decimal;

use crate::value::Value;

/// Per-audit constant bindings for symbolic placeholders.
#[derive(Debug, Clone, Default)]
pub struct Constants {
    pub matriculation_year: Option<i64>,
    pub graduation_year: Option<i64>,
    pub primary_performing_medium: Option<String>,
    pub current_area_code: Option<String>,
    pub terms_since_declaring_major: Option<Decimal>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matriculation_year(mut self, year: i64) -> Self {
        self.matriculation_year = Some(year);
        self
    }

    pub fn with_graduation_year(mut self, year: i64) -> Self {
        self.graduation_year = Some(year);
        self
    }

    pub fn with_primary_performing_medium(mut self, medium: impl Into<String>) -> Self {
        self.primary_performing_medium = Some(medium.into());
        self
    }

    pub fn with_current_area_code(mut self, code: impl Into<String>) -> Self {
        self.current_area_code = Some(code.into());
        self
    }

    /// Returns true if `raw` is a `$`-prefixed placeholder (operator
    /// spellings like `$gte` are not placeholders; they never reach here
    /// because the loader consumes them as mapping keys, not values).
    pub fn is_placeholder(raw: &str) -> bool {
        raw.starts_with('$')
    }

    /// Resolves a placeholder name to its bound value.
    ///
    /// Returns `None` when the placeholder is unknown or its binding was
    /// not supplied for this audit.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        match name {
            "$matriculation-year" => self.matriculation_year.map(Value::Int),
            "$graduation-year" => self.graduation_year.map(Value::Int),
            "$primary-performing-medium" => self
                .primary_performing_medium
                .as_deref()
                .map(Value::from),
            "$current-area-code" => self.current_area_code.as_deref().map(Value::from),
            "$terms-since-declaring-major" => {
                self.terms_since_declaring_major.map(Value::Decimal)
            }
            _ => None,
        }
    }
}

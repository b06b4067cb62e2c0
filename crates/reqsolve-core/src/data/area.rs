//! Area pointers - declared areas of study.
//!
//! Queryable items only; the claim ledger never tracks them.

use serde::Serialize;

use crate::clause::{Clausable, ClauseKey};
use crate::value::Value;

/// Declaration status of an area pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaStatus {
    Declared,
    Certified,
    WhatIf,
}

/// The kind of area an [`AreaPointer`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaKind {
    Degree,
    Major,
    Concentration,
    Emphasis,
}

impl AreaKind {
    fn as_str(&self) -> &'static str {
        match self {
            AreaKind::Degree => "degree",
            AreaKind::Major => "major",
            AreaKind::Concentration => "concentration",
            AreaKind::Emphasis => "emphasis",
        }
    }
}

/// An immutable pointer to a declared area of study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaPointer {
    pub code: String,
    pub status: AreaStatus,
    pub kind: AreaKind,
    pub degree: Option<String>,
    pub name: String,
}

impl AreaPointer {
    pub fn new(
        code: impl Into<String>,
        status: AreaStatus,
        kind: AreaKind,
        name: impl Into<String>,
    ) -> Self {
        AreaPointer {
            code: code.into(),
            status,
            kind,
            degree: None,
            name: name.into(),
        }
    }

    pub fn with_degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }
}

impl Clausable for AreaPointer {
    fn field(&self, key: ClauseKey) -> Option<Value> {
        match key {
            ClauseKey::Code => Some(Value::str(&self.code)),
            ClauseKey::Status => Some(Value::str(match self.status {
                AreaStatus::Declared => "declared",
                AreaStatus::Certified => "certified",
                AreaStatus::WhatIf => "what-if",
            })),
            ClauseKey::Kind => Some(Value::str(self.kind.as_str())),
            ClauseKey::Degree => self.degree.as_deref().map(Value::from),
            ClauseKey::Name => Some(Value::str(&self.name)),
            // Course fields do not apply to areas.
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{Clause, Operator};

    #[test]
    fn test_field_dispatch() {
        let area = AreaPointer::new("140", AreaStatus::Declared, AreaKind::Major, "Biology")
            .with_degree("B.A.");
        assert_eq!(area.field(ClauseKey::Kind), Some(Value::str("major")));
        assert_eq!(area.field(ClauseKey::Degree), Some(Value::str("B.A.")));
        assert_eq!(area.field(ClauseKey::Subject), None);
    }

    #[test]
    fn test_clause_application() {
        let area = AreaPointer::new("140", AreaStatus::Declared, AreaKind::Major, "Biology");
        let clause = Clause::single(ClauseKey::Kind, Operator::EqualTo, "major");
        assert!(clause.apply(&area));
    }
}

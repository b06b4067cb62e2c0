//! Manual audit exceptions.
//!
//! Registrars can override individual rules: force a pass, override an
//! assertion's resolved value, or insert a specific course-line into a rule
//! that would not otherwise see it. Exceptions target exact rule paths.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::path::RulePath;

/// One manual override, targeted at an exact rule path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Exception {
    /// Force the rule at `path` to pass.
    Override { path: RulePath },
    /// Override the resolved value of the assertion at `path`.
    Value { path: RulePath, value: Decimal },
    /// Insert the course-line `clbid` into the rule at `path`.
    Insert { path: RulePath, clbid: String },
}

impl Exception {
    pub fn path(&self) -> &RulePath {
        match self {
            Exception::Override { path } => path,
            Exception::Value { path, .. } => path,
            Exception::Insert { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_accessor() {
        let path = RulePath::root().append_requirement("Core");
        let exceptions = [
            Exception::Override { path: path.clone() },
            Exception::Value {
                path: path.clone(),
                value: Decimal::new(30, 1),
            },
            Exception::Insert {
                path: path.clone(),
                clbid: "123".to_string(),
            },
        ];
        for exception in &exceptions {
            assert_eq!(exception.path(), &path);
        }
    }
}

//! Rule paths.
//!
//! Every node in a rule tree has a path from the root (`$`). Requirement
//! nodes contribute `%`-prefixed segments; structural nodes contribute
//! segments like `.count` or `[2]`. Claims care only about the requirement
//! segments, so the path type knows how to extract them.

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

/// The sequence of `%requirement` segments of a path; the unit of
/// multicountable matching.
pub type ReqPath = Vec<String>;

/// A path identifying one node in a rule tree.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RulePath(SmallVec<[String; 6]>);

impl RulePath {
    /// The root path, `$`.
    pub fn root() -> Self {
        let mut segments = SmallVec::new();
        segments.push("$".to_string());
        RulePath(segments)
    }

    /// Builds a path directly from segments (primarily for declarations and
    /// tests; loaded rules grow paths via [`RulePath::append`]).
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RulePath(segments.into_iter().map(Into::into).collect())
    }

    /// Returns a new path with one more segment.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        RulePath(segments)
    }

    /// Returns a new path extended with a requirement segment (`%Name`).
    pub fn append_requirement(&self, name: &str) -> Self {
        self.append(format!("%{}", name))
    }

    /// Returns a new path extended with a child index segment (`[i]`).
    pub fn append_index(&self, index: usize) -> Self {
        self.append(format!("[{}]", index))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The `%requirement` segments only, without the `%` prefix.
    ///
    /// This is the claimant identity used by the claim ledger and
    /// multicountable matching.
    pub fn requirement_segments(&self) -> ReqPath {
        self.0
            .iter()
            .filter(|s| s.starts_with('%'))
            .map(|s| s[1..].to_string())
            .collect()
    }
}

impl fmt::Debug for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_building() {
        let path = RulePath::root()
            .append_requirement("Core")
            .append(".count")
            .append_index(2);
        assert_eq!(path.to_string(), "$%Core.count[2]");
    }

    #[test]
    fn test_requirement_segments() {
        let path = RulePath::root()
            .append_requirement("Major")
            .append(".count")
            .append_index(0)
            .append_requirement("Electives")
            .append(".query");
        assert_eq!(
            path.requirement_segments(),
            vec!["Major".to_string(), "Electives".to_string()]
        );
    }

    #[test]
    fn test_root_has_no_requirement_segments() {
        assert!(RulePath::root().requirement_segments().is_empty());
    }
}

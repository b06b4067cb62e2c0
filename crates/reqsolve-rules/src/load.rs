//! Loading rule trees from YAML specifications.
//!
//! The loader turns a YAML document into a validated [`Rule`] tree.
//! Symbolic constants are resolved here, requirement references are
//! resolved and mounted at their reference site, and the tree is
//! validated once before it is handed back.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde_yaml::{Mapping, Value as Yaml};
use thiserror::Error;
use tracing::debug;

use reqsolve_core::{
    Clause, ClauseKey, Constants, Limit, LimitSet, MulticountableSet, Operator, Predicate,
    ReqPath, RulePath, Value,
};

use crate::aggregate::AggregateKey;
use crate::rule::{
    AssertionRule, CountRule, CourseRule, QueryRule, QuerySource, ReferenceRule, RepeatMode,
    RequirementRule, Rule,
};

/// Errors raised while loading or validating a specification.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed course reference {course:?}")]
    MalformedCourse { course: String },

    #[error("count bound {count} is impossible over {items} items at {path}")]
    ImpossibleCountBound {
        path: RulePath,
        count: usize,
        items: usize,
    },

    #[error("course query at {path} declares no assertions")]
    MissingAssertion { path: RulePath },

    #[error("unrecognized rule shape at {path}")]
    UnknownRuleShape { path: RulePath },

    #[error("unknown clause key {key:?}")]
    UnknownClauseKey { key: String },

    #[error("clause on {key:?} declares more than one comparison")]
    MultipleComparisons { key: String },

    #[error("unknown operator {operator:?}")]
    UnknownOperator { operator: String },

    #[error("unknown aggregation {key:?}")]
    UnknownAggregation { key: String },

    #[error("reference to undeclared requirement {name:?}")]
    UnknownRequirement { name: String },

    #[error("requirement {name:?} is declared but never referenced")]
    UnreferencedRequirement { name: String },

    #[error("requirement {name:?} is part of a reference cycle")]
    CyclicReference { name: String },

    #[error("unresolved constant {name:?}")]
    UnresolvedConstant { name: String },

    #[error("{detail}")]
    Malformed { detail: String },
}

fn malformed(detail: impl Into<String>) -> SpecError {
    SpecError::Malformed {
        detail: detail.into(),
    }
}

struct RequirementDef {
    result: Option<Yaml>,
    audited: bool,
}

struct LoadState<'a> {
    definitions: &'a HashMap<String, RequirementDef>,
    referenced: HashSet<String>,
    stack: Vec<String>,
}

/// Builds [`Rule`] trees from YAML documents.
///
/// One loader handles one audit's worth of specifications: the bound
/// [`Constants`] are substituted for `$`-placeholders as values are read.
#[derive(Debug, Default)]
pub struct SpecLoader {
    constants: Constants,
}

impl SpecLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constants(mut self, constants: Constants) -> Self {
        self.constants = constants;
        self
    }

    /// Parses and loads a specification from YAML text.
    pub fn load_str(&self, source: &str) -> Result<Rule, SpecError> {
        let doc: Yaml = serde_yaml::from_str(source)?;
        self.load(&doc)
    }

    /// Loads a specification document.
    ///
    /// The document is either a bare rule, or a mapping with a `result`
    /// rule and an optional `requirements` table of named definitions
    /// referenced from inside the result.
    pub fn load(&self, doc: &Yaml) -> Result<Rule, SpecError> {
        let mapping = as_mapping(doc, "specification")?;
        let definitions = match get(mapping, "requirements") {
            Some(value) => requirement_definitions(value)?,
            None => HashMap::new(),
        };
        let mut state = LoadState {
            definitions: &definitions,
            referenced: HashSet::new(),
            stack: Vec::new(),
        };
        let rule = match get(mapping, "result") {
            Some(result) => self.rule(result, RulePath::root(), &mut state)?,
            None => self.rule(doc, RulePath::root(), &mut state)?,
        };
        for name in definitions.keys() {
            if !state.referenced.contains(name) {
                return Err(SpecError::UnreferencedRequirement { name: name.clone() });
            }
        }
        rule.validate()?;
        debug!(max_rank = %rule.max_rank().value(), "loaded specification");
        Ok(rule)
    }

    fn rule(
        &self,
        value: &Yaml,
        path: RulePath,
        state: &mut LoadState<'_>,
    ) -> Result<Rule, SpecError> {
        let mapping = as_mapping(value, "rule")?;

        if let Some(course) = get(mapping, "course") {
            return self.course_rule(mapping, course, path);
        }
        if let Some(items) = get(mapping, "all") {
            let items = as_sequence(items, "all")?;
            return self.count_rule(mapping, items.len(), items, path, state);
        }
        if let Some(items) = get(mapping, "any") {
            let items = as_sequence(items, "any")?;
            return self.count_rule(mapping, 1, items, path, state);
        }
        if let Some(items) = get(mapping, "both") {
            let items = exactly_two(as_sequence(items, "both")?, "both")?;
            return self.count_rule(mapping, 2, items, path, state);
        }
        if let Some(items) = get(mapping, "either") {
            let items = exactly_two(as_sequence(items, "either")?, "either")?;
            return self.count_rule(mapping, 1, items, path, state);
        }
        if let (Some(count), Some(items)) = (get(mapping, "count"), get(mapping, "of")) {
            let items = as_sequence(items, "of")?;
            let count = count_bound(count, items.len())?;
            return self.count_rule(mapping, count, items, path, state);
        }
        if let Some(source) = get(mapping, "from") {
            return self.query_rule(mapping, source, path);
        }
        if let Some(name) = get(mapping, "requirement") {
            return self.reference_rule(name, path, state);
        }
        if let Some(assertion) = get(mapping, "assert") {
            if mapping.len() == 1 {
                return Ok(Rule::Assertion(self.assertion(assertion, path)?));
            }
        }
        Err(SpecError::UnknownRuleShape { path })
    }

    fn course_rule(
        &self,
        mapping: &Mapping,
        course: &Yaml,
        path: RulePath,
    ) -> Result<Rule, SpecError> {
        let code = as_str(course, "course")?;
        let mut rule = CourseRule::new(path, code);
        if let Some(grade) = get(mapping, "grade") {
            rule = rule.with_grade(grade_bound(grade)?);
        }
        if let Some(flag) = get2(mapping, "allow_claimed", "allow claimed") {
            rule = rule.with_allow_claimed(as_bool(flag, "allow_claimed")?);
        }
        if let Some(flag) = get(mapping, "hidden") {
            rule.hidden = as_bool(flag, "hidden")?;
        }
        Ok(Rule::Course(rule))
    }

    fn count_rule(
        &self,
        mapping: &Mapping,
        count: usize,
        items: &[Yaml],
        path: RulePath,
        state: &mut LoadState<'_>,
    ) -> Result<Rule, SpecError> {
        let base = path.append(".count");
        let children = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.rule(item, base.append_index(i), state))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rule = CountRule::new(path.clone(), count, children);
        if let Some(flag) = get2(mapping, "at_most", "at most") {
            rule = rule.with_at_most(as_bool(flag, "at_most")?);
        }
        if let Some(audit) = get(mapping, "audit") {
            rule = rule.with_audit_clauses(self.assertions(audit, path.append(".audit"))?);
        }
        Ok(Rule::Count(rule))
    }

    fn query_rule(
        &self,
        mapping: &Mapping,
        source: &Yaml,
        path: RulePath,
    ) -> Result<Rule, SpecError> {
        let source = match as_str(source, "from")? {
            "courses" => QuerySource::Courses,
            "areas" => QuerySource::Areas,
            other => return Err(malformed(format!("unknown query source {other:?}"))),
        };
        let mut rule = QueryRule::new(path.clone(), source);
        if let Some(clause) = get(mapping, "where") {
            rule = rule.with_where(self.clause(clause)?);
        }
        if let Some(limits) = get(mapping, "limit") {
            rule = rule.with_limits(self.limits(limits)?);
        }
        if let Some(claim) = get(mapping, "claim") {
            rule = rule.with_claim(as_bool(claim, "claim")?);
        }
        if let Some(flag) = get2(mapping, "allow_claimed", "allow claimed") {
            rule.allow_claimed = as_bool(flag, "allow_claimed")?;
        }
        if let Some(repeats) = get(mapping, "repeats") {
            rule = rule.with_repeats(match as_str(repeats, "repeats")? {
                "all" => RepeatMode::All,
                "first" => RepeatMode::First,
                other => return Err(malformed(format!("unknown repeats mode {other:?}"))),
            });
        }
        if let Some(assertions) = get(mapping, "assert") {
            rule = rule.with_assertions(self.assertions(assertions, path.append(".assertions"))?);
        }
        Ok(Rule::Query(rule))
    }

    fn reference_rule(
        &self,
        name: &Yaml,
        path: RulePath,
        state: &mut LoadState<'_>,
    ) -> Result<Rule, SpecError> {
        let name = as_str(name, "requirement")?.to_string();
        if state.stack.contains(&name) {
            return Err(SpecError::CyclicReference { name });
        }
        let def = state
            .definitions
            .get(&name)
            .ok_or_else(|| SpecError::UnknownRequirement { name: name.clone() })?;
        state.referenced.insert(name.clone());

        // Each reference site gets the requirement mounted at its own
        // path, so claims made beneath it carry this site's segments.
        let req_path = path.append_requirement(&name);
        let mut requirement =
            RequirementRule::new(req_path.clone(), name.clone()).with_audited(def.audited);
        if let Some(result) = &def.result {
            state.stack.push(name.clone());
            let inner = self.rule(result, req_path, state)?;
            state.stack.pop();
            requirement = requirement.with_result(inner);
        }
        Ok(Rule::Reference(ReferenceRule::new(path, name, requirement)))
    }

    /// Loads one assertion or a list of them, indexed beneath `base`.
    fn assertions(&self, value: &Yaml, base: RulePath) -> Result<Vec<AssertionRule>, SpecError> {
        match value {
            Yaml::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.assertion(item, base.append_index(i)))
                .collect(),
            _ => Ok(vec![self.assertion(value, base.append_index(0))?]),
        }
    }

    /// Loads an `{aggregate: {$op: bound}, where: ...}` assertion.
    fn assertion(&self, value: &Yaml, path: RulePath) -> Result<AssertionRule, SpecError> {
        let mapping = as_mapping(value, "assertion")?;
        let mut where_ = None;
        let mut body = None;

        for (key, entry) in mapping {
            let key = as_str(key, "assertion key")?;
            if key == "where" {
                where_ = Some(self.clause(entry)?);
                continue;
            }
            let aggregate = AggregateKey::parse(key).ok_or_else(|| {
                SpecError::UnknownAggregation {
                    key: key.to_string(),
                }
            })?;
            if body.replace((aggregate, entry)).is_some() {
                return Err(malformed("assertion declares more than one aggregation"));
            }
        }

        let (key, comparison) = body.ok_or_else(|| malformed("assertion has no aggregation"))?;
        let comparison = as_mapping(comparison, "assertion comparison")?;
        let (operator, expected) = single_entry(comparison, "assertion comparison")?;
        let operator = parse_operator(as_str(operator, "operator")?)?;

        let mut rule = AssertionRule::new(path, key, operator, self.decimal(expected)?);
        if let Some(clause) = where_ {
            rule = rule.with_where(clause);
        }
        Ok(rule)
    }

    /// Loads a `where` clause mapping.
    ///
    /// Multiple keys in one mapping combine as an implicit `$and`; a value
    /// without an operator mapping is an implicit `$eq`.
    fn clause(&self, value: &Yaml) -> Result<Clause, SpecError> {
        let mapping = as_mapping(value, "clause")?;
        let mut children = Vec::with_capacity(mapping.len());
        for (key, entry) in mapping {
            let key = as_str(key, "clause key")?;
            match key {
                "$and" => {
                    let parts = as_sequence(entry, "$and")?
                        .iter()
                        .map(|c| self.clause(c))
                        .collect::<Result<Vec<_>, _>>()?;
                    children.push(Clause::And(parts));
                }
                "$or" => {
                    let parts = as_sequence(entry, "$or")?
                        .iter()
                        .map(|c| self.clause(c))
                        .collect::<Result<Vec<_>, _>>()?;
                    children.push(Clause::Or(parts));
                }
                _ => {
                    let parsed = ClauseKey::parse(key).ok_or_else(|| SpecError::UnknownClauseKey {
                        key: key.to_string(),
                    })?;
                    children.push(self.predicate(key, parsed, entry)?);
                }
            }
        }
        match children.len() {
            0 => Err(malformed("empty clause")),
            1 => Ok(children.remove(0)),
            _ => Ok(Clause::And(children)),
        }
    }

    /// Loads the single comparison attached to one clause key.
    ///
    /// A clause carries exactly one operator per key; a comparison mapping
    /// with several entries is rejected rather than folded together.
    fn predicate(&self, name: &str, key: ClauseKey, value: &Yaml) -> Result<Clause, SpecError> {
        // `subject: CSCI` is shorthand for `subject: {$eq: CSCI}`.
        let Yaml::Mapping(comparisons) = value else {
            return Ok(Clause::Single(Predicate::new(
                key,
                Operator::EqualTo,
                self.operand(value)?,
            )));
        };
        if comparisons.len() > 1 {
            return Err(SpecError::MultipleComparisons {
                key: name.to_string(),
            });
        }
        let (operator, operand) = single_entry(comparisons, "comparison mapping")?;
        let operator = parse_operator(as_str(operator, "operator")?)?;
        Ok(Clause::Single(Predicate::new(
            key,
            operator,
            self.operand(operand)?,
        )))
    }

    fn limits(&self, value: &Yaml) -> Result<LimitSet, SpecError> {
        let mut limits = Vec::new();
        for entry in as_sequence(value, "limit")? {
            let mapping = as_mapping(entry, "limit entry")?;
            let at_most = get2(mapping, "at_most", "at most")
                .ok_or_else(|| malformed("limit entry is missing at_most"))?;
            let at_most = as_usize(at_most, "at_most")?;
            let where_ = get(mapping, "where")
                .ok_or_else(|| malformed("limit entry is missing a where clause"))?;
            limits.push(Limit::new(at_most, self.clause(where_)?));
        }
        Ok(LimitSet::new(limits))
    }

    /// Converts a clause operand, resolving `$`-placeholders.
    fn operand(&self, value: &Yaml) -> Result<Value, SpecError> {
        match value {
            Yaml::String(s) if Constants::is_placeholder(s) => {
                self.constants
                    .resolve(s)
                    .ok_or_else(|| SpecError::UnresolvedConstant { name: s.clone() })
            }
            Yaml::String(s) => Ok(Value::str(s)),
            Yaml::Bool(b) => Ok(Value::Bool(*b)),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else {
                    let f = n
                        .as_f64()
                        .ok_or_else(|| malformed(format!("unrepresentable number {n}")))?;
                    let d = Decimal::try_from(f)
                        .map_err(|_| malformed(format!("unrepresentable number {n}")))?;
                    Ok(Value::Decimal(d))
                }
            }
            Yaml::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| self.operand(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(items))
            }
            other => Err(malformed(format!("unsupported operand {other:?}"))),
        }
    }

    fn decimal(&self, value: &Yaml) -> Result<Decimal, SpecError> {
        match self.operand(value)? {
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Decimal(d) => Ok(d),
            Value::Str(s) => s
                .parse::<Decimal>()
                .map_err(|_| malformed(format!("expected a number, got {s:?}"))),
            other => Err(malformed(format!("expected a number, got {other}"))),
        }
    }
}

/// Loads a multicountable table: course identity (`SUBJ NUM` or crsid)
/// mapped to equivalence groups of requirement paths.
pub fn load_multicountable(doc: &Yaml) -> Result<MulticountableSet, SpecError> {
    let mapping = as_mapping(doc, "multicountable table")?;
    let mut set = MulticountableSet::new();
    for (identity, groups) in mapping {
        let identity = as_str(identity, "multicountable identity")?;
        for group in as_sequence(groups, "multicountable groups")? {
            let group: Vec<ReqPath> = as_sequence(group, "multicountable group")?
                .iter()
                .map(|req_path| {
                    as_sequence(req_path, "requirement path")?
                        .iter()
                        .map(|segment| {
                            Ok(as_str(segment, "requirement path segment")?.to_string())
                        })
                        .collect::<Result<ReqPath, SpecError>>()
                })
                .collect::<Result<_, _>>()?;
            set.register(identity, group);
        }
    }
    Ok(set)
}

fn requirement_definitions(value: &Yaml) -> Result<HashMap<String, RequirementDef>, SpecError> {
    let mapping = as_mapping(value, "requirements table")?;
    let mut definitions = HashMap::with_capacity(mapping.len());
    for (name, body) in mapping {
        let name = as_str(name, "requirement name")?.to_string();
        let body = as_mapping(body, "requirement definition")?;
        let audited = match get2(body, "department_audited", "department-audited") {
            Some(flag) => as_bool(flag, "department_audited")?,
            None => false,
        };
        definitions.insert(
            name,
            RequirementDef {
                result: get(body, "result").cloned(),
                audited,
            },
        );
    }
    Ok(definitions)
}

fn count_bound(value: &Yaml, items: usize) -> Result<usize, SpecError> {
    match value {
        Yaml::String(s) if s == "all" => Ok(items),
        Yaml::String(s) if s == "any" => Ok(1),
        _ => as_usize(value, "count"),
    }
}

fn grade_bound(value: &Yaml) -> Result<Decimal, SpecError> {
    match value {
        // `grade: B` means the 4.0-scale points of a B.
        Yaml::String(s) => Ok(reqsolve_core::Grade::letter(s).points),
        _ => {
            let n = value
                .as_f64()
                .ok_or_else(|| malformed(format!("expected a grade, got {value:?}")))?;
            Decimal::try_from(n).map_err(|_| malformed(format!("unrepresentable grade {n}")))
        }
    }
}

fn parse_operator(s: &str) -> Result<Operator, SpecError> {
    Operator::parse(s).ok_or_else(|| SpecError::UnknownOperator {
        operator: s.to_string(),
    })
}

fn get<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Yaml> {
    mapping.get(key)
}

fn get2<'a>(mapping: &'a Mapping, key: &str, alias: &str) -> Option<&'a Yaml> {
    get(mapping, key).or_else(|| get(mapping, alias))
}

fn single_entry<'a>(
    mapping: &'a Mapping,
    what: &str,
) -> Result<(&'a Yaml, &'a Yaml), SpecError> {
    let mut entries = mapping.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(malformed(format!("{what} must have exactly one entry"))),
    }
}

fn as_mapping<'a>(value: &'a Yaml, what: &str) -> Result<&'a Mapping, SpecError> {
    value
        .as_mapping()
        .ok_or_else(|| malformed(format!("{what} must be a mapping")))
}

fn as_sequence<'a>(value: &'a Yaml, what: &str) -> Result<&'a [Yaml], SpecError> {
    value
        .as_sequence()
        .map(Vec::as_slice)
        .ok_or_else(|| malformed(format!("{what} must be a list")))
}

fn as_str<'a>(value: &'a Yaml, what: &str) -> Result<&'a str, SpecError> {
    value
        .as_str()
        .ok_or_else(|| malformed(format!("{what} must be a string")))
}

fn as_bool(value: &Yaml, what: &str) -> Result<bool, SpecError> {
    value
        .as_bool()
        .ok_or_else(|| malformed(format!("{what} must be a boolean")))
}

fn as_usize(value: &Yaml, what: &str) -> Result<usize, SpecError> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| malformed(format!("{what} must be a non-negative integer")))
}

fn exactly_two<'a>(items: &'a [Yaml], what: &str) -> Result<&'a [Yaml], SpecError> {
    if items.len() == 2 {
        Ok(items)
    } else {
        Err(malformed(format!("{what} must list exactly two rules")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn load(source: &str) -> Rule {
        SpecLoader::new().load_str(source).unwrap()
    }

    #[test]
    fn test_load_course_rule() {
        let rule = load("{course: CSCI 251, grade: B, allow claimed: true}");
        let Rule::Course(course) = rule else {
            panic!("expected course rule");
        };
        assert_eq!(course.course, "CSCI 251");
        assert_eq!(course.grade, Some(Decimal::new(300, 2)));
        assert!(course.allow_claimed);
    }

    #[test]
    fn test_load_all_shape() {
        let rule = load("all: [{course: CSCI 251}, {course: CSCI 252}]");
        let Rule::Count(count) = rule else {
            panic!("expected count rule");
        };
        assert_eq!(count.count, 2);
        assert_eq!(count.items.len(), 2);
        assert_eq!(count.items[0].path().to_string(), "$.count[0]");
    }

    #[test]
    fn test_load_count_of_shape() {
        let rule = load("{count: 2, of: [{course: A 1}, {course: B 2}, {course: C 3}]}");
        let Rule::Count(count) = rule else {
            panic!("expected count rule");
        };
        assert_eq!(count.count, 2);

        let rule = load("{count: any, of: [{course: A 1}, {course: B 2}]}");
        let Rule::Count(count) = rule else {
            panic!("expected count rule");
        };
        assert_eq!(count.count, 1);
    }

    #[test]
    fn test_load_query_rule() {
        let rule = load(
            "{from: courses, where: {subject: {$eq: CSCI}}, \
             assert: {'count(courses)': {$gte: 2}}}",
        );
        let Rule::Query(query) = rule else {
            panic!("expected query rule");
        };
        assert_eq!(query.source, QuerySource::Courses);
        assert!(query.where_.is_some());
        assert_eq!(query.assertions.len(), 1);
        assert_eq!(
            query.assertions[0].path.to_string(),
            "$.assertions[0]"
        );
    }

    #[test]
    fn test_query_without_assertions_is_rejected() {
        let err = SpecLoader::new().load_str("from: courses").unwrap_err();
        assert!(matches!(err, SpecError::MissingAssertion { .. }));
    }

    #[test]
    fn test_load_limits() {
        let rule = load(
            "{from: courses, limit: [{at_most: 2, where: {level: {$eq: 100}}}], \
             assert: {'count(courses)': {$gte: 1}}}",
        );
        let Rule::Query(query) = rule else {
            panic!("expected query rule");
        };
        assert_eq!(query.limits.limits().len(), 1);
        assert_eq!(query.limits.limits()[0].at_most, 2);
    }

    #[test]
    fn test_load_requirement_reference() {
        let rule = load(
            "requirements:\n\
             \x20 Core:\n\
             \x20   result: {course: CSCI 251}\n\
             result:\n\
             \x20 all:\n\
             \x20   - requirement: Core\n",
        );
        let Rule::Count(count) = rule else {
            panic!("expected count rule");
        };
        let Rule::Reference(reference) = &count.items[0] else {
            panic!("expected reference rule");
        };
        assert_eq!(reference.name, "Core");
        assert_eq!(
            reference.requirement.path.to_string(),
            "$.count[0]%Core"
        );
    }

    #[test]
    fn test_unknown_requirement_is_rejected() {
        let err = SpecLoader::new()
            .load_str("requirement: Missing")
            .unwrap_err();
        assert!(matches!(err, SpecError::UnknownRequirement { .. }));
    }

    #[test]
    fn test_unreferenced_requirement_is_rejected() {
        let err = SpecLoader::new()
            .load_str(
                "requirements:\n\
                 \x20 Orphan:\n\
                 \x20   result: {course: CSCI 251}\n\
                 result: {course: CSCI 121}\n",
            )
            .unwrap_err();
        assert!(matches!(err, SpecError::UnreferencedRequirement { .. }));
    }

    #[test]
    fn test_cyclic_reference_is_rejected() {
        let err = SpecLoader::new()
            .load_str(
                "requirements:\n\
                 \x20 Loop:\n\
                 \x20   result: {requirement: Loop}\n\
                 result: {requirement: Loop}\n",
            )
            .unwrap_err();
        assert!(matches!(err, SpecError::CyclicReference { .. }));
    }

    #[test]
    fn test_constant_resolution() {
        let loader =
            SpecLoader::new().with_constants(Constants::new().with_matriculation_year(2015));
        let rule = loader
            .load_str(
                "{from: courses, where: {year: {$gte: $matriculation-year}}, \
                 assert: {'count(courses)': {$gte: 1}}}",
            )
            .unwrap();
        let Rule::Query(query) = rule else {
            panic!("expected query rule");
        };
        let Some(Clause::Single(predicate)) = &query.where_ else {
            panic!("expected single predicate");
        };
        assert_eq!(predicate.expected, Value::Int(2015));
    }

    #[test]
    fn test_unresolved_constant_is_rejected() {
        let err = SpecLoader::new()
            .load_str(
                "{from: courses, where: {year: {$gte: $matriculation-year}}, \
                 assert: {'count(courses)': {$gte: 1}}}",
            )
            .unwrap_err();
        assert!(matches!(err, SpecError::UnresolvedConstant { .. }));
    }

    #[test]
    fn test_multiple_clause_keys_combine_as_and() {
        let rule = load(
            "{from: courses, where: {subject: CSCI, level: {$gte: 200}}, \
             assert: {'count(courses)': {$gte: 1}}}",
        );
        let Rule::Query(query) = rule else {
            panic!("expected query rule");
        };
        assert!(matches!(query.where_, Some(Clause::And(ref parts)) if parts.len() == 2));
    }

    #[test]
    fn test_multiple_operators_on_one_key_are_rejected() {
        let err = SpecLoader::new()
            .load_str(
                "{from: courses, where: {subject: {$eq: CSCI, $neq: MATH}}, \
                 assert: {'count(courses)': {$gte: 1}}}",
            )
            .unwrap_err();
        assert!(matches!(err, SpecError::MultipleComparisons { ref key } if key == "subject"));
    }

    #[test]
    fn test_impossible_count_is_rejected_at_load() {
        let err = SpecLoader::new()
            .load_str("{count: 3, of: [{course: A 1}]}")
            .unwrap_err();
        assert!(matches!(err, SpecError::ImpossibleCountBound { .. }));
    }

    #[test]
    fn test_load_multicountable_table() {
        let doc: Yaml = serde_yaml::from_str(
            "CSCI 251:\n\
             \x20 - [[Major, Core], [Major, Electives]]\n",
        )
        .unwrap();
        let set = load_multicountable(&doc).unwrap();
        assert!(!set.is_empty());
    }
}

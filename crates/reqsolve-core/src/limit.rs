//! Limits bound combinatorial blow-up by capping matching items.
//!
//! A [`Limit`] says "at most N items matching this clause may appear
//! together in one candidate transcript". A [`LimitSet`] turns a filtered
//! transcript into the lazy sequence of capped candidate transcripts that
//! rule enumeration consumes.
//!
//! Limits can overlap in membership, so the per-limit enumeration alone is
//! not sound; every combined candidate is re-validated against all limits
//! before it is yielded (enumerate-then-validate).

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::clause::Clause;
use crate::combinatorics::Combinations;
use crate::data::CourseInstance;

/// A cap on how many items matching `where_` may co-occur.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Limit {
    pub at_most: usize,
    pub where_: Clause,
}

impl Limit {
    pub fn new(at_most: usize, where_: Clause) -> Self {
        Limit { at_most, where_ }
    }
}

/// An ordered collection of limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LimitSet {
    limits: Vec<Limit>,
}

impl LimitSet {
    pub fn new(limits: Vec<Limit>) -> Self {
        LimitSet { limits }
    }

    /// A set with no limits; passes every transcript through unchanged.
    pub fn none() -> Self {
        LimitSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn limits(&self) -> &[Limit] {
        &self.limits
    }

    /// Checks a combined item set against every limit simultaneously.
    pub fn check(&self, items: &[CourseInstance]) -> bool {
        self.limits
            .iter()
            .all(|limit| items.iter().filter(|c| limit.where_.apply(*c)).count() <= limit.at_most)
    }

    /// Lazily yields the distinct candidate transcripts.
    ///
    /// Items unmatched by any limit are always included whole. For each
    /// limit, every choice of `0..=at_most` of its matching items is tried
    /// independently; choices combine via Cartesian product, are
    /// re-validated against all limits (overlap handling), deduplicated by
    /// item-set identity, and yielded in deterministic order.
    ///
    /// With no limits, the input is yielded unchanged exactly once.
    pub fn limited_transcripts(&self, items: &[CourseInstance]) -> LimitedTranscripts<'_> {
        if self.is_empty() {
            return LimitedTranscripts::passthrough(self, items.to_vec());
        }

        let mut matched_by_limit: Vec<Vec<usize>> = Vec::with_capacity(self.limits.len());
        let mut matched_any: HashSet<usize> = HashSet::new();
        for limit in &self.limits {
            let matched: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, c)| limit.where_.apply(*c))
                .map(|(i, _)| i)
                .collect();
            matched_any.extend(matched.iter().copied());
            matched_by_limit.push(matched);
        }
        let unmatched: Vec<usize> = (0..items.len()).filter(|i| !matched_any.contains(i)).collect();

        // Per-limit choice lists are small (sum of C(n, 0..=at_most)); the
        // blow-up lives in the product, which stays lazy.
        let choices: Vec<Vec<Vec<usize>>> = matched_by_limit
            .iter()
            .zip(&self.limits)
            .map(|(matched, limit)| {
                let cap = limit.at_most.min(matched.len());
                (0..=cap)
                    .flat_map(|size| Combinations::new(matched.len(), size))
                    .map(|combo| combo.into_iter().map(|j| matched[j]).collect())
                    .collect()
            })
            .collect();

        LimitedTranscripts {
            set: self,
            items: items.to_vec(),
            unmatched,
            choices,
            odometer: None,
            seen: HashSet::new(),
            passthrough: false,
            exhausted: false,
        }
    }
}

/// Lazy iterator over capped candidate transcripts. See
/// [`LimitSet::limited_transcripts`].
pub struct LimitedTranscripts<'a> {
    set: &'a LimitSet,
    items: Vec<CourseInstance>,
    unmatched: Vec<usize>,
    choices: Vec<Vec<Vec<usize>>>,
    // One counter per limit; None means not started.
    odometer: Option<Vec<usize>>,
    seen: HashSet<Vec<usize>>,
    passthrough: bool,
    exhausted: bool,
}

impl<'a> LimitedTranscripts<'a> {
    fn passthrough(set: &'a LimitSet, items: Vec<CourseInstance>) -> Self {
        LimitedTranscripts {
            set,
            items,
            unmatched: Vec::new(),
            choices: Vec::new(),
            odometer: None,
            seen: HashSet::new(),
            passthrough: true,
            exhausted: false,
        }
    }

    fn advance(&mut self) -> bool {
        let Some(odometer) = self.odometer.as_mut() else {
            self.odometer = Some(vec![0; self.choices.len()]);
            return true;
        };
        for (pos, choice_list) in odometer.iter_mut().zip(&self.choices).rev() {
            *pos += 1;
            if *pos < choice_list.len() {
                return true;
            }
            *pos = 0;
        }
        false
    }

    fn current_candidate(&self) -> Vec<usize> {
        let odometer = self.odometer.as_ref().expect("odometer started");
        let mut selected: BTreeSet<usize> = self.unmatched.iter().copied().collect();
        for (pos, choice_list) in odometer.iter().zip(&self.choices) {
            selected.extend(choice_list[*pos].iter().copied());
        }
        selected.into_iter().collect()
    }
}

impl Iterator for LimitedTranscripts<'_> {
    type Item = Vec<CourseInstance>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.passthrough {
            self.exhausted = true;
            return Some(std::mem::take(&mut self.items));
        }
        loop {
            if !self.advance() {
                self.exhausted = true;
                return None;
            }
            let indices = self.current_candidate();
            if self.seen.contains(&indices) {
                continue;
            }
            let candidate: Vec<CourseInstance> =
                indices.iter().map(|&i| self.items[i].clone()).collect();
            // Overlapping limits: the per-limit enumeration cannot see that
            // one item counts against several limits, so re-check here.
            if !self.set.check(&candidate) {
                continue;
            }
            self.seen.insert(indices);
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{ClauseKey, Operator};

    fn course(clbid: &str, subject: &str, number: &str) -> CourseInstance {
        CourseInstance::new(clbid, format!("c-{}-{}", subject, number), subject, number)
    }

    fn level_limit(at_most: usize, level: i64) -> Limit {
        Limit::new(
            at_most,
            Clause::single(ClauseKey::Level, Operator::EqualTo, level),
        )
    }

    #[test]
    fn test_no_limits_yields_input_once() {
        let set = LimitSet::none();
        let items = vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")];
        let out: Vec<_> = set.limited_transcripts(&items).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], items);
    }

    #[test]
    fn test_at_most_one_of_three() {
        let set = LimitSet::new(vec![level_limit(1, 200)]);
        let items = vec![
            course("1", "CSCI", "251"),
            course("2", "CSCI", "252"),
            course("3", "CSCI", "253"),
        ];
        let out: Vec<_> = set.limited_transcripts(&items).collect();
        // Empty subset plus the three singletons; never a pair.
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|t| t.len() <= 1));
        let singletons: Vec<_> = out.iter().filter(|t| t.len() == 1).collect();
        assert_eq!(singletons.len(), 3);
    }

    #[test]
    fn test_unmatched_items_always_included() {
        let set = LimitSet::new(vec![level_limit(1, 200)]);
        let items = vec![course("1", "CSCI", "251"), course("2", "ART", "399")];
        let out: Vec<_> = set.limited_transcripts(&items).collect();
        // ART 399 (level 300) matches no limit and appears in every candidate.
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|t| t.iter().any(|c| c.course_code() == "ART 399")));
    }

    #[test]
    fn test_overlapping_limits_revalidated() {
        // Both limits match CSCI 251: it is level 200 AND subject CSCI.
        let set = LimitSet::new(vec![
            level_limit(1, 200),
            Limit::new(
                1,
                Clause::single(ClauseKey::Subject, Operator::EqualTo, "CSCI"),
            ),
        ]);
        let items = vec![course("1", "CSCI", "251"), course("2", "CSCI", "352")];
        let out: Vec<_> = set.limited_transcripts(&items).collect();
        // No candidate may hold two CSCI courses.
        for t in &out {
            assert!(t.iter().filter(|c| c.subject == "CSCI").count() <= 1);
        }
        // Candidates: {}, {251}, {352} - deduplicated by identity.
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_check_validates_all_limits() {
        let set = LimitSet::new(vec![level_limit(1, 200)]);
        let ok = vec![course("1", "CSCI", "251")];
        let too_many = vec![course("1", "CSCI", "251"), course("2", "CSCI", "252")];
        assert!(set.check(&ok));
        assert!(!set.check(&too_many));
    }
}

//! The per-audit claim ledger and shared lookup state.
//!
//! One [`RequirementContext`] exists per audited rule tree. The transcript
//! and declarations are fixed for the audit's lifetime; the claims map is
//! the only mutable state, held in a `RefCell` because the audit traversal
//! is single-threaded and solution enumeration holds shared borrows of the
//! transcript while audits record claims.
//!
//! A recorded claim is never removed except by an explicit reset or a
//! scoped [`probe`](RequirementContext::probe) restore.

use std::cell::RefCell;
use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::trace;

use crate::claim::{Claim, ClaimAttempt};
use crate::data::{AreaPointer, CourseInstance};
use crate::exception::Exception;
use crate::path::{ReqPath, RulePath};
use crate::value::{tuple_equivalent, Value};

/// Declared multicountable equivalence sets, keyed by course identity.
///
/// Each entry under an identity is one equivalence group; each path listed
/// in a group is a slot usable by exactly one claim.
#[derive(Debug, Clone, Default)]
pub struct MulticountableSet {
    map: HashMap<String, Vec<Vec<ReqPath>>>,
}

impl MulticountableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one equivalence group for a course identity (the `SUBJ
    /// NUM` code or a crsid).
    pub fn register(&mut self, identity: impl Into<String>, group: Vec<ReqPath>) {
        self.map.entry(identity.into()).or_default().push(group);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn groups_for(&self, identity: &str) -> Option<&Vec<Vec<ReqPath>>> {
        self.map.get(identity)
    }
}

/// Matches a declared slot path against a claimant's requirement path.
///
/// Exact equality first; otherwise the multicountable-equivalence tuple
/// mode (non-empty intersection plus subset in either direction), which is
/// deliberately stricter than plain clause application.
fn slot_matches(slot: &ReqPath, claimant: &ReqPath) -> bool {
    if slot == claimant {
        return true;
    }
    if slot.is_empty() || claimant.is_empty() {
        return false;
    }
    tuple_equivalent(
        &Value::str_tuple(slot.iter().cloned()),
        &Value::str_tuple(claimant.iter().cloned()),
    )
}

/// Snapshot of the claims map, for scoped save/restore.
#[derive(Debug, Clone)]
pub struct ClaimSnapshot(HashMap<String, Vec<Claim>>);

/// Per-audit mutable ledger plus fixed lookup state.
#[derive(Debug)]
pub struct RequirementContext {
    transcript: Vec<CourseInstance>,
    areas: Vec<AreaPointer>,
    multicountable: MulticountableSet,
    exceptions: Vec<Exception>,
    by_clbid: HashMap<String, usize>,
    claims: RefCell<HashMap<String, Vec<Claim>>>,
}

impl RequirementContext {
    /// Creates a context over a transcript. The transcript is sorted once
    /// so enumeration order is deterministic.
    pub fn new(mut transcript: Vec<CourseInstance>, areas: Vec<AreaPointer>) -> Self {
        transcript.sort();
        let by_clbid = transcript
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clbid.clone(), i))
            .collect();
        RequirementContext {
            transcript,
            areas,
            multicountable: MulticountableSet::new(),
            exceptions: Vec::new(),
            by_clbid,
            claims: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_multicountable(mut self, multicountable: MulticountableSet) -> Self {
        self.multicountable = multicountable;
        self
    }

    pub fn with_exceptions(mut self, exceptions: Vec<Exception>) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn transcript(&self) -> &[CourseInstance] {
        &self.transcript
    }

    pub fn areas(&self) -> &[AreaPointer] {
        &self.areas
    }

    pub fn find_course_by_clbid(&self, clbid: &str) -> Option<&CourseInstance> {
        self.by_clbid.get(clbid).map(|&i| &self.transcript[i])
    }

    /// All transcript lines with the given `SUBJ NUM` code, in transcript
    /// order.
    pub fn find_courses_by_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CourseInstance> {
        self.transcript.iter().filter(move |c| c.course_code() == code)
    }

    // -- exceptions --------------------------------------------------------

    pub fn forced_pass_at(&self, path: &RulePath) -> bool {
        self.exceptions
            .iter()
            .any(|e| matches!(e, Exception::Override { path: p } if p == path))
    }

    pub fn value_override_at(&self, path: &RulePath) -> Option<Decimal> {
        self.exceptions.iter().find_map(|e| match e {
            Exception::Value { path: p, value } if p == path => Some(*value),
            _ => None,
        })
    }

    pub fn inserted_clbids_at(&self, path: &RulePath) -> Vec<&str> {
        self.exceptions
            .iter()
            .filter_map(|e| match e {
                Exception::Insert { path: p, clbid } if p == path => Some(clbid.as_str()),
                _ => None,
            })
            .collect()
    }

    // -- claims ------------------------------------------------------------

    /// Attempts to claim `course` for the rule at `path`.
    ///
    /// Steps, in order:
    /// 1. `allow_claimed` succeeds without recording anything.
    /// 2. A course with no prior claims is recorded and succeeds.
    /// 3. With prior claims and no applicable multicountable group, the
    ///    attempt conflicts with every prior claim and fails.
    /// 4. Within an applicable group, the claimant must match one of the
    ///    listed slot paths; no match behaves like step 3.
    /// 5. A slot already consumed by a prior claim fails; otherwise the
    ///    claim is recorded against that slot.
    pub fn make_claim(
        &self,
        course: &CourseInstance,
        path: &RulePath,
        allow_claimed: bool,
    ) -> ClaimAttempt {
        let claim = Claim::new(
            course.clbid.clone(),
            course.crsid.clone(),
            course.course_code(),
            path.clone(),
        );

        if allow_claimed {
            trace!(course = %course, path = %path, "claim allowed without exclusivity");
            return ClaimAttempt::succeeded(claim);
        }

        let mut claims = self.claims.borrow_mut();
        let prior = claims.entry(course.clbid.clone()).or_default();

        if prior.is_empty() {
            trace!(course = %course, path = %path, "first claim recorded");
            prior.push(claim.clone());
            return ClaimAttempt::succeeded(claim);
        }

        let claimant = claim.claimant_requirements();
        let groups = self
            .multicountable
            .groups_for(&course.course_code())
            .or_else(|| self.multicountable.groups_for(&course.crsid));

        let Some(groups) = groups else {
            trace!(course = %course, path = %path, "claim conflict: not multicountable");
            return ClaimAttempt::failed(claim, prior.clone());
        };

        let matched_slot = groups
            .iter()
            .flatten()
            .find(|slot| slot_matches(slot, &claimant));

        let Some(slot) = matched_slot else {
            trace!(course = %course, path = %path, "claim conflict: no matching slot");
            return ClaimAttempt::failed(claim, prior.clone());
        };

        // A concrete slot may be consumed only once.
        let slot_users: Vec<Claim> = prior
            .iter()
            .filter(|c| slot_matches(slot, &c.claimant_requirements()))
            .cloned()
            .collect();
        if !slot_users.is_empty() {
            trace!(course = %course, path = %path, "claim conflict: slot already used");
            return ClaimAttempt::failed(claim, slot_users);
        }

        trace!(course = %course, path = %path, "multicountable claim recorded");
        prior.push(claim.clone());
        ClaimAttempt::succeeded(claim)
    }

    /// All claims recorded so far, in no particular order.
    pub fn all_claims(&self) -> Vec<Claim> {
        self.claims.borrow().values().flatten().cloned().collect()
    }

    pub fn claims_for(&self, clbid: &str) -> Vec<Claim> {
        self.claims.borrow().get(clbid).cloned().unwrap_or_default()
    }

    /// Clears all claims; used between independent candidate solutions.
    pub fn reset_claims(&self) {
        self.claims.borrow_mut().clear();
    }

    /// Snapshots the current claims (cheap structural copy).
    pub fn checkpoint(&self) -> ClaimSnapshot {
        ClaimSnapshot(self.claims.borrow().clone())
    }

    /// Restores a snapshot taken by [`checkpoint`](Self::checkpoint).
    pub fn restore(&self, snapshot: ClaimSnapshot) {
        *self.claims.borrow_mut() = snapshot.0;
    }

    /// Runs `f` against the ledger and restores the prior claims
    /// afterwards, regardless of outcome. Used when probing alternative
    /// branches that must not pollute the shared ledger.
    pub fn probe<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let snapshot = self.checkpoint();
        let result = f(self);
        self.restore(snapshot);
        result
    }
}

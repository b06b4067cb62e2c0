//! Claims bind transcript courses to requirement paths.

use serde::Serialize;

use crate::path::{ReqPath, RulePath};

/// A recorded binding of one course-line to one claimant path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claim {
    /// The claimed course-line id.
    pub clbid: String,
    /// The cross-term course identity of the claimed line.
    pub crsid: String,
    /// The `SUBJ NUM` code of the claimed line.
    pub course_code: String,
    /// The full rule path that made the claim.
    pub claimed_by: RulePath,
}

impl Claim {
    pub fn new(
        clbid: impl Into<String>,
        crsid: impl Into<String>,
        course_code: impl Into<String>,
        claimed_by: RulePath,
    ) -> Self {
        Claim {
            clbid: clbid.into(),
            crsid: crsid.into(),
            course_code: course_code.into(),
            claimed_by,
        }
    }

    /// The claimant's requirement segments; the unit of multicountable
    /// slot matching.
    pub fn claimant_requirements(&self) -> ReqPath {
        self.claimed_by.requirement_segments()
    }
}

/// The outcome of one `make_claim` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimAttempt {
    pub claim: Claim,
    /// Prior claims this attempt collided with (empty on success).
    pub conflict_with: Vec<Claim>,
    pub did_fail: bool,
}

impl ClaimAttempt {
    pub fn succeeded(claim: Claim) -> Self {
        ClaimAttempt {
            claim,
            conflict_with: Vec::new(),
            did_fail: false,
        }
    }

    pub fn failed(claim: Claim, conflict_with: Vec<Claim>) -> Self {
        ClaimAttempt {
            claim,
            conflict_with,
            did_fail: true,
        }
    }

    pub fn ok(&self) -> bool {
        !self.did_fail
    }
}

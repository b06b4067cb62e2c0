//! The best-result search loop.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use reqsolve_core::RequirementContext;
use reqsolve_rules::{Rule, RuleResult};

/// How often the search loop reports progress, in audited solutions.
const PROGRESS_INTERVAL: u64 = 1_000;

/// One completed audit: the best result found and how much work it took.
#[derive(Debug)]
pub struct Audit {
    pub result: RuleResult,
    pub iterations: u64,
    pub elapsed: Duration,
}

/// The terminal state of a solution search.
#[derive(Debug)]
pub enum SolveOutcome {
    /// A fully passing result was found; the search stopped there.
    Satisfied(Audit),
    /// The solution space was exhausted without a passing result; this is
    /// the highest-ranked audit seen.
    BestEffort(Audit),
    /// The rule produced no solutions at all, so nothing was audited.
    /// Distinct from "audits ran and none passed".
    NoAuditsCompleted,
}

impl SolveOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, SolveOutcome::Satisfied(_))
    }

    /// The best audit, if any audit completed.
    pub fn best(&self) -> Option<&Audit> {
        match self {
            SolveOutcome::Satisfied(audit) | SolveOutcome::BestEffort(audit) => Some(audit),
            SolveOutcome::NoAuditsCompleted => None,
        }
    }

    pub fn into_best(self) -> Option<Audit> {
        match self {
            SolveOutcome::Satisfied(audit) | SolveOutcome::BestEffort(audit) => Some(audit),
            SolveOutcome::NoAuditsCompleted => None,
        }
    }
}

/// Upper bound on how many solutions `rule` will enumerate against `ctx`.
///
/// Worth calling before [`find_best_solution`] when the caller wants to
/// refuse pathologically large searches up front.
pub fn estimate(rule: &Rule, ctx: &RequirementContext) -> u64 {
    rule.estimate(ctx)
}

/// Audits solutions one at a time until one passes or the space is
/// exhausted.
///
/// The ledger is reset before each audit, so every candidate sees a clean
/// slate. The first result seen becomes `best`; a later result replaces
/// it only when its rank is strictly greater. A passing result ends the
/// search immediately even if a later candidate might rank higher.
pub fn find_best_solution(rule: &Rule, ctx: &RequirementContext) -> SolveOutcome {
    let started = Instant::now();
    let estimate = rule.estimate(ctx);
    info!(estimate, "starting solution search");

    let mut best: Option<RuleResult> = None;
    let mut iterations: u64 = 0;

    for solution in rule.solutions(ctx) {
        iterations += 1;
        ctx.reset_claims();
        let result = solution.audit(ctx);
        trace!(iterations, rank = %result.rank().value(), ok = result.ok(), "audited solution");

        if result.ok() {
            info!(iterations, elapsed = ?started.elapsed(), "found a passing result");
            return SolveOutcome::Satisfied(Audit {
                result,
                iterations,
                elapsed: started.elapsed(),
            });
        }

        match &best {
            Some(current) if result.rank() <= current.rank() => {}
            _ => best = Some(result),
        }

        if iterations % PROGRESS_INTERVAL == 0 {
            debug!(iterations, estimate, "still searching");
        }
    }

    match best {
        Some(result) => {
            info!(
                iterations,
                rank = %result.rank().value(),
                max_rank = %result.max_rank().value(),
                "exhausted solution space without a passing result"
            );
            SolveOutcome::BestEffort(Audit {
                result,
                iterations,
                elapsed: started.elapsed(),
            })
        }
        None => {
            info!("rule produced no solutions");
            SolveOutcome::NoAuditsCompleted
        }
    }
}

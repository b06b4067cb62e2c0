//! Count rules: "N of these M sub-rules".

use serde::Serialize;

use reqsolve_core::combinatorics::Combinations;
use reqsolve_core::{Rank, RequirementContext, RulePath};

use crate::load::SpecError;
use crate::rule::{AssertionRule, Rule, SolutionStream};
use crate::solution::{CountItem, CountSolution, Solution};
use crate::stream::SolutionProduct;

/// A rule satisfied when at least `count` of its `items` are satisfied.
///
/// Covers the `all` / `any` / `both` / `either` / `N of M` shapes, plus an
/// optional "at most" cap on how many selections are attempted and
/// optional post-audit assertions over the children's claimed courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRule {
    pub path: RulePath,
    pub count: usize,
    pub items: Vec<Rule>,
    pub at_most: bool,
    pub audit_clauses: Vec<AssertionRule>,
}

impl CountRule {
    pub fn new(path: RulePath, count: usize, items: Vec<Rule>) -> Self {
        CountRule {
            path,
            count,
            items,
            at_most: false,
            audit_clauses: Vec::new(),
        }
    }

    pub fn with_at_most(mut self, at_most: bool) -> Self {
        self.at_most = at_most;
        self
    }

    pub fn with_audit_clauses(mut self, audit_clauses: Vec<AssertionRule>) -> Self {
        self.audit_clauses = audit_clauses;
        self
    }

    fn selection_sizes(&self) -> (usize, usize) {
        let lo = self.count;
        let hi = if self.at_most {
            lo + 1
        } else {
            self.items.len() + 1
        };
        (lo, hi.max(lo + 1))
    }

    /// Enumerates one combined solution per (selection size, child
    /// combination, tuple of child solutions). Unchosen children are
    /// carried verbatim so results can still report them.
    pub fn solutions<'a>(&'a self, ctx: &'a RequirementContext) -> SolutionStream<'a> {
        let (lo, hi) = self.selection_sizes();
        Box::new(CountSolutions {
            rule: self,
            ctx,
            size: lo,
            hi,
            combos: Combinations::new(self.items.len(), lo),
            combo: None,
            product: None,
            yielded_any: false,
            fallback_emitted: false,
            done: false,
        })
    }

    pub fn estimate(&self, ctx: &RequirementContext) -> u64 {
        let (lo, hi) = self.selection_sizes();
        let child_estimates: Vec<u64> = self.items.iter().map(|r| r.estimate(ctx)).collect();
        let mut total: u64 = 0;
        for size in lo..hi {
            for combo in Combinations::new(self.items.len(), size) {
                let product = combo
                    .iter()
                    .map(|&i| child_estimates[i])
                    .fold(1u64, |acc, e| acc.saturating_mul(e));
                total = total.saturating_add(product);
            }
        }
        // The degenerate fallback guarantees at least one solution.
        total.max(1)
    }

    pub fn max_rank(&self) -> Rank {
        let mut child_maxes: Vec<Rank> = self.items.iter().map(|r| r.max_rank()).collect();
        let assertions: Rank = self.audit_clauses.iter().map(|a| a.max_rank()).sum();
        shaped_max(self.count, &mut child_maxes) + assertions
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.count > self.items.len() || (self.count == 0 && !self.items.is_empty()) {
            return Err(SpecError::ImpossibleCountBound {
                path: self.path.clone(),
                count: self.count,
                items: self.items.len(),
            });
        }
        Ok(())
    }
}

/// The best-possible score of a count shape.
///
/// "any" (1-of-M) can only ever bank its single best child; other shapes
/// bank their `count` best children. A naive all-children sum would make
/// `either` (1-of-2) report an unreachable maximum.
pub(crate) fn shaped_max(count: usize, child_maxes: &mut [Rank]) -> Rank {
    child_maxes.sort();
    child_maxes.reverse();
    if count == 1 {
        child_maxes.first().copied().unwrap_or(Rank::ZERO)
    } else {
        child_maxes.iter().take(count).copied().sum()
    }
}

struct CountSolutions<'a> {
    rule: &'a CountRule,
    ctx: &'a RequirementContext,
    size: usize,
    hi: usize,
    combos: Combinations,
    combo: Option<Vec<usize>>,
    product: Option<SolutionProduct<'a>>,
    yielded_any: bool,
    fallback_emitted: bool,
    done: bool,
}

impl CountSolutions<'_> {
    fn build(&self, combo: &[usize], tuple: Vec<Solution>) -> Solution {
        let mut chosen = combo.iter().zip(tuple);
        let mut next_chosen = chosen.next();
        let mut items = Vec::with_capacity(self.rule.items.len());
        for (index, rule) in self.rule.items.iter().enumerate() {
            match next_chosen.take() {
                Some((&chosen_index, solution)) if chosen_index == index => {
                    items.push(CountItem::Solved(solution));
                    next_chosen = chosen.next();
                }
                other => {
                    next_chosen = other;
                    items.push(CountItem::Skipped(rule.clone()));
                }
            }
        }
        Solution::Count(CountSolution {
            path: self.rule.path.clone(),
            count: self.rule.count,
            at_most: self.rule.at_most,
            audit_clauses: self.rule.audit_clauses.clone(),
            items,
        })
    }

    fn fallback(&self) -> Solution {
        Solution::Count(CountSolution {
            path: self.rule.path.clone(),
            count: self.rule.count,
            at_most: self.rule.at_most,
            audit_clauses: self.rule.audit_clauses.clone(),
            items: self
                .rule
                .items
                .iter()
                .map(|r| CountItem::Skipped(r.clone()))
                .collect(),
        })
    }
}

impl Iterator for CountSolutions<'_> {
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        loop {
            if self.done {
                // Never hand the caller an empty sequence; progress
                // reporting always has something to compare against.
                if !self.yielded_any && !self.fallback_emitted {
                    self.fallback_emitted = true;
                    return Some(self.fallback());
                }
                return None;
            }

            if let Some(product) = self.product.as_mut() {
                if let Some(tuple) = product.next() {
                    self.yielded_any = true;
                    let combo = self.combo.as_deref().unwrap_or_default().to_vec();
                    return Some(self.build(&combo, tuple));
                }
                self.product = None;
                self.combo = None;
            }

            match self.combos.next() {
                Some(combo) => {
                    let rules: Vec<&Rule> = combo.iter().map(|&i| &self.rule.items[i]).collect();
                    if let Some(product) = SolutionProduct::new(self.ctx, rules) {
                        self.combo = Some(combo);
                        self.product = Some(product);
                    }
                    // A combo whose product is empty is skipped entirely.
                }
                None => {
                    self.size += 1;
                    if self.size >= self.hi {
                        self.done = true;
                    } else {
                        self.combos = Combinations::new(self.rule.items.len(), self.size);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::CourseRule;

    fn course_rule(code: &str) -> Rule {
        Rule::Course(CourseRule::new(RulePath::root().append_index(0), code))
    }

    fn ctx() -> RequirementContext {
        RequirementContext::new(vec![], vec![])
    }

    #[test]
    fn test_all_of_two_enumerates_supersets() {
        let rule = CountRule::new(
            RulePath::root(),
            2,
            vec![course_rule("CSCI 251"), course_rule("CSCI 252")],
        );
        let ctx = ctx();
        // 2-of-2: only the full selection.
        assert_eq!(rule.solutions(&ctx).count(), 1);
        assert_eq!(rule.estimate(&ctx), 1);
    }

    #[test]
    fn test_any_of_three_counts_supersets() {
        let rule = CountRule::new(
            RulePath::root(),
            1,
            vec![
                course_rule("A 101"),
                course_rule("B 102"),
                course_rule("C 103"),
            ],
        );
        let ctx = ctx();
        // Sizes 1..=3: C(3,1)+C(3,2)+C(3,3) = 7 selections, one solution
        // tuple each (course rules have single-solution streams).
        assert_eq!(rule.solutions(&ctx).count(), 7);
        assert_eq!(rule.estimate(&ctx), 7);
    }

    #[test]
    fn test_at_most_caps_selection_size() {
        let rule = CountRule::new(
            RulePath::root(),
            1,
            vec![
                course_rule("A 101"),
                course_rule("B 102"),
                course_rule("C 103"),
            ],
        )
        .with_at_most(true);
        let ctx = ctx();
        // Only size-1 selections.
        assert_eq!(rule.solutions(&ctx).count(), 3);
        assert_eq!(rule.estimate(&ctx), 3);
    }

    #[test]
    fn test_zero_children_yields_degenerate_fallback() {
        let rule = CountRule::new(RulePath::root(), 0, vec![]);
        let ctx = ctx();
        let solutions: Vec<_> = rule.solutions(&ctx).collect();
        assert_eq!(solutions.len(), 1);
        assert!(rule.estimate(&ctx) >= 1);
    }

    #[test]
    fn test_unchosen_children_carried_verbatim() {
        let rule = CountRule::new(
            RulePath::root(),
            1,
            vec![course_rule("A 101"), course_rule("B 102")],
        )
        .with_at_most(true);
        let ctx = ctx();
        for solution in rule.solutions(&ctx) {
            let Solution::Count(count) = solution else {
                panic!("expected count solution");
            };
            assert_eq!(count.items.len(), 2);
            let solved = count
                .items
                .iter()
                .filter(|i| matches!(i, CountItem::Solved(_)))
                .count();
            assert_eq!(solved, 1);
        }
    }

    #[test]
    fn test_validate_impossible_bounds() {
        let rule = CountRule::new(RulePath::root(), 3, vec![course_rule("A 101")]);
        assert!(rule.validate().is_err());

        let rule = CountRule::new(RulePath::root(), 1, vec![course_rule("A 101")]);
        assert!(rule.validate().is_ok());
        // Idempotent: validating again changes nothing and still passes.
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_shaped_max_for_any_and_both() {
        // "either" (1-of-2) banks only its best child.
        let mut maxes = vec![Rank::ONE, Rank::ONE];
        assert_eq!(shaped_max(1, &mut maxes), Rank::ONE);

        // "both" (2-of-2) banks both.
        let mut maxes = vec![Rank::ONE, Rank::ONE];
        assert_eq!(shaped_max(2, &mut maxes), Rank::of(2));

        // 2-of-3 banks the two largest.
        let mut maxes = vec![Rank::of(3), Rank::ONE, Rank::of(2)];
        assert_eq!(shaped_max(2, &mut maxes), Rank::of(5));
    }
}

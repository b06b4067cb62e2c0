//! Lazy solution-stream composition.
//!
//! Count rules combine their children's solution streams with a Cartesian
//! product. Streams are restartable (a rule can always re-enumerate), so
//! the product advances odometer-style: bump the rightmost stream, restart
//! everything to its right.

use reqsolve_core::RequirementContext;

use crate::rule::Rule;
use crate::solution::Solution;

/// Cartesian product over the solution streams of a set of rules.
///
/// Yields one `Vec<Solution>` per tuple, in order. The product of zero
/// rules yields a single empty tuple. Returns `None` from
/// [`SolutionProduct::new`] when any rule's stream is empty, since the
/// whole product would be empty.
pub struct SolutionProduct<'a> {
    ctx: &'a RequirementContext,
    rules: Vec<&'a Rule>,
    streams: Vec<Box<dyn Iterator<Item = Solution> + 'a>>,
    current: Vec<Solution>,
    started: bool,
    done: bool,
}

impl<'a> SolutionProduct<'a> {
    pub fn new(ctx: &'a RequirementContext, rules: Vec<&'a Rule>) -> Option<Self> {
        let mut streams = Vec::with_capacity(rules.len());
        let mut current = Vec::with_capacity(rules.len());
        for rule in &rules {
            let mut stream = rule.solutions(ctx);
            current.push(stream.next()?);
            streams.push(stream);
        }
        Some(SolutionProduct {
            ctx,
            rules,
            streams,
            current,
            started: false,
            done: false,
        })
    }
}

impl Iterator for SolutionProduct<'_> {
    type Item = Vec<Solution>;

    fn next(&mut self) -> Option<Vec<Solution>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }
        // Advance the rightmost stream that still has a next solution,
        // restarting every stream to its right.
        let len = self.rules.len();
        for i in (0..len).rev() {
            if let Some(solution) = self.streams[i].next() {
                self.current[i] = solution;
                for j in i + 1..len {
                    let mut stream = self.rules[j].solutions(self.ctx);
                    match stream.next() {
                        Some(first) => {
                            self.current[j] = first;
                            self.streams[j] = stream;
                        }
                        // A stream that was non-empty must restart
                        // non-empty; treat anything else as exhaustion.
                        None => {
                            self.done = true;
                            return None;
                        }
                    }
                }
                return Some(self.current.clone());
            }
        }
        self.done = true;
        None
    }
}

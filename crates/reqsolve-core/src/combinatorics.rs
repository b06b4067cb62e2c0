//! Restartable combination iteration and counting.
//!
//! Candidate enumeration never materializes more than the driver pulls, so
//! these are plain pull-based iterators over index vectors, plus the closed
//! forms used by solution-space estimates.

/// Lazily yields all size-`r` index combinations of `0..n`, in
/// lexicographic order (which preserves the original item order inside
/// each combination).
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    r: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, r: usize) -> Self {
        Combinations {
            n,
            r,
            indices: (0..r).collect(),
            started: false,
            done: r > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }
        // Advance the rightmost index that still has room.
        let r = self.r;
        if r == 0 {
            self.done = true;
            return None;
        }
        let mut i = r;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] != i + self.n - r {
                break;
            }
        }
        self.indices[i] += 1;
        for j in i + 1..r {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

/// The binomial coefficient `C(n, r)`, saturating at `u64::MAX`.
pub fn binomial(n: usize, r: usize) -> u64 {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    let mut result: u64 = 1;
    for i in 0..r {
        result = match result.checked_mul((n - i) as u64) {
            Some(v) => v / (i as u64 + 1),
            None => return u64::MAX,
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_of_three_choose_two() {
        let combos: Vec<_> = Combinations::new(3, 2).collect();
        assert_eq!(combos, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn test_choose_zero_yields_one_empty() {
        let combos: Vec<_> = Combinations::new(3, 0).collect();
        assert_eq!(combos, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_choose_more_than_n_is_empty() {
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn test_preserves_index_order() {
        for combo in Combinations::new(5, 3) {
            assert!(combo.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(3, 5), 0);
        assert_eq!(binomial(60, 30), 118264581564861424);
    }

    #[test]
    fn test_binomial_matches_enumeration() {
        for n in 0..8 {
            for r in 0..=n {
                assert_eq!(binomial(n, r), Combinations::new(n, r).count() as u64);
            }
        }
    }
}

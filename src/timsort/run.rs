use super::Meter;

/// A sorted stretch `v[start..start + len]` on the run stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimSortRun {
    pub start: usize,
    pub len: usize,
}

impl TimSortRun {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Resumable search for the natural run starting at `start`.
#[derive(Clone, Copy, Debug)]
pub(super) struct Streak {
    pub start: usize,
    /// First index not known to belong to the run.
    pub end: usize,
    pub descending: bool,
}

impl Streak {
    pub fn new(start: usize) -> Self {
        Self {
            start,
            end: start + 1,
            descending: false,
        }
    }

    /// Extends the streak until it ends or the meter runs out. Returns true once the streak is
    /// complete. Streaks can be non-descending or strictly descending, only the latter may be
    /// reversed without breaking stability.
    pub fn advance<T, F>(&mut self, v: &[T], meter: &mut Meter<'_, F>) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        let len = v.len();

        if self.end == self.start + 1 {
            if self.end == len {
                return true;
            }

            self.descending = meter.is_less(&v[self.end], &v[self.start]);
            self.end += 1;
        }

        while self.end < len {
            if meter.exhausted() {
                return false;
            }

            let end = self.end;
            let in_streak = if self.descending {
                meter.is_less(&v[end], &v[end - 1])
            } else {
                !meter.is_less(&v[end], &v[end - 1])
            };

            if !in_streak {
                break;
            }
            self.end += 1;
        }

        true
    }
}

/// Resumable reversal of a strictly descending streak.
#[derive(Clone, Copy, Debug)]
pub(super) struct Reversal {
    pub start: usize,
    pub end: usize,
    lo: usize,
    hi: usize,
}

impl Reversal {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            lo: start,
            hi: end,
        }
    }

    pub fn advance<T, F>(&mut self, v: &mut [T], meter: &mut Meter<'_, F>) -> bool {
        while self.lo + 1 < self.hi {
            if meter.exhausted() {
                return false;
            }

            self.hi -= 1;
            v.swap(self.lo, self.hi);
            self.lo += 1;
            meter.charge(1);
        }

        true
    }
}

/// Resumable binary insertion sort, growing the sorted `v[start..next]` up to `v[start..end]`.
#[derive(Clone, Copy, Debug)]
pub(super) struct Extension {
    pub start: usize,
    pub end: usize,
    next: usize,
}

impl Extension {
    pub fn new(start: usize, sorted_end: usize, end: usize) -> Self {
        debug_assert!(start < sorted_end && sorted_end <= end);

        Self {
            start,
            end,
            next: sorted_end,
        }
    }

    pub fn advance<T, F>(&mut self, v: &mut [T], meter: &mut Meter<'_, F>) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        while self.next < self.end {
            if meter.exhausted() {
                return false;
            }

            let next = self.next;

            // Find the first element greater than v[next], equal elements stay in front of it.
            let mut lo = self.start;
            let mut hi = next;
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if meter.is_less(&v[next], &v[mid]) {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }

            v[lo..=next].rotate_right(1);
            meter.charge(next - lo);
            self.next += 1;
        }

        true
    }
}

/// Computes the minimum length of a run, such that `len / min_run` is a power of two or slightly
/// less. For `len < 64` the whole input becomes a single insertion sorted run.
pub(super) fn min_run_len(mut len: usize) -> usize {
    let mut rest = 0;
    while len >= 64 {
        rest |= len & 1;
        len >>= 1;
    }
    len + rest
}

// Examines the stack of runs and identifies the next pair of runs to merge. More specifically,
// if `Some(r)` is returned, that means `runs[r]` and `runs[r + 1]` must be merged next. If the
// algorithm should continue building a new run instead, `None` is returned.
//
// TimSort is infamous for its buggy implementations, as described here:
// http://envisage-project.eu/timsort-specification-and-verification/
//
// The gist of the story is: we must enforce the invariants on the top four runs on the stack.
// Enforcing them on just top three is not sufficient to ensure that the invariants will still
// hold for *all* runs in the stack.
//
// This function correctly checks invariants for the top four runs. Additionally, if the top
// run ends at stop, it will always demand a merge operation until the stack is fully
// collapsed, in order to complete the sort.
pub(super) fn collapse(runs: &[TimSortRun], stop: usize) -> Option<usize> {
    let n = runs.len();
    if n >= 2
        && (runs[n - 1].end() == stop
            || runs[n - 2].len <= runs[n - 1].len
            || (n >= 3 && runs[n - 3].len <= runs[n - 2].len + runs[n - 1].len)
            || (n >= 4 && runs[n - 4].len <= runs[n - 3].len + runs[n - 2].len))
    {
        if n >= 3 && runs[n - 3].len < runs[n - 1].len {
            Some(n - 3)
        } else {
            Some(n - 2)
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlimited<F>(is_less: &mut F) -> Meter<'_, F> {
        Meter::new(is_less, usize::MAX)
    }

    #[test]
    fn streak_ascending_with_equal() {
        let v = [1, 2, 2, 3, 1];
        let mut is_less = |a: &i32, b: &i32| a < b;
        let mut streak = Streak::new(0);

        assert!(streak.advance(&v, &mut unlimited(&mut is_less)));
        assert_eq!(streak.end, 4);
        assert!(!streak.descending);
    }

    #[test]
    fn streak_descending_is_strict() {
        let v = [5, 4, 4, 1];
        let mut is_less = |a: &i32, b: &i32| a < b;
        let mut streak = Streak::new(0);

        assert!(streak.advance(&v, &mut unlimited(&mut is_less)));
        assert_eq!(streak.end, 2);
        assert!(streak.descending);
    }

    #[test]
    fn streak_single_element() {
        let v = [1, 2, 9];
        let mut is_less = |a: &i32, b: &i32| a < b;
        let mut streak = Streak::new(2);

        assert!(streak.advance(&v, &mut unlimited(&mut is_less)));
        assert_eq!(streak.end, 3);
    }

    #[test]
    fn streak_resumes() {
        let v: Vec<i32> = (0..100).collect();
        let mut is_less = |a: &i32, b: &i32| a < b;
        let mut streak = Streak::new(0);

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut meter = Meter::new(&mut is_less, 10);
            if streak.advance(&v, &mut meter) {
                break;
            }
            assert!(meter.comparisons() <= 11);
        }

        assert_eq!(streak.end, 100);
        assert!(rounds >= 9);
    }

    #[test]
    fn reversal_in_small_budgets() {
        let mut v: Vec<i32> = (0..11).rev().collect();
        let mut is_less = |a: &i32, b: &i32| a < b;
        let mut reversal = Reversal::new(0, v.len());

        while !reversal.advance(&mut v, &mut Meter::new(&mut is_less, 2)) {}

        assert_eq!(v, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn extension_is_stable() {
        let mut v = vec![(1, 'a'), (3, 'a'), (2, 'a'), (1, 'b'), (3, 'b'), (0, 'a')];
        let mut is_less = |a: &(i32, char), b: &(i32, char)| a.0 < b.0;
        let mut extension = Extension::new(0, 2, v.len());

        assert!(extension.advance(&mut v, &mut unlimited(&mut is_less)));
        assert_eq!(
            v,
            [(0, 'a'), (1, 'a'), (1, 'b'), (2, 'a'), (3, 'a'), (3, 'b')]
        );
    }

    #[test]
    fn min_run_bounds() {
        assert_eq!(min_run_len(0), 0);
        assert_eq!(min_run_len(63), 63);
        assert_eq!(min_run_len(64), 32);
        assert_eq!(min_run_len(65), 33);

        for len in 64..5000 {
            let min_run = min_run_len(len);
            assert!((32..=64).contains(&min_run), "{len} -> {min_run}");
        }
    }

    #[test]
    fn collapse_forces_merge_at_stop() {
        let runs = [
            TimSortRun { start: 0, len: 100 },
            TimSortRun { start: 100, len: 10 },
        ];

        assert_eq!(collapse(&runs, 200), None);
        assert_eq!(collapse(&runs, 110), Some(0));
    }

    #[test]
    fn collapse_merges_smaller_neighbour() {
        let runs = [
            TimSortRun { start: 0, len: 10 },
            TimSortRun { start: 10, len: 30 },
            TimSortRun { start: 40, len: 40 },
        ];

        assert_eq!(collapse(&runs, 1000), Some(0));
    }
}

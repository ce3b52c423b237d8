//! Stable, adaptive merge sort that can be suspended between any two units of work.
//!
//! [`TimSort`] is a plain state machine. It does not own the data it sorts, every call to
//! [`TimSort::step`] gets handed the slice again and performs a bounded amount of work on it.
//! Between two steps the slice always holds every element it held initially exactly once, it
//! is only partially sorted.

use std::mem;

use crate::config::SortConfig;

mod gallop;
mod merge;
mod run;

pub use run::TimSortRun;

use merge::Merge;
use run::{Extension, Reversal, Streak};

/// Upper bound of the comparisons and moves a single unit of work may cost. A step starts units
/// as long as its budget is not exhausted, so it never exceeds `step_budget + MAX_UNIT_COST`.
pub const MAX_UNIT_COST: usize = 2 * usize::BITS as usize + 2;

/// Minimal stretch a gallop has to find for the merge to stay in galloping mode.
const MIN_GALLOP_STRETCH: usize = 7;

/// Counts the work done by a step, every comparison, swap or move is one unit.
pub(crate) struct Meter<'a, F> {
    is_less: &'a mut F,
    budget: usize,
    spent: usize,
    comparisons: usize,
}

impl<'a, F> Meter<'a, F> {
    pub(crate) fn new(is_less: &'a mut F, budget: usize) -> Self {
        Self {
            is_less,
            // A step always starts at least one unit.
            budget: budget.max(1),
            spent: 0,
            comparisons: 0,
        }
    }

    #[inline]
    pub(crate) fn is_less<T>(&mut self, a: &T, b: &T) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.spent += 1;
        self.comparisons += 1;
        (self.is_less)(a, b)
    }

    #[inline]
    pub(crate) fn charge(&mut self, units: usize) {
        self.spent += units;
    }

    #[inline]
    pub(crate) fn exhausted(&self) -> bool {
        self.spent >= self.budget
    }

    pub(crate) fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.spent)
    }

    pub(crate) fn comparisons(&self) -> usize {
        self.comparisons
    }
}

#[derive(Debug)]
enum Phase {
    Finished,
    Scan(Streak),
    Reverse(Reversal),
    Extend(Extension),
    Collapse,
    Merge { r: usize, merge: Merge },
}

/// What a single call to [`TimSort::step`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub comparisons: usize,
    pub work: usize,
}

/// Incremental sort state.
#[derive(Debug)]
pub struct TimSort {
    config: SortConfig,
    len: usize,
    min_run: usize,
    min_gallop: usize,
    runs: Vec<TimSortRun>,
    /// Everything before `next` is covered by `runs`.
    next: usize,
    phase: Phase,
    scratch: Vec<usize>,
    last_step: StepStats,
}

impl Default for TimSort {
    fn default() -> Self {
        Self::new(SortConfig::global())
    }
}

impl TimSort {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            len: 0,
            min_run: 0,
            min_gallop: config.min_gallop(),
            runs: Vec::new(),
            next: 0,
            phase: Phase::Finished,
            scratch: Vec::new(),
            last_step: StepStats::default(),
        }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Begins sorting a slice of length `len`.
    ///
    /// The caller claims that the first `already_sorted` elements are in their final relative
    /// order. They become the first run without being looked at, a wrong claim yields a wrong
    /// order but never loses elements.
    ///
    /// # Panics
    ///
    /// Panics if a previous sort was neither run to its end nor abandoned with
    /// [`finish`](Self::finish).
    pub fn start(&mut self, len: usize, already_sorted: usize) {
        assert!(
            self.is_finished(),
            "TimSort::start called while a sort is in progress"
        );

        let already_sorted = already_sorted.min(len);

        self.len = len;
        self.min_run = run::min_run_len(len);
        self.min_gallop = self.config.min_gallop();
        self.runs.clear();
        self.next = 0;
        self.last_step = StepStats::default();

        if len < 2 {
            // These inputs are always sorted.
            return;
        }

        if already_sorted > 0 {
            self.runs.push(TimSortRun {
                start: 0,
                len: already_sorted,
            });
            self.next = already_sorted;
        }

        self.phase = Phase::Collapse;
    }

    /// Does a bounded amount of work on `v` and returns whether more work remains.
    ///
    /// `v` must be the slice the sort was started for, with the modifications of the previous
    /// steps.
    ///
    /// # Panics
    ///
    /// Panics if the length of `v` differs from the one passed to [`start`](Self::start), or if
    /// `is_less` panics. In the latter case `v` still holds every element exactly once.
    pub fn step<T, F>(&mut self, v: &mut [T], is_less: &mut F) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        if self.is_finished() {
            return false;
        }

        assert_eq!(
            v.len(),
            self.len,
            "TimSort::step called with a slice of a different length"
        );

        let mut meter = Meter::new(is_less, self.config.step_budget());

        while !meter.exhausted() {
            self.phase = match mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Finished => break,
                Phase::Scan(mut streak) => {
                    if !streak.advance(v, &mut meter) {
                        Phase::Scan(streak)
                    } else if streak.descending {
                        Phase::Reverse(Reversal::new(streak.start, streak.end))
                    } else {
                        self.extend(streak.start, streak.end)
                    }
                }
                Phase::Reverse(mut reversal) => {
                    if reversal.advance(v, &mut meter) {
                        self.extend(reversal.start, reversal.end)
                    } else {
                        Phase::Reverse(reversal)
                    }
                }
                Phase::Extend(mut extension) => {
                    if extension.advance(v, &mut meter) {
                        self.runs.push(TimSortRun {
                            start: extension.start,
                            len: extension.end - extension.start,
                        });
                        self.next = extension.end;
                        Phase::Collapse
                    } else {
                        Phase::Extend(extension)
                    }
                }
                Phase::Collapse => match run::collapse(&self.runs, self.len) {
                    Some(r) => {
                        let (left, right) = (self.runs[r], self.runs[r + 1]);
                        Phase::Merge {
                            r,
                            merge: Merge::new(left.start, right.start, right.end()),
                        }
                    }
                    None if self.next < self.len => Phase::Scan(Streak::new(self.next)),
                    None => {
                        // Finally, exactly one run must remain in the stack.
                        debug_assert!(
                            self.runs.len() == 1
                                && self.runs[0].start == 0
                                && self.runs[0].len == self.len
                        );
                        Phase::Finished
                    }
                },
                Phase::Merge { r, mut merge } => {
                    if merge.advance(v, &mut meter, &mut self.scratch, &mut self.min_gallop) {
                        let (left, right) = (self.runs[r], self.runs[r + 1]);
                        self.runs[r] = TimSortRun {
                            start: left.start,
                            len: left.len + right.len,
                        };
                        self.runs.remove(r + 1);
                        Phase::Collapse
                    } else {
                        Phase::Merge { r, merge }
                    }
                }
            };
        }

        self.last_step = StepStats {
            comparisons: meter.comparisons(),
            work: meter.spent,
        };

        !self.is_finished()
    }

    /// Abandons the sort. The slice keeps whatever order the steps so far produced.
    pub fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.runs.clear();
        self.scratch = Vec::new();
    }

    /// Steps until the sort is complete.
    pub fn sort_to_completion<T, F>(&mut self, v: &mut [T], is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        while self.step(v, is_less) {}
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Length of the slice the current or last sort was started for.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn runs(&self) -> &[TimSortRun] {
        &self.runs
    }

    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    fn extend(&self, start: usize, sorted_end: usize) -> Phase {
        let end = (start + self.min_run).min(self.len).max(sorted_end);
        Phase::Extend(Extension::new(start, sorted_end, end))
    }
}

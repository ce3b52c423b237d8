use std::mem;
use std::ops::Range;

use super::gallop::{gallop_left, gallop_right};
use super::Meter;

/// Marks a slot of the merge order that was already moved into place.
const PLACED: usize = usize::MAX;

/// Resumable, stable merge of the adjacent sorted ranges `v[lo..mid]` and `v[mid..hi]`.
///
/// The merge never leaves a hole in `v`. It first computes the merged order as a list of source
/// offsets, comparing elements where they are, and then moves every element to its destination
/// by following the cycles of that permutation with swaps. Both phases can be interrupted
/// between any two work units.
#[derive(Debug)]
pub(super) struct Merge {
    lo: usize,
    mid: usize,
    hi: usize,
    stage: Stage,
}

#[derive(Debug)]
enum Stage {
    TrimFront,
    TrimBack,
    Compute(Compute),
    Apply(Apply),
    Done,
}

#[derive(Debug)]
enum Mode {
    OneByOne { left_wins: usize, right_wins: usize },
    GallopLeft,
    GallopRight { left_found: usize },
}

/// Merged order of `v[lo..hi]`, `order[i]` is the offset from `lo` of the element that belongs
/// at `lo + i`.
#[derive(Debug)]
struct Compute {
    order: Vec<usize>,
    left: usize,
    right: usize,
    /// Offsets found by a gallop that still have to be appended to `order`.
    pending: Range<usize>,
    mode: Mode,
}

#[derive(Debug)]
struct Apply {
    order: Vec<usize>,
    /// Start of the cycle currently being followed.
    cycle: usize,
    /// Current slot within that cycle, `None` between cycles.
    cur: Option<usize>,
}

impl Merge {
    pub fn new(lo: usize, mid: usize, hi: usize) -> Self {
        debug_assert!(lo < mid && mid < hi);

        Self {
            lo,
            mid,
            hi,
            stage: Stage::TrimFront,
        }
    }

    /// Advances the merge until it completes or the meter runs out. Returns true once `v[lo..hi]`
    /// is sorted. `scratch` donates and receives back the allocation used for the merge order.
    /// `min_gallop` is adapted to how well galloping pays off.
    pub fn advance<T, F>(
        &mut self,
        v: &mut [T],
        meter: &mut Meter<'_, F>,
        scratch: &mut Vec<usize>,
        min_gallop: &mut usize,
    ) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        loop {
            if let Stage::Done = self.stage {
                return true;
            }

            if meter.exhausted() {
                return false;
            }

            self.stage = match mem::replace(&mut self.stage, Stage::Done) {
                Stage::TrimFront => {
                    // Elements of the left run that are not greater than the first element of
                    // the right run are already in place.
                    let (lo, mid) = (self.lo, self.mid);
                    self.lo += gallop_right(&v[mid], &v[lo..mid], meter);

                    if self.lo == self.mid {
                        Stage::Done
                    } else {
                        Stage::TrimBack
                    }
                }
                Stage::TrimBack => {
                    // Same for elements of the right run that are not less than the last element
                    // of the left run.
                    let (mid, hi) = (self.mid, self.hi);
                    self.hi = mid + gallop_left(&v[mid - 1], &v[mid..hi], meter);

                    if self.hi == self.mid {
                        Stage::Done
                    } else {
                        let mut order = mem::take(scratch);
                        order.clear();
                        order.reserve(self.hi - self.lo);

                        Stage::Compute(Compute {
                            order,
                            left: 0,
                            right: self.mid - self.lo,
                            pending: 0..0,
                            mode: Mode::OneByOne {
                                left_wins: 0,
                                right_wins: 0,
                            },
                        })
                    }
                }
                Stage::Compute(mut compute) => {
                    if self.compute(&mut compute, v, meter, min_gallop) {
                        Stage::Apply(Apply {
                            order: compute.order,
                            cycle: 0,
                            cur: None,
                        })
                    } else {
                        Stage::Compute(compute)
                    }
                }
                Stage::Apply(mut apply) => {
                    if self.apply(&mut apply, v, meter) {
                        *scratch = apply.order;
                        Stage::Done
                    } else {
                        Stage::Apply(apply)
                    }
                }
                Stage::Done => Stage::Done,
            };
        }
    }

    fn compute<T, F>(
        &self,
        state: &mut Compute,
        v: &[T],
        meter: &mut Meter<'_, F>,
        min_gallop: &mut usize,
    ) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        let v = &v[self.lo..self.hi];
        let left_end = self.mid - self.lo;
        let right_end = v.len();

        loop {
            if meter.exhausted() {
                return false;
            }

            if !state.pending.is_empty() {
                let take = state.pending.len().min(meter.remaining());
                let from = state.pending.start;
                state.order.extend(from..from + take);
                state.pending.start += take;
                meter.charge(take);
                continue;
            }

            if state.left == left_end || state.right == right_end {
                if state.left < left_end {
                    state.pending = state.left..left_end;
                    state.left = left_end;
                } else if state.right < right_end {
                    state.pending = state.right..right_end;
                    state.right = right_end;
                } else {
                    debug_assert_eq!(state.order.len(), right_end);
                    return true;
                }
                continue;
            }

            let (left, right) = (state.left, state.right);

            state.mode = match state.mode {
                Mode::OneByOne {
                    mut left_wins,
                    mut right_wins,
                } => {
                    // Consume the lesser side. If equal, prefer the left run to maintain
                    // stability.
                    if meter.is_less(&v[right], &v[left]) {
                        state.order.push(right);
                        state.right += 1;
                        right_wins += 1;
                        left_wins = 0;
                    } else {
                        state.order.push(left);
                        state.left += 1;
                        left_wins += 1;
                        right_wins = 0;
                    }

                    if left_wins.max(right_wins) >= *min_gallop {
                        Mode::GallopLeft
                    } else {
                        Mode::OneByOne {
                            left_wins,
                            right_wins,
                        }
                    }
                }
                Mode::GallopLeft => {
                    let found = gallop_right(&v[right], &v[left..left_end], meter);
                    state.pending = left..left + found;
                    state.left += found;

                    Mode::GallopRight { left_found: found }
                }
                Mode::GallopRight { left_found } => {
                    let found = gallop_left(&v[left], &v[right..right_end], meter);
                    state.pending = right..right + found;
                    state.right += found;

                    // Stay in galloping mode as long as it finds long stretches, and make it
                    // easier to re-enter the longer it pays off.
                    if left_found.max(found) >= super::MIN_GALLOP_STRETCH {
                        *min_gallop = min_gallop.saturating_sub(1).max(1);
                        Mode::GallopLeft
                    } else {
                        *min_gallop += 1;
                        Mode::OneByOne {
                            left_wins: 0,
                            right_wins: 0,
                        }
                    }
                }
            };
        }
    }

    fn apply<T, F>(&self, state: &mut Apply, v: &mut [T], meter: &mut Meter<'_, F>) -> bool {
        let v = &mut v[self.lo..self.hi];
        let order = &mut state.order;
        let len = order.len();

        loop {
            if meter.exhausted() {
                return false;
            }
            meter.charge(1);

            match state.cur {
                None => {
                    if state.cycle == len {
                        return true;
                    }

                    if order[state.cycle] == PLACED {
                        state.cycle += 1;
                    } else {
                        state.cur = Some(state.cycle);
                    }
                }
                Some(cur) => {
                    let next = order[cur];
                    order[cur] = PLACED;

                    if next == state.cycle {
                        // The element that started the cycle is already sitting at `cur`.
                        state.cur = None;
                        state.cycle += 1;
                    } else {
                        v.swap(cur, next);
                        state.cur = Some(next);
                    }
                }
            }
        }
    }
}

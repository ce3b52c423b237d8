use super::Meter;

/// Returns how many elements at the start of the sorted `v` are less than or equal to `key`.
///
/// Probes `v` at exponentially growing offsets before switching to a binary search, so finding a
/// short prefix is cheap. Costs at most `2 * usize::BITS` comparisons.
pub(super) fn gallop_right<T, F>(key: &T, v: &[T], meter: &mut Meter<'_, F>) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    gallop(v, meter, |meter, elem| !meter.is_less(key, elem))
}

/// Returns how many elements at the start of the sorted `v` are strictly less than `key`.
pub(super) fn gallop_left<T, F>(key: &T, v: &[T], meter: &mut Meter<'_, F>) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    gallop(v, meter, |meter, elem| meter.is_less(elem, key))
}

/// Finds the length of the prefix of `v` for which `in_prefix` holds. `in_prefix` must be
/// monotone, true for a prefix and false for the rest.
fn gallop<T, F, P>(v: &[T], meter: &mut Meter<'_, F>, mut in_prefix: P) -> usize
where
    F: FnMut(&T, &T) -> bool,
    P: FnMut(&mut Meter<'_, F>, &T) -> bool,
{
    let len = v.len();

    // Everything in v[..lo] is part of the prefix, everything in v[hi..] is not.
    let mut lo = 0;
    let mut hi = len;
    let mut step = 1;

    loop {
        let probe = lo + step - 1;
        if probe >= len {
            break;
        }

        if !in_prefix(meter, &v[probe]) {
            hi = probe;
            break;
        }

        lo = probe + 1;
        step *= 2;
    }

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if in_prefix(meter, &v[mid]) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

//! Input patterns for testing and benchmarking the incremental sort and the views built on it.
//! Keys are i32, edits are sequences of valid splices.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::prelude::*;

use once_cell::sync::OnceCell;

use crate::list_model::ItemsChanged;

// --- Public ---

pub fn random(size: usize) -> Vec<i32> {
    //     .
    // : . : :
    // :.:::.::

    random_vec(size)
}

pub fn random_uniform<R>(size: usize, range: R) -> Vec<i32>
where
    R: Into<rand::distributions::Uniform<i32>>,
{
    // :.:.:.::
    let mut rng = new_seed();

    let dist: rand::distributions::Uniform<i32> = range.into();

    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

pub fn all_equal(size: usize) -> Vec<i32> {
    // ......
    // ::::::

    vec![66; size]
}

pub fn ascending(size: usize) -> Vec<i32> {
    //     .:
    //   .:::
    // .:::::

    (0..size as i32).collect()
}

pub fn descending(size: usize) -> Vec<i32> {
    // :.
    // :::.
    // :::::.

    (0..size as i32).rev().collect()
}

pub fn saw_mixed(size: usize, saw_count: usize) -> Vec<i32> {
    // :.  :.    .::.    .:
    // :::.:::..::::::..:::

    if size == 0 {
        return Vec::new();
    }

    let mut vals = random_vec(size);
    let chunk_size = (size / saw_count.max(1)).max(1);
    let saw_directions = random_uniform((size / chunk_size) + 1, 0..=1);

    for (chunk, direction) in vals.chunks_mut(chunk_size).zip(saw_directions) {
        if direction == 0 {
            chunk.sort();
        } else {
            chunk.sort_by_key(|&e| std::cmp::Reverse(e));
        }
    }

    vals
}

pub fn pipe_organ(size: usize) -> Vec<i32> {
    //   .:.
    // .:::::.

    let mut vals = random_vec(size);

    vals[..size / 2].sort();
    vals[size / 2..].sort_by_key(|&e| std::cmp::Reverse(e));

    vals
}

/// `count` splices that are valid when applied in order to a list that starts out with
/// `initial_len` items. Roughly a third of them only insert, a third only remove and the rest
/// replace.
pub fn random_edits(initial_len: usize, count: usize) -> Vec<ItemsChanged> {
    let mut rng = new_seed();
    let mut len = initial_len;
    let mut edits = Vec::with_capacity(count);

    while edits.len() < count {
        let position = rng.gen_range(0..=len);
        let max_removed = (len - position).min(16);

        let (removed, added) = match rng.gen_range(0..3) {
            0 => (0, rng.gen_range(1..=16)),
            1 => (rng.gen_range(0..=max_removed), 0),
            _ => (rng.gen_range(0..=max_removed), rng.gen_range(0..=16)),
        };

        let edit = ItemsChanged::new(position, removed, added);
        if edit.is_empty() {
            continue;
        }

        len = len - removed + added;
        edits.push(edit);
    }

    edits
}

static USE_FIXED_SEED: AtomicBool = AtomicBool::new(true);

pub fn disable_fixed_seed() {
    USE_FIXED_SEED.store(false, Ordering::Release);
}

pub fn random_init_seed() -> u64 {
    if USE_FIXED_SEED.load(Ordering::Acquire) {
        static SEED: OnceCell<u64> = OnceCell::new();
        *SEED.get_or_init(|| -> u64 { thread_rng().gen() })
    } else {
        thread_rng().gen()
    }
}

// --- Private ---

fn new_seed() -> StdRng {
    // Random seed, but the tests print it for repeatability.
    rand::SeedableRng::seed_from_u64(random_init_seed())
}

fn random_vec(size: usize) -> Vec<i32> {
    let mut rng = new_seed();

    (0..size).map(|_| rng.gen::<i32>()).collect()
}

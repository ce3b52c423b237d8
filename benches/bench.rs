use std::env;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use sort_view::{
    patterns, CustomSorter, IdleQueue, ListModel, SortConfig, SortListModel, TimSort, VecModel,
};

#[inline(never)]
fn bench_sort(
    c: &mut Criterion,
    test_size: usize,
    pattern_name: &str,
    pattern_provider: &fn(usize) -> Vec<i32>,
    config: SortConfig,
) {
    let batch_size = if test_size > 30 {
        BatchSize::LargeInput
    } else {
        BatchSize::SmallInput
    };

    c.bench_function(&format!("slice_sort_by-{pattern_name}-{test_size}"), |b| {
        b.iter_batched(
            || pattern_provider(test_size),
            |mut test_data| black_box(test_data.as_mut_slice()).sort_by(|a, b| a.cmp(b)),
            batch_size,
        )
    });

    c.bench_function(
        &format!(
            "timsort_steps_{}-{pattern_name}-{test_size}",
            config.step_budget()
        ),
        |b| {
            b.iter_batched(
                || pattern_provider(test_size),
                |mut test_data| {
                    let mut sort = TimSort::new(config);
                    sort.start(test_data.len(), 0);
                    sort.sort_to_completion(
                        black_box(test_data.as_mut_slice()),
                        &mut |a: &i32, b: &i32| a < b,
                    );
                },
                batch_size,
            )
        },
    );

    c.bench_function(
        &format!("view_idle_{}-{pattern_name}-{test_size}", config.step_budget()),
        |b| {
            b.iter_batched(
                || pattern_provider(test_size).into_iter().map(Rc::new).collect::<Vec<_>>(),
                |items| {
                    let queue = Rc::new(IdleQueue::new());
                    let source = Rc::new(VecModel::from_vec(items));
                    let sorter = Rc::new(CustomSorter::by_key(|item: &Rc<i32>| **item));
                    let view = SortListModel::with_config(
                        Some(source),
                        Some(sorter),
                        queue.clone(),
                        config,
                    );

                    queue.run_until_idle();
                    black_box(view.n_items());
                },
                batch_size,
            )
        },
    );
}

fn criterion_benchmark(c: &mut Criterion) {
    // Distribute points somewhat evenly up to 1e5 in log10 space.
    let test_sizes = [0, 1, 2, 3, 5, 8, 11, 16, 20, 32, 64, 100, 1_000, 10_000, 100_000];

    let pattern_providers: Vec<(&'static str, fn(usize) -> Vec<i32>)> = vec![
        ("random", patterns::random),
        ("random_d20", |len| patterns::random_uniform(len, 0..20)),
        ("random_s95", |len: usize| {
            // 95% sorted, with a random tail. The common case after appending to a sorted view.
            let mut v = patterns::ascending(len);
            let tail = len - len * 95 / 100;
            let random_tail = patterns::random(tail);
            v.truncate(len - tail);
            v.extend(random_tail);
            v
        }),
        ("ascending", patterns::ascending),
        ("descending", patterns::descending),
        ("saws_short", |len| {
            patterns::saw_mixed(len, ((len as f64).log2().round()) as usize)
        }),
        ("pipe_organ", patterns::pipe_organ),
    ];

    let step_budget = env::var("BENCH_STEP_BUDGET")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(1024);
    let config = SortConfig::default()
        .with_step_budget(step_budget)
        .unwrap_or_default();

    for test_size in test_sizes {
        for (pattern_name, pattern_provider) in pattern_providers.iter() {
            bench_sort(c, test_size, pattern_name, pattern_provider, config);
        }
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

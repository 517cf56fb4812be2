//! Basic benchmarks for the `placement_vec` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use placement_vec::Sequence;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;
const BATCH_SIZE: usize = 1000;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("placement_vec_basic");

    let allocs_op = allocs.operation("new_empty");
    group.bench_function("new_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(Sequence::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_batch_from_empty");
    group.bench_function("push_batch_from_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut sequence = Sequence::new();

                for _ in 0..BATCH_SIZE {
                    _ = black_box(sequence.push(black_box(TEST_VALUE)));
                }

                drop(black_box(sequence));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_batch_reserved");
    group.bench_function("push_batch_reserved", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut sequence = Sequence::with_capacity(BATCH_SIZE);

                for _ in 0..BATCH_SIZE {
                    _ = black_box(sequence.push(black_box(TEST_VALUE)));
                }

                drop(black_box(sequence));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_front");
    group.bench_function("insert_front", |b| {
        b.iter_custom(|iters| {
            let mut sequences = iter::repeat_with(|| Sequence::<TestItem>::with_len(BATCH_SIZE))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for sequence in &mut sequences {
                _ = black_box(sequence.insert(0, black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("erase_front");
    group.bench_function("erase_front", |b| {
        b.iter_custom(|iters| {
            let mut sequences = iter::repeat_with(|| Sequence::<TestItem>::with_len(BATCH_SIZE))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for sequence in &mut sequences {
                _ = black_box(sequence.erase(0));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_batch");
    group.bench_function("clone_batch", |b| {
        b.iter_custom(|iters| {
            let sequence = Sequence::<TestItem>::with_len(BATCH_SIZE);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(sequence.clone()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_from_in_place");
    group.bench_function("clone_from_in_place", |b| {
        b.iter_custom(|iters| {
            let source = Sequence::<TestItem>::with_len(BATCH_SIZE);
            let mut target = Sequence::<TestItem>::with_len(BATCH_SIZE);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                target.clone_from(black_box(&source));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("read_all");
    group.bench_function("read_all", |b| {
        b.iter_custom(|iters| {
            let sequence = Sequence::<TestItem>::with_len_with(BATCH_SIZE, || TEST_VALUE);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                for value in &sequence {
                    black_box(*value);
                }
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}

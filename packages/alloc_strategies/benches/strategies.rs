//! Compares the cost of a full allocate-then-free cycle across strategies.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::alloc::System;
use std::hint::black_box;
use std::time::Instant;

use alloc_strategies::{Block, Boxed, DynBlock, RawBytes, Strategy, StrategyKind, ZeroedBytes};
use alloc_tracker::{Allocator, Session};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<System> = Allocator::system();

type Small = u64;

/// A payload too large for the standard `Default` impls on arrays.
#[derive(Debug)]
struct Large([u8; 256]);

impl Default for Large {
    fn default() -> Self {
        Self([0; 256])
    }
}

const COUNTS: [usize; 3] = [1, 16, 1024];

fn entrypoint(c: &mut Criterion) {
    let allocs = Session::new();

    bench_static::<Boxed<Small>>(c, &allocs, "small");
    bench_static::<RawBytes<Small>>(c, &allocs, "small");
    bench_static::<ZeroedBytes<Small>>(c, &allocs, "small");

    bench_static::<Boxed<Large>>(c, &allocs, "large");
    bench_static::<RawBytes<Large>>(c, &allocs, "large");
    bench_static::<ZeroedBytes<Large>>(c, &allocs, "large");

    let mut group = c.benchmark_group("dyn_block");

    for kind in StrategyKind::ALL.into_iter().filter(|kind| kind.allocates()) {
        let name = format!("{kind}_16");
        let allocs_op = allocs.operation(format!("dyn_block_{name}"));

        group.bench_function(&name, |b| {
            b.iter_custom(|iters| {
                let _span = allocs_op.measure_thread().iterations(iters);

                let start = Instant::now();

                for _ in 0..iters {
                    drop(black_box(DynBlock::<Small>::new(kind, 16)));
                }

                start.elapsed()
            });
        });
    }

    group.finish();

    allocs.print_to_stdout();
}

fn bench_static<S>(c: &mut Criterion, allocs: &Session, size_label: &str)
where
    S: Strategy,
    S::Val: Default,
{
    let mut group = c.benchmark_group(format!("{}_{size_label}", S::KIND));

    for n in COUNTS {
        let name = format!("alloc_free_{n}");
        let allocs_op = allocs.operation(format!("{}_{size_label}_{name}", S::KIND));

        group.bench_function(&name, |b| {
            b.iter_custom(|iters| {
                let _span = allocs_op.measure_thread().iterations(iters);

                let start = Instant::now();

                for _ in 0..iters {
                    drop(black_box(Block::<S>::new(black_box(n))));
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

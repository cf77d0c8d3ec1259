use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use keyscore_core::extract::demo_answer_key_with;
use keyscore_core::scoring::totals;
use keyscore_core::statistics::{mean, percentile, strict_rank};

fn population(size: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(3);
    (0..size).map(|_| rng.gen_range(-50.0..200.0)).collect()
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("strict_rank");

    for size in [100, 10_000, 100_000] {
        let scores = population(size);
        group.bench_function(format!("population={size}"), |b| {
            b.iter(|| {
                let rank = strict_rank(black_box(&scores), black_box(120.0));
                percentile(scores.len() + 1, rank)
            })
        });
    }

    let scores = population(10_000);
    group.bench_function("mean/10000", |b| b.iter(|| mean(black_box(&scores))));

    group.finish();
}

fn bench_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("totals");
    let key = demo_answer_key_with(&mut StdRng::seed_from_u64(9));

    group.bench_function("demo_key", |b| b.iter(|| totals(black_box(&key))));

    group.finish();
}

criterion_group!(benches, bench_rank, bench_totals);
criterion_main!(benches);

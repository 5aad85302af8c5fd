//! Benchmarks of per-pixel updates and partition folding
//!
//! Run with: cargo bench --bench fold_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal};
use tilestat::{fold_tree, BucketingStrategy, Histogram, Ledger, ScalarStats};

/// Skewed positive samples, like reflectance or elevation bands
fn generate_test_data(size: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let dist = LogNormal::new(3.0, 1.5).unwrap();
    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

fn strategies() -> Vec<(&'static str, BucketingStrategy)> {
    vec![
        ("log", BucketingStrategy::default()),
        ("log_regular", BucketingStrategy::log_regular(10.0, 5, 0.1).unwrap()),
        ("regular", BucketingStrategy::regular(0.0, 25.0).unwrap()),
        (
            "explicit",
            BucketingStrategy::explicit(vec![0.0, 1.0, 10.0, 50.0, 100.0, 1000.0]).unwrap(),
        ),
    ]
}

fn bench_histogram_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram_update");
    let data = generate_test_data(100_000);

    for (name, strategy) in strategies() {
        group.bench_with_input(BenchmarkId::new(name, data.len()), &data, |b, data| {
            b.iter(|| {
                let mut hist = Histogram::new(strategy.clone());
                for &v in data {
                    hist.update(v);
                }
                black_box(hist)
            });
        });
    }

    group.bench_function("scalar_stats", |b| {
        b.iter(|| {
            let mut stats = ScalarStats::new();
            for &v in &data {
                stats.update(v);
            }
            black_box(stats)
        });
    });

    group.finish();
}

fn bench_histogram_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram_fold");
    let data = generate_test_data(200_000);

    for partitions in [4, 64, 512] {
        let chunk = data.len() / partitions;
        let partials: Vec<Histogram> = data
            .chunks(chunk)
            .map(|c| {
                let mut hist = Histogram::new(BucketingStrategy::default());
                for &v in c {
                    hist.update(v);
                }
                hist
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("fold_tree", partitions),
            &partials,
            |b, partials| b.iter(|| black_box(fold_tree(partials).unwrap())),
        );
    }

    group.finish();
}

fn bench_ledger_add(c: &mut Criterion) {
    let data = generate_test_data(60_000);
    let pixels: Vec<[f64; 3]> = data
        .chunks_exact(3)
        .map(|c| [c[0].trunc() % 8.0, c[1], c[2]])
        .collect();

    c.bench_function("ledger_add", |b| {
        b.iter(|| {
            let mut ledger =
                Ledger::from_descriptors(&["categorical", "log", "regular/origin/0/width/50"]).unwrap();
            for pixel in &pixels {
                ledger.add(pixel).unwrap();
            }
            black_box(ledger)
        });
    });
}

criterion_group!(benches, bench_histogram_update, bench_histogram_fold, bench_ledger_add);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dynct::{CoverTree, Metric, Point, Scalar};
use ndarray::Array1;

#[derive(Clone, Debug, PartialEq)]
struct Vector(Array1<Scalar>);

impl Point for Vector {
    fn distance(&self, other: &Self) -> Scalar {
        Metric::Euclidean.distance(self.0.view(), other.0.view())
    }
}

fn random_vectors(rng: &mut oorandom::Rand64, n: usize, dim: usize) -> Vec<Vector> {
    (0..n)
        .map(|_| Vector(Array1::from_shape_simple_fn(dim, || rng.rand_float())))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut rng = oorandom::Rand64::new(0);
    let data = random_vectors(&mut rng, 2000, 8);

    c.bench_function("build 2000x8", |b| {
        b.iter(|| CoverTree::new(4., black_box(data.clone())).unwrap())
    });
}

fn bench_search(c: &mut Criterion) {
    let mut rng = oorandom::Rand64::new(1);
    let ct = CoverTree::new(4., random_vectors(&mut rng, 5000, 8)).unwrap();
    let queries = random_vectors(&mut rng, 100, 8);

    c.bench_function("search k=10", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(ct.search(q, 10));
            }
        })
    });

    c.bench_function("search_batch k=10", |b| {
        b.iter(|| black_box(ct.search_batch(&queries, 10)))
    });
}

fn bench_remove(c: &mut Criterion) {
    let mut rng = oorandom::Rand64::new(2);
    let data = random_vectors(&mut rng, 1000, 8);
    let ct = CoverTree::new(4., data.clone()).unwrap();

    c.bench_function("remove 100", |b| {
        b.iter_batched(
            || ct.clone(),
            |mut ct| {
                for p in data.iter().take(100) {
                    ct.remove(p).unwrap();
                }
                ct
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_build, bench_search, bench_remove);
criterion_main!(benches);

use dynct::{CoverTree, CoverTreeBuilder, Metric, Point, Scalar};
use ndarray::{Array, Array1};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq)]
struct Vector(Array1<Scalar>);

impl Point for Vector {
    fn distance(&self, other: &Self) -> Scalar {
        Metric::Euclidean.distance(self.0.view(), other.0.view())
    }
}

// In this example, we generate 1000 random points in a 50-dimensional unit cube and build a
// cover tree from them. Every pair of points is at most sqrt(50) apart, which we pass as the
// distance bound.
fn build() {
    let mut rng = oorandom::Rand64::new(0);
    let data: Vec<Vector> = (0..1000)
        .map(|_| Vector(Array::from_shape_simple_fn(50, || rng.rand_float())))
        .collect();

    let mut ct = CoverTreeBuilder::new()
        .base(2.)
        .max_distance((50 as Scalar).sqrt())
        .build(data.clone())
        .unwrap();

    // Search 10 nearest neighbours for query.
    let query = Vector(Array1::from_shape_simple_fn(50, || rng.rand_float()));
    let result = ct.search(&query, 10);
    println!("closest distance: {}", result.neighbours()[0].dist());

    // Insert the query and find it again.
    ct.insert(query.clone()).unwrap();
    assert_eq!(0., ct.search(&query, 1).neighbours()[0].dist());

    // Search 10 nearest neighbours for 10 query points in parallel.
    let queries: Vec<Vector> = (0..10)
        .map(|_| Vector(Array1::from_shape_simple_fn(50, || rng.rand_float())))
        .collect();
    let _ = ct.search_batch(&queries, 10);

    // Remove half of the points again.
    for p in data.iter().step_by(2) {
        ct.remove(p).unwrap();
    }
    println!("{} points in {} nodes", ct.len(), ct.node_count());
}

// We can also initialise an empty cover tree and add points to the tree sequentially.
fn sequential() {
    let mut rng = oorandom::Rand64::new(0);

    // An empty cover tree.
    let mut ct = CoverTree::new(1., Vec::new()).unwrap();

    // Adds points to the tree sequentially. The tree grows new levels for points beyond the
    // initial bound.
    for _ in 0..100 {
        let p = Vector(Array1::from_shape_simple_fn(5, || rng.rand_float() * 10.));
        ct.insert(p).unwrap();
    }

    println!("levels {}..={}", ct.min_level(), ct.max_level());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    build();
    sequential();
}

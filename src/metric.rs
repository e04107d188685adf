use crate::Scalar;
use ndarray::{s, Array1, ArrayView1};

use ndarray_stats::DeviationExt;

/// Enum for distance functions in a metric space.
///
/// These are provided for callers who back their [`Point`](crate::Point) type with `ndarray`
/// vectors. Vectors of different lengths are compared as if the shorter one was padded with
/// zeros.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// L-1 or Manhattan distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Taxicab_geometry).
    Manhattan,
    /// L-2 or Euclidean distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Euclidean_distance)
    Euclidean,
    /// L-inf or Chebyshev distance. See [\[Wikipedia\]](https://en.wikipedia.org/wiki/Chebyshev_distance)
    Chebyshev,
    /// Angular distance, i.e. the angle between two vectors divided by pi.
    Angular,
}

impl Metric {
    /// Calculate the distance between two points.
    pub fn distance(&self, a: ArrayView1<'_, Scalar>, b: ArrayView1<'_, Scalar>) -> Scalar {
        if a.len() != b.len() {
            let len = a.len().max(b.len());
            let (a, b) = (zero_extend(a, len), zero_extend(b, len));
            return self.distance(a.view(), b.view());
        }

        // ndarray-stats only fails on empty or mismatched inputs.
        match self {
            Metric::Manhattan => a.l1_dist(&b).unwrap_or(0.),
            Metric::Euclidean => a.l2_dist(&b).unwrap_or(0.) as Scalar,
            Metric::Chebyshev => a.linf_dist(&b).unwrap_or(0.),
            Metric::Angular => {
                let norm = a.dot(&a).sqrt() * b.dot(&b).sqrt();
                if norm == 0. {
                    return 0.;
                }

                // floating point issue (e.g. 1.0000000000000002).
                let cos = (a.dot(&b) / norm).clamp(-1., 1.);
                cos.acos() / std::f64::consts::PI as Scalar
            }
        }
    }
}

fn zero_extend(v: ArrayView1<'_, Scalar>, len: usize) -> Array1<Scalar> {
    let mut out = Array1::zeros(len);
    out.slice_mut(s![..v.len()]).assign(&v);
    out
}

//! A library for exact nearest neighbour search over arbitrary metric spaces based on a dynamic
//! cover tree.
//!
//! Points only need to provide a distance function and an equality test (see [`Point`]). The
//! tree supports insertion, removal and k-nearest neighbour queries, all of which run in time
//! sub-linear in the number of stored points when the data has a bounded doubling dimension.
//!
//! ```
//! use dynct::{CoverTree, Point, Scalar};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct P(f64, f64);
//!
//! impl Point for P {
//!     fn distance(&self, other: &Self) -> Scalar {
//!         ((self.0 - other.0).powi(2) + (self.1 - other.1).powi(2)).sqrt()
//!     }
//! }
//!
//! let mut ct = CoverTree::new(10., vec![P(0., 0.), P(1., 0.), P(5., 5.)]).unwrap();
//! ct.insert(P(0., 0.0001)).unwrap();
//!
//! let nn = ct.k_nearest_neighbors(&P(0., 0.), 2);
//! assert_eq!(nn, vec![P(0., 0.), P(0., 0.0001)]);
//! assert!(ct.is_valid_tree());
//! ```
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    rustdoc::broken_intra_doc_links
)]

/// Floating point type used for distances.
pub type Scalar = f64;

mod error;
pub use error::{CoverTreeError, Result};

mod metric;
pub use metric::Metric;

mod node;

mod point;
pub use point::Point;


mod tree;
pub use tree::{CoverTree, CoverTreeBuilder, Neighbour, QueryResult};

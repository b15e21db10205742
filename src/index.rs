use std::sync::Arc;

use crate::bounds::dist_sq;
use crate::kdtree::KdTree;
use crate::position::Position;
use crate::search::Neighbor;

/// Trait defining a point index answering proximity queries.
/// This allows swapping between the k-d tree and a linear scan, and treating a missing tree as
/// an index that finds nothing.
///
/// Every implementation must return indices into the point sequence it was built from, and
/// results of [`SpatialIndex::k_nearest`] and [`SpatialIndex::within_radius`] sorted by
/// ascending distance.
pub trait SpatialIndex: Send + Sync {
    /// Number of indexed points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The closest point to `query`, or `None` if there is nothing to find.
    fn nearest(&self, query: [f64; 3]) -> Option<Neighbor>;

    /// The closest point farther than `epsilon` from `query`.
    fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor>;

    /// Up to `k` closest points, `k` clamped to [`SpatialIndex::len`].
    fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor>;

    /// All points with `0 < distance <= radius`.
    fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor>;
}

impl SpatialIndex for KdTree {
    fn len(&self) -> usize {
        KdTree::len(self)
    }

    fn nearest(&self, query: [f64; 3]) -> Option<Neighbor> {
        KdTree::nearest(self, query)
    }

    fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor> {
        KdTree::nearest_other(self, query, epsilon)
    }

    fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        KdTree::k_nearest(self, query, k)
    }

    fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        KdTree::within_radius(self, query, radius)
    }
}

/// "No tree": answers every query with no result.
impl<T: SpatialIndex> SpatialIndex for Option<T> {
    fn len(&self) -> usize {
        self.as_ref().map_or(0, |t| t.len())
    }

    fn nearest(&self, query: [f64; 3]) -> Option<Neighbor> {
        self.as_ref()?.nearest(query)
    }

    fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor> {
        self.as_ref()?.nearest_other(query, epsilon)
    }

    fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        self.as_ref().map_or_else(Vec::new, |t| t.k_nearest(query, k))
    }

    fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        self.as_ref().map_or_else(Vec::new, |t| t.within_radius(query, radius))
    }
}

impl<T: SpatialIndex + ?Sized> SpatialIndex for Arc<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn nearest(&self, query: [f64; 3]) -> Option<Neighbor> {
        (**self).nearest(query)
    }

    fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor> {
        (**self).nearest_other(query, epsilon)
    }

    fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        (**self).k_nearest(query, k)
    }

    fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        (**self).within_radius(query, radius)
    }
}

/// Brute-force index: compares the query against every point.
///
/// Serves as the reference answer for the k-d tree and as the baseline it is benchmarked
/// against. For a handful of points it is also simply the faster choice.
#[derive(Clone, Debug, Default)]
pub struct LinearScan {
    points: Vec<[f64; 3]>,
}

impl LinearScan {
    pub fn new<P: Position>(points: &[P]) -> Self {
        Self {
            points: points.iter().map(Position::position).collect(),
        }
    }

    /// Creates the index from an interleaved `x, y, z, ...` buffer.
    pub fn from_flat(coords: &[f64]) -> Self {
        Self {
            points: coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        }
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn all(&self, query: [f64; 3]) -> impl Iterator<Item = Neighbor> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(move |(i, &p)| Neighbor::new(i, dist_sq(p, query)))
    }
}

impl SpatialIndex for LinearScan {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn nearest(&self, query: [f64; 3]) -> Option<Neighbor> {
        if query.iter().any(|c| !c.is_finite()) {
            return None;
        }
        self.all(query).min()
    }

    fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor> {
        if query.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let eps_sq = if epsilon >= 0.0 { epsilon * epsilon } else { -1.0 };
        self.all(query).filter(|n| n.distance_sq > eps_sq).min()
    }

    fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        if query.iter().any(|c| !c.is_finite()) {
            return Vec::new();
        }
        let mut found: Vec<Neighbor> = self.all(query).collect();
        found.sort_unstable();
        found.truncate(k);
        found
    }

    fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        if radius.is_nan() || radius < 0.0 || query.iter().any(|c| !c.is_finite()) {
            return Vec::new();
        }
        let r_sq = radius * radius;
        let mut found: Vec<Neighbor> = self
            .all(query)
            .filter(|n| n.distance_sq > 0.0 && n.distance_sq <= r_sq)
            .collect();
        found.sort_unstable();
        found
    }
}

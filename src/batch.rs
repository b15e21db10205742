//! Parallel queries for many query points at once.
//!
//! Every function fans the queries out over the rayon thread pool and returns one result per
//! query, in query order. The index is only read, so any [`SpatialIndex`] can be shared by all
//! workers without locking.

use log::debug;
use rayon::prelude::*;

use crate::index::SpatialIndex;
use crate::search::Neighbor;

pub fn nearest_batch<I>(index: &I, queries: &[[f64; 3]]) -> Vec<Option<Neighbor>>
where
    I: SpatialIndex + ?Sized,
{
    debug!("nearest batch: {} queries over {} points", queries.len(), index.len());
    queries.par_iter().map(|&q| index.nearest(q)).collect()
}

/// Same as [`nearest_batch`] for an interleaved `x, y, z, ...` query buffer.
pub fn nearest_batch_flat<I>(index: &I, queries: &[f64]) -> Vec<Option<Neighbor>>
where
    I: SpatialIndex + ?Sized,
{
    queries
        .par_chunks_exact(3)
        .map(|q| index.nearest([q[0], q[1], q[2]]))
        .collect()
}

/// For each query, the closest point farther than `epsilon` from it.
///
/// Passing the indexed positions themselves as queries yields every point's closest other point.
pub fn nearest_other_batch<I>(
    index: &I,
    queries: &[[f64; 3]],
    epsilon: f64,
) -> Vec<Option<Neighbor>>
where
    I: SpatialIndex + ?Sized,
{
    debug!("nearest-other batch: {} queries, epsilon {}", queries.len(), epsilon);
    queries.par_iter().map(|&q| index.nearest_other(q, epsilon)).collect()
}

pub fn k_nearest_batch<I>(index: &I, queries: &[[f64; 3]], k: usize) -> Vec<Vec<Neighbor>>
where
    I: SpatialIndex + ?Sized,
{
    debug!("k-nearest batch: {} queries, k = {}", queries.len(), k);
    queries.par_iter().map(|&q| index.k_nearest(q, k)).collect()
}

/// Neighbours within `radius` of each query, keeping at most the `max_neighbors` closest per query.
pub fn within_radius_batch<I>(
    index: &I,
    queries: &[[f64; 3]],
    radius: f64,
    max_neighbors: usize,
) -> Vec<Vec<Neighbor>>
where
    I: SpatialIndex + ?Sized,
{
    debug!(
        "radius batch: {} queries, radius {}, at most {} neighbours each",
        queries.len(),
        radius,
        max_neighbors
    );
    queries
        .par_iter()
        .map(|&q| {
            let mut found = index.within_radius(q, radius);
            found.truncate(max_neighbors);
            found
        })
        .collect()
}

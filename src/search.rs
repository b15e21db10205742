use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bounds::{dist_sq, BoundingBox};
use crate::kdtree::{KdTree, NONE};

/// A query result: an index into the original point sequence and its squared distance to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance_sq: f64,
}

impl Neighbor {
    pub fn new(index: usize, distance_sq: f64) -> Self {
        Self { index, distance_sq }
    }

    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

// Orders by distance, then by index so equal distances still have a stable order.
impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

fn is_finite(p: [f64; 3]) -> bool {
    p.iter().all(|c| c.is_finite())
}

impl KdTree {
    /// Finds the indexed point closest to `query`.
    ///
    /// Returns `None` only if `query` has a non-finite coordinate.
    pub fn nearest(&self, query: [f64; 3]) -> Option<Neighbor> {
        if !is_finite(query) {
            return None;
        }
        self.best_where(query, |_| true)
    }

    /// Branch-and-bound search for the closest point whose squared distance passes `accept`.
    ///
    /// The near side of each split plane is searched first; the far side only while the best
    /// squared distance so far is still larger than the squared distance to the plane. The first
    /// accepted point is always taken, even if its squared distance overflowed to infinity.
    fn best_where<A>(&self, query: [f64; 3], accept: A) -> Option<Neighbor>
    where
        A: Fn(f64) -> bool,
    {
        let mut best_sq = f64::INFINITY;
        let mut best = NONE;

        // (node, squared distance from the query to the plane separating it from the query)
        let mut stack: Vec<(u32, f64)> = Vec::with_capacity(64);
        stack.push((0, 0.0));

        while let Some((id, plane_sq)) = stack.pop() {
            if best != NONE && plane_sq >= best_sq {
                continue;
            }
            let node = &self.nodes[id as usize];

            let d2 = dist_sq(node.pivot, query);
            if accept(d2) && (best == NONE || d2 < best_sq) {
                best_sq = d2;
                best = node.pivot_index;
            }

            let axis = node.axis as usize;
            let diff = query[axis] - node.pivot[axis];
            let (near, far) = if diff <= 0.0 { (node.left, node.right) } else { (node.right, node.left) };

            // Far is pushed first so the whole near subtree is searched before it is reconsidered.
            if far != NONE {
                stack.push((far, diff * diff));
            }
            if near != NONE {
                stack.push((near, 0.0));
            }
        }

        (best != NONE).then(|| Neighbor::new(best as usize, best_sq))
    }

    /// The closest point farther than `epsilon` from `query`.
    ///
    /// Querying at the position of an indexed point finds its closest neighbour instead of the
    /// point itself, and any other point within `epsilon` is skipped as a duplicate. A negative
    /// or NaN `epsilon` skips nothing, like [`KdTree::nearest`].
    pub fn nearest_other(&self, query: [f64; 3], epsilon: f64) -> Option<Neighbor> {
        if !is_finite(query) {
            return None;
        }
        if epsilon.is_nan() || epsilon < 0.0 {
            return self.best_where(query, |_| true);
        }
        let eps_sq = epsilon * epsilon;
        self.best_where(query, |d2| d2 > eps_sq)
    }

    /// Finds the `k` indexed points closest to `query`, sorted by ascending distance.
    ///
    /// `k` is clamped to the number of indexed points. Points at equal distance are all
    /// candidates; when they straddle the k-th place the lower indices are kept.
    pub fn k_nearest(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len());
        if k == 0 || !is_finite(query) {
            return Vec::new();
        }

        // Max-heap: the worst of the current k best sits on top.
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        let mut stack: Vec<(u32, f64)> = Vec::with_capacity(64);
        stack.push((0, 0.0));

        while let Some((id, plane_sq)) = stack.pop() {
            if heap.len() == k && heap.peek().is_some_and(|worst| plane_sq > worst.distance_sq) {
                continue;
            }
            let node = &self.nodes[id as usize];

            let candidate = Neighbor::new(node.pivot_index as usize, dist_sq(node.pivot, query));
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }

            let axis = node.axis as usize;
            let diff = query[axis] - node.pivot[axis];
            let (near, far) = if diff <= 0.0 { (node.left, node.right) } else { (node.right, node.left) };
            if far != NONE {
                stack.push((far, diff * diff));
            }
            if near != NONE {
                stack.push((near, 0.0));
            }
        }

        heap.into_sorted_vec()
    }

    /// k-nearest by repeated single-best searches, each restricted to points strictly farther
    /// than the previous round's result.
    ///
    /// Kept for callers that depend on this exact behaviour. Because the restriction is strict,
    /// points at exactly the same distance as an earlier result are never returned, and neither
    /// are points coincident with `query` (the first round starts from distance zero). The
    /// result may therefore hold fewer than `min(k, len())` entries. Prefer
    /// [`KdTree::k_nearest`].
    pub fn k_nearest_iterated(&self, query: [f64; 3], k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len());
        if k == 0 || !is_finite(query) {
            return Vec::new();
        }

        let mut found = Vec::with_capacity(k);
        let mut min_sq = 0.0;
        for _ in 0..k {
            match self.best_where(query, |d2| d2 > min_sq) {
                Some(n) => {
                    min_sq = n.distance_sq;
                    found.push(n);
                }
                None => break,
            }
        }
        found
    }

    /// The `k`-th closest point to `query`, counting from 1.
    ///
    /// Returns `None` when `k` is 0 or larger than the number of indexed points.
    pub fn kth_nearest(&self, query: [f64; 3], k: usize) -> Option<Neighbor> {
        if k == 0 || k > self.len() {
            return None;
        }
        self.k_nearest(query, k).pop()
    }

    /// All indexed points with `0 < distance <= radius` from `query`, sorted by ascending distance.
    ///
    /// Zero-distance matches are left out so that querying at the position of an indexed point
    /// does not report the point itself. A negative or NaN radius matches nothing.
    pub fn within_radius(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        self.range(query, radius, false)
    }

    /// Like [`KdTree::within_radius`] but also reports points coincident with `query`.
    pub fn within_radius_inclusive(&self, query: [f64; 3], radius: f64) -> Vec<Neighbor> {
        self.range(query, radius, true)
    }

    fn range(&self, query: [f64; 3], radius: f64, inclusive: bool) -> Vec<Neighbor> {
        if radius.is_nan() || radius < 0.0 || !is_finite(query) {
            return Vec::new();
        }
        let r_sq = radius * radius;
        let mut found = Vec::new();

        // Each node carries the box its subtree can occupy, narrowed by every split plane above it.
        let mut stack: Vec<(u32, BoundingBox)> = vec![(0, self.bounds)];
        while let Some((id, cell)) = stack.pop() {
            if cell.dist_sq_to(query) > r_sq {
                continue;
            }
            let node = &self.nodes[id as usize];

            let d2 = dist_sq(node.pivot, query);
            if d2 <= r_sq && (inclusive || d2 > 0.0) {
                found.push(Neighbor::new(node.pivot_index as usize, d2));
            }

            let axis = node.axis as usize;
            let (lower, upper) = cell.split(axis, node.pivot[axis]);
            if node.left != NONE {
                stack.push((node.left, lower));
            }
            if node.right != NONE {
                stack.push((node.right, upper));
            }
        }

        found.sort_unstable();
        found
    }
}

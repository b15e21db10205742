use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use parking_lot::RwLock;

use crate::kdtree::KdTree;
use crate::position::Position;

/// A slot holding the current tree for a point set whose positions change over time.
///
/// Rebuilding constructs the new tree first and only then swaps it in, so readers either see
/// the previous tree or the new one, never a partially built one. Readers take a
/// [`snapshot`](SharedIndex::snapshot) and query it without holding any lock.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Option<Arc<KdTree>>>,
    generation: AtomicU64,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: Option<KdTree>) -> Self {
        let index = Self::new();
        index.replace(tree);
        index
    }

    /// Rebuilds from `points` and swaps the result in. Returns whether a tree is now present.
    pub fn rebuild<P: Position>(&self, points: &[P]) -> bool {
        self.replace(KdTree::build(points))
    }

    pub fn rebuild_by<T, F>(&self, items: &[T], position_of: F) -> bool
    where
        F: Fn(&T) -> [f64; 3],
    {
        self.replace(KdTree::build_by(items, position_of))
    }

    pub fn rebuild_flat(&self, coords: &[f64]) -> bool {
        self.replace(KdTree::from_flat(coords))
    }

    /// Swaps in `tree`, dropping this handle's reference to the previous one.
    pub fn replace(&self, tree: Option<KdTree>) -> bool {
        let present = tree.is_some();
        let tree = tree.map(Arc::new);
        let previous = std::mem::replace(&mut *self.current.write(), tree);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("k-d tree handle now at generation {} (tree present: {})", generation, present);
        // The old tree is freed here, outside the write lock, unless a reader still holds it.
        drop(previous);
        present
    }

    pub fn clear(&self) {
        self.replace(None);
    }

    /// The current tree, if any. Queries against the snapshot are unaffected by later rebuilds.
    pub fn snapshot(&self) -> Option<Arc<KdTree>> {
        self.current.read().clone()
    }

    /// Number of times the tree has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

use std::fmt;

use log::{debug, trace, warn};

use crate::bounds::BoundingBox;
use crate::error::BuildError;
use crate::position::Position;

/// Child slot marker for "no child".
pub(crate) const NONE: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KdNode {
    pub(crate) pivot: [f64; 3],
    // Index into the caller's original point sequence.
    pub(crate) pivot_index: u32,
    pub(crate) left: u32, // NONE if absent
    pub(crate) right: u32,
    pub(crate) axis: u8,
}

/// A 3D k-d tree over a fixed snapshot of points.
///
/// Every point of the snapshot becomes exactly one node. The split axis cycles x, y, z with
/// depth, the left subtree holds points with `coord[axis] <= pivot[axis]` and the right subtree
/// points with `coord[axis] > pivot[axis]`. Queries return indices into the sequence the tree
/// was built from.
///
/// The tree never changes after construction. If positions move, build a new tree (see
/// [`SharedIndex`](crate::SharedIndex) for swapping it in under concurrent readers).
#[derive(Clone, Debug, PartialEq)]
pub struct KdTree {
    // Pre-order; the root is node 0.
    pub(crate) nodes: Vec<KdNode>,
    pub(crate) bounds: BoundingBox,
    depth: usize,
}

impl KdTree {
    /// Builds a tree from a slice of positions.
    ///
    /// Returns `None` when `points` is empty or cannot be indexed (see [`KdTree::try_build`]).
    pub fn build<P: Position>(points: &[P]) -> Option<KdTree> {
        Self::or_log(Self::try_build(points))
    }

    /// Builds a tree from arbitrary records, reading each record's position through `position_of`.
    pub fn build_by<T, F>(items: &[T], position_of: F) -> Option<KdTree>
    where
        F: Fn(&T) -> [f64; 3],
    {
        Self::or_log(Self::try_build_by(items, position_of))
    }

    /// Builds a tree from an interleaved `x, y, z, x, y, z, ...` buffer.
    ///
    /// A trailing partial triple is ignored.
    pub fn from_flat(coords: &[f64]) -> Option<KdTree> {
        Self::or_log(Self::try_from_flat(coords))
    }

    /// Like [`KdTree::build`], failing with [`BuildError::Empty`],
    /// [`BuildError::NonFinite`] or [`BuildError::TooManyPoints`].
    pub fn try_build<P: Position>(points: &[P]) -> Result<KdTree, BuildError> {
        Self::build_with(points.len(), |i| points[i].position())
    }

    /// Like [`KdTree::build_by`], failing with [`BuildError::Empty`],
    /// [`BuildError::NonFinite`] or [`BuildError::TooManyPoints`].
    pub fn try_build_by<T, F>(items: &[T], position_of: F) -> Result<KdTree, BuildError>
    where
        F: Fn(&T) -> [f64; 3],
    {
        Self::build_with(items.len(), |i| position_of(&items[i]))
    }

    /// Like [`KdTree::from_flat`], failing with [`BuildError::Empty`],
    /// [`BuildError::NonFinite`] or [`BuildError::TooManyPoints`].
    pub fn try_from_flat(coords: &[f64]) -> Result<KdTree, BuildError> {
        Self::build_with(coords.len() / 3, |i| [coords[i * 3], coords[i * 3 + 1], coords[i * 3 + 2]])
    }

    fn or_log(result: Result<KdTree, BuildError>) -> Option<KdTree> {
        match result {
            Ok(tree) => Some(tree),
            Err(BuildError::Empty) => {
                trace!("no points to index, no k-d tree built");
                None
            }
            Err(e) => {
                warn!("k-d tree not built: {}", e);
                None
            }
        }
    }

    /// Shared builder behind every entry point: `position(i)` yields the position of original index `i`.
    fn build_with<F>(count: usize, position: F) -> Result<KdTree, BuildError>
    where
        F: Fn(usize) -> [f64; 3],
    {
        if count == 0 {
            return Err(BuildError::Empty);
        }
        if count >= NONE as usize {
            return Err(BuildError::TooManyPoints { count });
        }

        for i in 0..count {
            if let Some(axis) = position(i).iter().position(|c| !c.is_finite()) {
                return Err(BuildError::NonFinite { index: i, axis });
            }
        }
        let bounds = BoundingBox::enclosing((0..count).map(&position)).ok_or(BuildError::Empty)?;

        let mut builder = Builder {
            position: &position,
            indices: (0..count as u32).collect(),
            nodes: Vec::with_capacity(count),
            depth: 0,
        };
        builder.run();

        debug!(
            "built k-d tree over {} points, depth {} (balanced depth {})",
            count,
            builder.depth,
            usize::BITS - count.leading_zeros()
        );

        Ok(KdTree {
            nodes: builder.nodes,
            bounds,
            depth: builder.depth,
        })
    }

    /// Number of indexed points, which is also the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: an empty point set produces no tree at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels on the longest root-to-leaf path. A single point has depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Smallest axis-aligned box containing every indexed point.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { tree: self, id: 0, depth: 0 }
    }

    /// Visits all nodes in pre-order (node, left subtree, right subtree).
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { tree: self, stack: vec![(0, 0)] }
    }

    /// Indented listing of pivot indices in pre-order, two spaces per level.
    ///
    /// Mostly useful for eyeballing how deep the tree is and how well the split heuristic did.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes() {
            writeln!(f, "{:indent$}{}", "", node.pivot_index(), indent = node.depth() * 2)?;
        }
        Ok(())
    }
}

/// Borrowed view of one node of a [`KdTree`].
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    tree: &'a KdTree,
    id: u32,
    depth: usize,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a KdNode {
        &self.tree.nodes[self.id as usize]
    }

    /// Split axis: 0 for x, 1 for y, 2 for z. Always `depth % 3`.
    pub fn axis(&self) -> usize {
        self.node().axis as usize
    }

    pub fn pivot(&self) -> [f64; 3] {
        self.node().pivot
    }

    /// Index of the pivot in the original point sequence.
    pub fn pivot_index(&self) -> usize {
        self.node().pivot_index as usize
    }

    /// Distance from the root, which is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn left(&self) -> Option<NodeRef<'a>> {
        self.child(self.node().left)
    }

    pub fn right(&self) -> Option<NodeRef<'a>> {
        self.child(self.node().right)
    }

    pub fn is_leaf(&self) -> bool {
        self.node().left == NONE && self.node().right == NONE
    }

    fn child(&self, id: u32) -> Option<NodeRef<'a>> {
        (id != NONE).then(|| NodeRef { tree: self.tree, id, depth: self.depth + 1 })
    }
}

/// Pre-order iterator over the nodes of a [`KdTree`].
pub struct Nodes<'a> {
    tree: &'a KdTree,
    stack: Vec<(u32, usize)>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = &self.tree.nodes[id as usize];
        if node.right != NONE { self.stack.push((node.right, depth + 1)); }
        if node.left != NONE { self.stack.push((node.left, depth + 1)); }
        Some(NodeRef { tree: self.tree, id, depth })
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Pending index range `indices[start..=end]` waiting to become a subtree.
struct Range {
    start: usize,
    end: usize,
    depth: usize,
    parent: u32,
    side: Side,
}

struct Builder<'a, F> {
    position: &'a F,
    // Permutation of the original indices, partitioned in place.
    indices: Vec<u32>,
    nodes: Vec<KdNode>,
    depth: usize,
}

impl<'a, F> Builder<'a, F>
where
    F: Fn(usize) -> [f64; 3],
{
    // Iterative so that coincident or adversarial inputs, which degrade to a chain as deep as
    // the point count, cannot overflow the call stack.
    fn run(&mut self) {
        let mut stack = vec![Range {
            start: 0,
            end: self.indices.len() - 1,
            depth: 0,
            parent: NONE,
            side: Side::Left,
        }];

        while let Some(range) = stack.pop() {
            let axis = range.depth % 3;
            let split = self.partition(range.start, range.end, axis);
            let pivot_index = self.indices[split];

            let id = self.nodes.len() as u32;
            self.nodes.push(KdNode {
                pivot: (self.position)(pivot_index as usize),
                pivot_index,
                left: NONE,
                right: NONE,
                axis: axis as u8,
            });
            if range.parent != NONE {
                let parent = &mut self.nodes[range.parent as usize];
                match range.side {
                    Side::Left => parent.left = id,
                    Side::Right => parent.right = id,
                }
            }
            self.depth = self.depth.max(range.depth + 1);

            // Right is pushed first so the left subtree is emitted next, keeping `nodes` in pre-order.
            if split < range.end {
                stack.push(Range { start: split + 1, end: range.end, depth: range.depth + 1, parent: id, side: Side::Right });
            }
            if split > range.start {
                stack.push(Range { start: range.start, end: split - 1, depth: range.depth + 1, parent: id, side: Side::Left });
            }
        }
    }

    #[inline]
    fn coord(&self, slot: usize, axis: usize) -> f64 {
        (self.position)(self.indices[slot] as usize)[axis]
    }

    /// Median of the values at the first, middle and last slot of the range.
    fn split_point(&self, start: usize, end: usize, axis: usize) -> usize {
        let a = self.coord(start, axis);
        let b = self.coord(end, axis);
        let mid = (start + end) / 2;
        let m = self.coord(mid, axis);

        if a > b {
            if m > a {
                start
            } else if b > m {
                end
            } else {
                mid
            }
        } else if a > m {
            start
        } else if m > b {
            end
        } else {
            mid
        }
    }

    /// Partitions `indices[start..=end]` around the median-of-three pivot and returns the slot
    /// the pivot ends up in. Everything before it is `<=` the pivot on `axis`, everything after is `>`.
    fn partition(&mut self, start: usize, end: usize, axis: usize) -> usize {
        let split = self.split_point(start, end, axis);
        let pivot = self.coord(split, axis);
        self.indices.swap(start, split);

        // The pivot walks forward one slot each time a `<=` value is passed over, so it always
        // sits at `curr - 1`.
        let mut curr = start + 1;
        let mut last = end;
        while curr <= last {
            if self.coord(curr, axis) > pivot {
                self.indices.swap(curr, last);
                last -= 1;
            } else {
                self.indices.swap(curr - 1, curr);
                curr += 1;
            }
        }

        curr - 1
    }
}

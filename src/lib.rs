//! # atomkd
//!
//! `atomkd` is a Rust library for answering "which point is closest to here" over a set of 3D
//! positions, such as the atoms of a molecular structure, without scanning every point. It is
//! designed to be used in Rust as well as compiled to WebAssembly (WASM).
//!
//! ## Features
//!
//! - **k-d tree**: median-of-three split selection over an index permutation, so the caller's
//!   point data is never copied or reordered.
//! - **Queries**: nearest neighbor, closest other point, k-nearest, k-th nearest and radius
//!   search, all returning indices into the original point sequence.
//! - **Parallel batches**: many queries at once on the rayon thread pool.
//! - **Rebuild and swap**: [`SharedIndex`] replaces the tree when positions change while
//!   readers keep querying.
//! - **WASM-first**: [`KdTree3D`] exposes the tree to JavaScript over flat `Float64Array`s.
//!
//! ## Example
//!
//! ```
//! use atomkd::KdTree;
//!
//! let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [5.0, 5.0, 5.0]];
//! let tree = KdTree::build(&points).unwrap();
//!
//! let hit = tree.nearest([0.9, 0.0, 0.0]).unwrap();
//! assert_eq!(hit.index, 1);
//! assert!((hit.distance_sq - 0.01).abs() < 1e-12);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`KdTree`] struct. Building from an empty point set yields
//! `None`; the [`SpatialIndex`] trait is implemented for `Option<KdTree>` so such a "no tree"
//! answers every query with no result.

mod bounds;
mod error;
mod handle;
mod index;
mod kdtree;
mod position;
mod search;
pub mod batch;
pub mod wasm;

pub use bounds::BoundingBox;
pub use error::BuildError;
pub use handle::SharedIndex;
pub use index::LinearScan;
pub use index::SpatialIndex;
pub use kdtree::KdTree;
pub use kdtree::NodeRef;
pub use kdtree::Nodes;
pub use position::Position;
pub use search::Neighbor;
pub use wasm::KdTree3D;

use thiserror::Error;

/// Reasons a point set cannot be turned into a [`KdTree`](crate::KdTree).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// No points were supplied. There is no tree to build.
    #[error("cannot build a k-d tree from zero points")]
    Empty,

    /// A coordinate is NaN or infinite, which would break the ordering the partition relies on.
    #[error("point {index} has a non-finite coordinate on axis {axis}")]
    NonFinite { index: usize, axis: usize },

    /// Node slots and pivot indices are stored as `u32`.
    #[error("{count} points exceed the k-d tree capacity of 4294967294 points")]
    TooManyPoints { count: usize },
}

/// Axis-aligned bounding box in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point yielded by `points`.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Self::new(first, first);
        for p in iter {
            b.grow(p);
        }
        Some(b)
    }

    /// Extends the box so that it contains `p`.
    pub fn grow(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            if p[i] < self.min[i] { self.min[i] = p[i]; }
            if p[i] > self.max[i] { self.max[i] = p[i]; }
        }
    }

    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Squared distance from `p` to the closest point of the box, zero if `p` is inside.
    pub fn dist_sq_to(&self, p: [f64; 3]) -> f64 {
        let mut d2 = 0.0;
        for i in 0..3 {
            let v = p[i];
            if v < self.min[i] { d2 += (self.min[i] - v).powi(2); }
            else if v > self.max[i] { d2 += (v - self.max[i]).powi(2); }
        }
        d2
    }

    /// Cuts the box with the plane `coord[axis] = value`, returning the lower and upper halves.
    pub fn split(&self, axis: usize, value: f64) -> (Self, Self) {
        let mut lower = *self;
        let mut upper = *self;
        lower.max[axis] = lower.max[axis].min(value);
        upper.min[axis] = upper.min[axis].max(value);
        (lower, upper)
    }
}

/// Squared Euclidean distance between two points.
#[inline]
pub fn dist_sq(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

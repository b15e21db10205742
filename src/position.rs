/// Anything that has a location in the shared 3D frame of a point set.
///
/// Implement this for atom or particle records so a [`KdTree`](crate::KdTree) can be built
/// directly from them. All items handed to one build must live in the same coordinate frame;
/// the tree has no way of checking that.
pub trait Position {
    fn position(&self) -> [f64; 3];
}

impl Position for [f64; 3] {
    #[inline]
    fn position(&self) -> [f64; 3] {
        *self
    }
}

impl Position for [f32; 3] {
    #[inline]
    fn position(&self) -> [f64; 3] {
        [self[0] as f64, self[1] as f64, self[2] as f64]
    }
}

impl Position for (f64, f64, f64) {
    #[inline]
    fn position(&self) -> [f64; 3] {
        [self.0, self.1, self.2]
    }
}

impl<T: Position + ?Sized> Position for &T {
    #[inline]
    fn position(&self) -> [f64; 3] {
        (**self).position()
    }
}

//! Approximate equality for nested numeric containers.

/// Default absolute tolerance for [`values_close`].
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Approximate equality with an absolute tolerance.
///
/// Leaves are close when they differ by strictly less than the tolerance.
/// Containers are close when they have the same length and every
/// corresponding element pair is close.
pub trait Close {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool;
}

impl Close for f64 {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool {
        (self - other).abs() < tolerance
    }
}

impl Close for f32 {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool {
        (f64::from(*self) - f64::from(*other)).abs() < tolerance
    }
}

impl<T: Close> Close for [T] {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.close_to(b, tolerance))
    }
}

impl<T: Close> Close for Vec<T> {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool {
        self.as_slice().close_to(other.as_slice(), tolerance)
    }
}

impl<T: Close, const N: usize> Close for [T; N] {
    fn close_to(&self, other: &Self, tolerance: f64) -> bool {
        self.as_slice().close_to(other.as_slice(), tolerance)
    }
}

/// `a` and `b` are close under [`DEFAULT_TOLERANCE`].
pub fn values_close<T: Close + ?Sized>(a: &T, b: &T) -> bool {
    a.close_to(b, DEFAULT_TOLERANCE)
}

/// `a` and `b` are close under an explicit tolerance.
pub fn values_close_with<T: Close + ?Sized>(a: &T, b: &T, tolerance: f64) -> bool {
    a.close_to(b, tolerance)
}

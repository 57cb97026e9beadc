//! Pointer geometry

use serde::{Deserialize, Serialize};

/// A point in pixels. Client-space or container-space depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Client-space origin of the comment container's bounding box.
///
/// Pin coordinates are stored relative to this origin, so the host must
/// refresh it whenever the container scrolls or resizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerBounds {
    pub left: f64,
    pub top: f64,
}

impl ContainerBounds {
    #[must_use]
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Convert a client-space pointer position into container coordinates.
    #[must_use]
    pub fn to_local(self, client: Point) -> Point {
        Point::new(client.x - self.left, client.y - self.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_local_subtracts_origin() {
        let bounds = ContainerBounds::new(100.0, 40.0);
        assert_eq!(bounds.to_local(Point::new(110.0, 60.0)), Point::new(10.0, 20.0));
    }

    #[test]
    fn is_finite_rejects_nan_and_infinity() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }
}

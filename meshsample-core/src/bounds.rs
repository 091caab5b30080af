//! Axis-aligned bounding boxes

use crate::point::*;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
///
/// A box built from no points is *null*: its `min` is `+inf` and its `max`
/// is `-inf` on every axis, so the first `add` snaps it to that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// Create a null box that contains nothing
    pub fn null() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create a box from two corners, ordering them per axis
    pub fn new(a: Point3d, b: Point3d) -> Self {
        Self {
            min: Point3d::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3d::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Componentwise min/max over a set of points
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3d>,
    {
        let mut bbox = Self::null();
        for p in points {
            bbox.add(p);
        }
        bbox
    }

    /// Grow the box to contain `p`
    pub fn add(&mut self, p: &Point3d) {
        for i in 0..3 {
            if p[i] < self.min[i] {
                self.min[i] = p[i];
            }
            if p[i] > self.max[i] {
                self.max[i] = p[i];
            }
        }
    }

    /// True when no point has been added
    pub fn is_null(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Edge lengths along x, y and z (zero for a null box)
    pub fn extent(&self) -> Vector3d {
        if self.is_null() {
            return Vector3d::zeros();
        }
        self.max - self.min
    }

    pub fn max_extent(&self) -> f64 {
        self.extent().max()
    }

    /// Length of the space diagonal
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    pub fn center(&self) -> Point3d {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn contains(&self, p: &Point3d) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Squared distance from `p` to the closest point of the box (zero inside)
    pub fn distance_squared(&self, p: &Point3d) -> f64 {
        (0..3)
            .map(|i| {
                let d = (self.min[i] - p[i]).max(0.0).max(p[i] - self.max[i]);
                d * d
            })
            .sum()
    }

    /// Enlarge the box by `amount` on every side
    pub fn inflate(&mut self, amount: f64) {
        if self.is_null() {
            return;
        }
        let delta = Vector3d::repeat(amount);
        self.min -= delta;
        self.max += delta;
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_box() {
        let bbox = BoundingBox::null();
        assert!(bbox.is_null());
        assert_eq!(bbox.extent(), Vector3d::zeros());
        assert_eq!(bbox.diagonal(), 0.0);
    }

    #[test]
    fn test_from_points() {
        let points = vec![
            Point3d::new(1.0, -2.0, 0.5),
            Point3d::new(-1.0, 3.0, 0.0),
            Point3d::new(0.0, 0.0, 2.0),
        ];
        let bbox = BoundingBox::from_points(&points);
        assert!(!bbox.is_null());
        assert_eq!(bbox.min, Point3d::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, Point3d::new(1.0, 3.0, 2.0));
        assert_eq!(bbox.max_extent(), 5.0);
        assert!(points.iter().all(|p| bbox.contains(p)));
    }

    #[test]
    fn test_single_point_is_not_null() {
        let bbox = BoundingBox::from_points(&[Point3d::new(1.0, 1.0, 1.0)]);
        assert!(!bbox.is_null());
        assert_eq!(bbox.extent(), Vector3d::zeros());
    }

    #[test]
    fn test_distance_squared() {
        let bbox = BoundingBox::new(Point3d::origin(), Point3d::new(1.0, 1.0, 1.0));
        assert_eq!(bbox.distance_squared(&Point3d::new(0.5, 0.5, 0.5)), 0.0);
        assert_relative_eq!(bbox.distance_squared(&Point3d::new(2.0, 0.5, 0.5)), 1.0);
        assert_relative_eq!(bbox.distance_squared(&Point3d::new(-1.0, -1.0, 0.5)), 2.0);
    }

    #[test]
    fn test_inflate_and_diagonal() {
        let mut bbox = BoundingBox::new(Point3d::origin(), Point3d::new(1.0, 1.0, 1.0));
        assert_relative_eq!(bbox.diagonal(), 3.0_f64.sqrt());
        bbox.inflate(0.5);
        assert_eq!(bbox.min, Point3d::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(bbox.center().x, 0.5);
    }
}

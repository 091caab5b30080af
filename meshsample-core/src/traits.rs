//! Core traits for meshsample

use crate::{bounds::BoundingBox, mesh::Mesh, point::*};

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)>;
}

/// Trait for objects with an axis-aligned extent
pub trait Bounded {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> BoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3d {
        self.bounding_box().center()
    }
}

impl Bounded for Mesh {
    fn bounding_box(&self) -> BoundingBox {
        *Mesh::bounding_box(self)
    }
}

impl Bounded for [Point3d] {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_slices_and_meshes() {
        let points = vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(2.0, 4.0, 6.0)];
        assert_eq!(points.as_slice().center(), Point3d::new(1.0, 2.0, 3.0));

        let mesh = Mesh::from_vertices(&points);
        assert_eq!(Bounded::bounding_box(&mesh), points.as_slice().bounding_box());
        let empty: &[Point3d] = &[];
        assert!(Bounded::bounding_box(empty).is_null());
    }
}

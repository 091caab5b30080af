//! # MeshSample
//!
//! Downsampling of 3D triangle meshes and point clouds.
//!
//! This is the umbrella crate that provides convenient access to all MeshSample functionality.
//! You can use this crate to get everything in one place, or use individual crates for
//! more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Mesh model with face adjacency, samples, bounding boxes, errors
//! - **Algorithms**: Spatial grid, uniform sampling, Poisson-disk sampling, grid clustering
//!
//! ## Quick Start
//!
//! ```rust
//! use meshsample::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let vertices = vec![
//!     Point3d::new(0.0, 0.0, 0.0),
//!     Point3d::new(1.0, 0.0, 0.0),
//!     Point3d::new(1.0, 1.0, 0.0),
//!     Point3d::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0i32, 1, 2], [0, 2, 3]];
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let blue_noise = poisson_disk_sample(&vertices, &faces, 0.1, false, false, &mut rng).unwrap();
//! let clustered = cluster_vertices(&vertices, 2.0).unwrap();
//! assert_eq!(clustered.len(), 1);
//! assert!(!blue_noise.is_empty());
//! ```

use rand::Rng;

// Re-export core functionality
pub use meshsample_core::*;

// Re-export sub-crates
pub use meshsample_algorithms as algorithms;

use meshsample_algorithms::{GridClustering, PoissonDiskParams, PoissonDiskSampler};

/// Poisson-disk sample a mesh given as vertex rows and triangle index rows.
///
/// With no faces the vertices themselves are pruned. Returns positions in
/// generation order; no two are closer than `radius` (straight-line, or along
/// the surface when `use_geodesic_distance` is set).
pub fn poisson_disk_sample<I: FaceIndex, R: Rng + ?Sized>(
    vertices: &[Point3d],
    faces: &[[I; 3]],
    radius: f64,
    use_geodesic_distance: bool,
    best_choice_sampling: bool,
    rng: &mut R,
) -> Result<Vec<Point3d>> {
    let mesh = Mesh::from_vertices_and_faces(vertices, faces)?;
    let params = PoissonDiskParams::new(radius)
        .with_geodesic_distance(use_geodesic_distance)
        .with_best_choice(best_choice_sampling);
    Ok(PoissonDiskSampler::new(params).run(&mesh, rng)?.positions())
}

/// One centroid per occupied grid cell of side `cell_size`
pub fn cluster_vertices(vertices: &[Point3d], cell_size: f64) -> Result<Vec<Point3d>> {
    GridClustering::new(cell_size).cluster_points(vertices)
}

/// Draw `num_samples` distinct vertices; all of them when there are fewer
pub fn random_sample<I: FaceIndex, R: Rng + ?Sized>(
    vertices: &[Point3d],
    faces: &[[I; 3]],
    num_samples: usize,
    rng: &mut R,
) -> Result<Vec<Point3d>> {
    let mesh = Mesh::from_vertices_and_faces(vertices, faces)?;
    Ok(algorithms::sample_vertices(&mesh, num_samples, rng)
        .into_iter()
        .map(|s| s.position)
        .collect())
}

/// Convenient imports for common use cases
pub mod prelude {
    pub use meshsample_core::*;

    pub use meshsample_algorithms::{
        sample_surface_uniform, sample_vertices, sample_vertices_with_replacement, CandidateSource,
        FaceGraph, GridClustering, PointGrid, PoissonDiskOutput, PoissonDiskParams,
        PoissonDiskSampler, PoissonDiskStats, RepresentativeStrategy, SpatialGrid, SurfaceSampler,
    };

    pub use crate::{cluster_vertices, poisson_disk_sample, random_sample};
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square() -> (Vec<Point3d>, Vec<[u32; 3]>) {
        (
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_poisson_disk_sample_entry_point() {
        let (vertices, faces) = square();
        let mut rng = StdRng::seed_from_u64(1);
        let points = poisson_disk_sample(&vertices, &faces, 0.1, false, true, &mut rng).unwrap();
        assert!(points.len() > 20);
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert!((points[i] - points[j]).norm() >= 0.1 * (1.0 - 1e-9));
            }
        }
    }

    #[test]
    fn test_poisson_disk_sample_point_cloud() {
        let (vertices, _) = square();
        let no_faces: Vec<[u32; 3]> = Vec::new();
        let mut rng = StdRng::seed_from_u64(1);
        let points = poisson_disk_sample(&vertices, &no_faces, 2.0, false, false, &mut rng).unwrap();
        assert_eq!(points, vec![vertices[0]]);
    }

    #[test]
    fn test_bad_face_index_fails_fast() {
        let (vertices, _) = square();
        let mut rng = StdRng::seed_from_u64(1);
        let faces = vec![[0i64, 1, 4]];
        assert!(matches!(
            poisson_disk_sample(&vertices, &faces, 0.1, false, false, &mut rng),
            Err(Error::InvalidIndex { face: 0, slot: 2, .. })
        ));
        assert!(random_sample(&vertices, &faces, 2, &mut rng).is_err());
    }

    #[test]
    fn test_random_sample_entry_point() {
        let (vertices, faces) = square();
        let mut rng = StdRng::seed_from_u64(4);
        let all = random_sample(&vertices, &faces, 10, &mut rng).unwrap();
        assert_eq!(all, vertices);

        let two = random_sample(&vertices, &faces, 2, &mut rng).unwrap();
        assert_eq!(two.len(), 2);
        assert_ne!(two[0], two[1]);
    }

    #[test]
    fn test_cluster_vertices_entry_point() {
        let (vertices, _) = square();
        assert_eq!(cluster_vertices(&vertices, 0.5).unwrap().len(), 4);
        assert_eq!(cluster_vertices(&vertices, 10.0).unwrap().len(), 1);
        assert!(cluster_vertices(&vertices, 0.0).is_err());
    }
}

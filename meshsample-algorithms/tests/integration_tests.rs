//! Integration tests for meshsample-algorithms
//!
//! These tests drive the samplers end to end on small meshes and point clouds
//! and check the geometric guarantees of their outputs.

use approx::assert_relative_eq;
use meshsample_algorithms::*;
use meshsample_core::{Error, Mesh, NearestNeighborSearch, Point3d};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Unit cube corners as a point cloud
fn create_cube_corners() -> Mesh {
    let mut points = Vec::new();
    for z in 0..2 {
        for y in 0..2 {
            for x in 0..2 {
                points.push(Point3d::new(x as f64, y as f64, z as f64));
            }
        }
    }
    Mesh::from_vertices(&points)
}

/// Closed unit cube with 12 outward-facing triangles
fn create_cube_mesh() -> Mesh {
    let vertices = vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(1.0, 1.0, 0.0),
        Point3d::new(0.0, 1.0, 0.0),
        Point3d::new(0.0, 0.0, 1.0),
        Point3d::new(1.0, 0.0, 1.0),
        Point3d::new(1.0, 1.0, 1.0),
        Point3d::new(0.0, 1.0, 1.0),
    ];
    let faces: Vec<[i64; 3]> = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    Mesh::from_vertices_and_faces(&vertices, &faces).unwrap()
}

fn create_line(n: usize) -> Mesh {
    let points: Vec<Point3d> = (0..n).map(|i| Point3d::new(i as f64, 0.0, 0.0)).collect();
    Mesh::from_vertices(&points)
}

fn min_pairwise_distance(points: &[Point3d]) -> f64 {
    let mut best = f64::INFINITY;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            best = best.min((points[i] - points[j]).norm());
        }
    }
    best
}

#[test]
fn test_cube_corners_collapse_to_one_sample() {
    let mesh = create_cube_corners();
    let mut rng = StdRng::seed_from_u64(0);
    let diagonal = 3.0_f64.sqrt();
    for best_choice in [false, true] {
        let points = poisson_disk_sample(&mesh, diagonal + 0.1, false, best_choice, &mut rng).unwrap();
        assert_eq!(points.len(), 1);
    }
}

#[test]
fn test_poisson_on_closed_cube() {
    let mesh = create_cube_mesh();
    assert_relative_eq!(mesh.total_area(), 6.0, epsilon = 1e-12);

    let mut rng = StdRng::seed_from_u64(2024);
    for (geodesic, best_choice) in [(false, false), (false, true), (true, false), (true, true)] {
        let params = PoissonDiskParams::new(0.2)
            .with_geodesic_distance(geodesic)
            .with_best_choice(best_choice);
        let output = PoissonDiskSampler::new(params).run(&mesh, &mut rng).unwrap();
        assert!(!output.samples.is_empty());
        assert!(output.samples.iter().all(|s| s.face().is_some()));
        if !geodesic {
            assert!(min_pairwise_distance(&output.positions()) >= 0.2 * (1.0 - 1e-9));
            // Blue-noise sets land near the packing estimate
            let expected = output.stats.expected_count;
            let accepted = output.stats.accepted_count as f64;
            assert!(accepted > 0.5 * expected && accepted < 2.5 * expected);
        }
    }
}

#[test]
fn test_poisson_count_shrinks_with_radius_on_line() {
    let mesh = create_line(20);
    let mut rng = StdRng::seed_from_u64(1);
    let counts: Vec<usize> = [0.5, 1.5, 2.5]
        .iter()
        .map(|&r| poisson_disk_sample(&mesh, r, false, false, &mut rng).unwrap().len())
        .collect();
    assert_eq!(counts, vec![20, 10, 7]);
}

#[test]
fn test_greedy_count_can_grow_with_radius() {
    // A larger radius removes B first, which frees both C and D
    let mesh = Mesh::from_vertices(&[
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.0, 0.0, 0.0),
        Point3d::new(1.5, 0.7, 0.0),
        Point3d::new(1.5, -0.7, 0.0),
    ]);
    let mut rng = StdRng::seed_from_u64(0);
    let small = poisson_disk_sample(&mesh, 0.9, false, false, &mut rng).unwrap();
    let large = poisson_disk_sample(&mesh, 1.1, false, false, &mut rng).unwrap();
    assert_eq!(small.len(), 2);
    assert_eq!(large.len(), 3);
}

#[test]
fn test_poisson_rejects_bad_radius() {
    let mesh = create_cube_mesh();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        poisson_disk_sample(&mesh, 0.0, false, false, &mut rng),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        poisson_disk_sample(&mesh, -2.0, true, true, &mut rng),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_empty_inputs_give_empty_outputs() {
    let empty = Mesh::from_vertices(&[]);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(poisson_disk_sample(&empty, 0.5, false, false, &mut rng)
        .unwrap()
        .is_empty());
    assert!(cluster_vertices(&empty, 0.5).unwrap().is_empty());
    assert!(sample_vertices(&empty, 10, &mut rng).is_empty());
    assert!(sample_surface_uniform(&empty, 10, &mut rng).is_empty());
}

#[test]
fn test_random_sample_boundary() {
    let mesh = create_cube_mesh();
    let mut rng = StdRng::seed_from_u64(3);

    let all = sample_vertices(&mesh, 100, &mut rng);
    let indices: Vec<usize> = all.iter().map(|s| s.vertex().unwrap()).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());

    let some = sample_vertices(&mesh, 5, &mut rng);
    let mut indices: Vec<usize> = some.iter().map(|s| s.vertex().unwrap()).collect();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), 5);

    assert_eq!(sample_vertices_with_replacement(&mesh, 100, &mut rng).len(), 100);
}

#[test]
fn test_surface_samples_then_cluster() {
    let mesh = create_cube_mesh();
    let mut rng = StdRng::seed_from_u64(5);
    let samples = sample_surface_uniform(&mesh, 5000, &mut rng);
    assert_eq!(samples.len(), 5000);

    let clustering = GridClustering::new(0.25);
    let reduced = clustering.cluster_samples(&samples).unwrap();
    assert!(reduced.len() <= samples.len());
    let total: f64 = reduced.iter().map(|s| s.weight).sum();
    assert_relative_eq!(total, 5000.0, epsilon = 1e-9);
    // Cells strictly inside the cube stay empty
    assert!(reduced.len() <= 125 - 8);
}

#[test]
fn test_clustering_unit_cube_mean() {
    let mut rng = StdRng::seed_from_u64(99);
    let points: Vec<Point3d> = (0..1000)
        .map(|_| Point3d::new(rng.gen(), rng.gen(), rng.gen()))
        .collect();
    let mesh = Mesh::from_vertices(&points);

    let out = cluster_vertices(&mesh, 1.0).unwrap();
    assert_eq!(out.len(), 1);

    let mean = points.iter().fold(Point3d::origin(), |acc, p| acc + p.coords / 1000.0);
    assert_relative_eq!(out[0], mean, epsilon = 1e-12);
}

#[test]
fn test_point_grid_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(17);
    let points: Vec<Point3d> = (0..400)
        .map(|_| Point3d::new(rng.gen(), rng.gen(), rng.gen()))
        .collect();
    let grid = PointGrid::new(&points, 0.1).unwrap();
    let query = Point3d::new(0.5, 0.5, 0.5);

    let mut found: Vec<usize> = grid
        .find_radius_neighbors(&query, 0.2)
        .into_iter()
        .map(|(i, _)| i)
        .collect();
    found.sort_unstable();
    let expected: Vec<usize> = (0..points.len())
        .filter(|&i| (points[i] - query).norm() <= 0.2)
        .collect();
    assert_eq!(found, expected);

    let nearest = grid.find_k_nearest(&query, 5);
    assert_eq!(nearest.len(), 5);
    let mut brute: Vec<f64> = points.iter().map(|p| (p - query).norm()).collect();
    brute.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (k, (_, d)) in nearest.iter().enumerate() {
        assert_relative_eq!(*d, brute[k], epsilon = 1e-12);
    }
}

#[test]
fn test_invalid_face_index_is_reported() {
    let vertices = vec![Point3d::origin(), Point3d::new(1.0, 0.0, 0.0)];
    let err = Mesh::from_vertices_and_faces(&vertices, &[[0i32, 1, 2]]).unwrap_err();
    assert!(matches!(err, Error::InvalidIndex { index: 2, .. }));
    let err = Mesh::from_vertices_and_faces(&vertices, &[[0i32, -1, 1]]).unwrap_err();
    assert!(matches!(err, Error::InvalidIndex { index: -1, .. }));
}

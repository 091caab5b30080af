//! Uniform random sampling of mesh vertices and surfaces
//!
//! All functions take an explicit random generator, so a seeded generator
//! reproduces the same samples.

use meshsample_core::{Mesh, Sample, Vector3d};
use rand::seq::index;
use rand::Rng;
use tracing::{debug, warn};

/// Draw `count` distinct vertices without replacement.
///
/// When `count` reaches the vertex count every vertex is returned exactly
/// once, in insertion order.
pub fn sample_vertices<R: Rng + ?Sized>(mesh: &Mesh, count: usize, rng: &mut R) -> Vec<Sample> {
    let n = mesh.vertex_count();
    if count >= n {
        return (0..n)
            .map(|vi| Sample::from_vertex(mesh.position(vi), vi))
            .collect();
    }

    index::sample(rng, n, count)
        .into_iter()
        .map(|vi| Sample::from_vertex(mesh.position(vi), vi))
        .collect()
}

/// Draw exactly `count` vertices, each uniformly and independently
pub fn sample_vertices_with_replacement<R: Rng + ?Sized>(mesh: &Mesh, count: usize, rng: &mut R) -> Vec<Sample> {
    let n = mesh.vertex_count();
    if n == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            let vi = rng.gen_range(0..n);
            Sample::from_vertex(mesh.position(vi), vi)
        })
        .collect()
}

/// Uniform barycentric coordinates over a triangle.
///
/// Two uniform values pick a point in the unit square; points past the
/// diagonal are reflected back, which keeps the density uniform.
pub fn random_barycentric<R: Rng + ?Sized>(rng: &mut R) -> Vector3d {
    let mut u: f64 = rng.gen();
    let mut v: f64 = rng.gen();
    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }
    Vector3d::new(1.0 - u - v, u, v)
}

/// Area-weighted face picker over a mesh.
///
/// Holds the cumulative area table so repeated draws cost one binary search.
/// Zero-area faces add nothing to the table and are never picked.
#[derive(Debug, Clone)]
pub struct SurfaceSampler<'a> {
    mesh: &'a Mesh,
    cumulative: Vec<f64>,
    total_area: f64,
    last_positive: Option<usize>,
}

impl<'a> SurfaceSampler<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        let areas = mesh.face_areas();
        let mut cumulative = Vec::with_capacity(areas.len());
        let mut running = 0.0;
        let mut last_positive = None;
        for (fi, area) in areas.into_iter().enumerate() {
            if area > 0.0 && area.is_finite() {
                running += area;
                last_positive = Some(fi);
            }
            cumulative.push(running);
        }

        Self {
            mesh,
            cumulative,
            total_area: running,
            last_positive,
        }
    }

    pub fn total_area(&self) -> f64 {
        self.total_area
    }

    /// True when no face has positive area
    pub fn is_empty(&self) -> bool {
        self.last_positive.is_none()
    }

    /// Pick a face with probability proportional to its area
    pub fn sample_face<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let last = self.last_positive?;
        let target = rng.gen::<f64>() * self.total_area;
        let face = self.cumulative.partition_point(|&c| c <= target);
        // Rounding can push the target onto the final sum.
        Some(face.min(last))
    }

    /// Draw one point uniformly over the surface
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Sample> {
        let face = self.sample_face(rng)?;
        let barycentric = random_barycentric(rng);
        Some(Sample::on_face(
            self.mesh.interpolate(face, &barycentric),
            face,
            barycentric,
        ))
    }

    /// Draw `count` points; empty when the surface has no area
    pub fn sample_n<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Sample> {
        if self.is_empty() {
            return Vec::new();
        }
        (0..count).filter_map(|_| self.sample(rng)).collect()
    }
}

/// Draw `count` points uniformly over the mesh surface
#[tracing::instrument(skip_all, fields(faces = mesh.face_count(), count = count))]
pub fn sample_surface_uniform<R: Rng + ?Sized>(mesh: &Mesh, count: usize, rng: &mut R) -> Vec<Sample> {
    let sampler = SurfaceSampler::new(mesh);
    if sampler.is_empty() {
        if count > 0 {
            warn!("surface has zero area, no samples drawn");
        }
        return Vec::new();
    }
    let samples = sampler.sample_n(count, rng);
    debug!(total_area = sampler.total_area(), drawn = samples.len(), "surface samples drawn");
    samples
}

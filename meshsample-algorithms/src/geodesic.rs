//! Approximate geodesic distance over the face adjacency graph
//!
//! Each face is a node placed at its centroid; adjacent faces are joined by
//! an edge weighted with the straight-line distance between centroids. A point
//! on the surface enters the graph through the faces it lies on, paying the
//! straight-line distance to each centroid. Points on faces that share a
//! vertex are joined directly. Path lengths are never shorter than the
//! straight-line distance between the two end points.

use meshsample_core::{Mesh, Point3d, Provenance, Sample};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// State for the priority queue in Dijkstra's algorithm.
#[derive(Debug, Clone, Copy)]
struct State {
    face: usize,
    distance: f64,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; equal distances settle the lower face index first.
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.face.cmp(&self.face))
    }
}

/// Face-centroid graph of a mesh
#[derive(Debug, Clone)]
pub struct FaceGraph {
    centers: Vec<Point3d>,
    corners: Vec<[usize; 3]>,
    neighbors: Vec<Vec<(usize, f64)>>,
    vertex_faces: Vec<Vec<usize>>,
}

impl FaceGraph {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let centers: Vec<Point3d> = (0..mesh.face_count())
            .into_par_iter()
            .map(|f| mesh.face_centroid(f))
            .collect();

        let mut neighbors: Vec<Vec<(usize, f64)>> = mesh
            .faces()
            .par_iter()
            .enumerate()
            .map(|(fi, face)| {
                let mut out: Vec<(usize, f64)> = Vec::with_capacity(3);
                for nf in face.neighbors() {
                    if nf != fi && !out.iter().any(|&(n, _)| n == nf) {
                        out.push((nf, (centers[nf] - centers[fi]).norm()));
                    }
                }
                out
            })
            .collect();

        // Non-manifold fans only link each face to the next one; add the way back.
        for fi in 0..neighbors.len() {
            for k in 0..neighbors[fi].len() {
                let (nf, length) = neighbors[fi][k];
                if !neighbors[nf].iter().any(|&(n, _)| n == fi) {
                    neighbors[nf].push((fi, length));
                }
            }
        }

        let mut vertex_faces = vec![Vec::new(); mesh.vertex_count()];
        for (fi, face) in mesh.faces().iter().enumerate() {
            for &vi in &face.vertices {
                if vertex_faces[vi].last() != Some(&fi) {
                    vertex_faces[vi].push(fi);
                }
            }
        }

        Self {
            centers,
            corners: mesh.faces().iter().map(|f| f.vertices).collect(),
            neighbors,
            vertex_faces,
        }
    }

    pub fn face_count(&self) -> usize {
        self.centers.len()
    }

    pub fn center(&self, face: usize) -> Point3d {
        self.centers[face]
    }

    /// Adjacent faces with centroid-to-centroid edge lengths
    pub fn neighbors(&self, face: usize) -> &[(usize, f64)] {
        self.neighbors.get(face).map_or(&[], |n| n.as_slice())
    }

    /// Faces using a vertex, in face order
    pub fn vertex_faces(&self, vertex: usize) -> &[usize] {
        self.vertex_faces.get(vertex).map_or(&[], |f| f.as_slice())
    }

    /// Whether two faces are the same or share at least one corner
    pub fn touching(&self, a: usize, b: usize) -> bool {
        match (self.corners.get(a), self.corners.get(b)) {
            (Some(ca), Some(cb)) => a == b || ca.iter().any(|v| cb.contains(v)),
            _ => false,
        }
    }

    /// Faces a sample lies on: its source face, or every face around its
    /// source vertex. Empty when the sample has no surface provenance.
    pub fn anchors(&self, sample: &Sample) -> Vec<usize> {
        match sample.provenance {
            Provenance::Face { face, .. } if face < self.centers.len() => vec![face],
            Provenance::Vertex(vertex) => self.vertex_faces(vertex).to_vec(),
            _ => Vec::new(),
        }
    }

    /// Multi-source Dijkstra from `point`, entering through `anchors`.
    ///
    /// Returns the settled graph distance of every face reachable within
    /// `cutoff`, including the entry cost from `point` to the anchor centroid.
    pub fn distances_from(&self, point: &Point3d, anchors: &[usize], cutoff: f64) -> HashMap<usize, f64> {
        let mut best: HashMap<usize, f64> = HashMap::new();
        let mut settled: HashMap<usize, f64> = HashMap::new();
        let mut heap = BinaryHeap::new();

        for &face in anchors {
            let distance = (self.centers[face] - point).norm();
            if distance <= cutoff && distance < *best.get(&face).unwrap_or(&f64::INFINITY) {
                best.insert(face, distance);
                heap.push(State { face, distance });
            }
        }

        while let Some(State { face, distance }) = heap.pop() {
            if settled.contains_key(&face) {
                continue;
            }
            settled.insert(face, distance);

            for &(next, length) in self.neighbors(face) {
                let candidate = distance + length;
                if candidate > cutoff || settled.contains_key(&next) {
                    continue;
                }
                if candidate < *best.get(&next).unwrap_or(&f64::INFINITY) {
                    best.insert(next, candidate);
                    heap.push(State {
                        face: next,
                        distance: candidate,
                    });
                }
            }
        }

        settled
    }

    /// Geodesic estimate from a source whose Dijkstra field is `field`
    /// to `target`, lying on `target_anchors`.
    ///
    /// Points on faces sharing a corner are joined by a straight segment.
    /// Returns `None` when the target is out of reach.
    pub fn distance_to(
        &self,
        source: &Point3d,
        source_anchors: &[usize],
        field: &HashMap<usize, f64>,
        target: &Point3d,
        target_anchors: &[usize],
    ) -> Option<f64> {
        let touching = source_anchors
            .iter()
            .any(|&f| target_anchors.iter().any(|&g| self.touching(f, g)));
        if touching {
            return Some((target - source).norm());
        }
        target_anchors
            .iter()
            .filter_map(|f| field.get(f).map(|d| d + (target - self.centers[*f]).norm()))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Geodesic estimate between two samples, `None` when unreachable or
    /// when either sample is not on the surface
    pub fn sample_distance(&self, a: &Sample, b: &Sample) -> Option<f64> {
        let a_anchors = self.anchors(a);
        let b_anchors = self.anchors(b);
        if a_anchors.is_empty() || b_anchors.is_empty() {
            return None;
        }
        let field = self.distances_from(&a.position, &a_anchors, f64::INFINITY);
        self.distance_to(&a.position, &a_anchors, &field, &b.position, &b_anchors)
    }
}

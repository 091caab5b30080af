//! Mesh data structures and functionality

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::point::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cross products shorter than this are treated as degenerate faces
const DEGENERATE_EPS: f64 = 1e-12;

/// A reference to one edge of a neighbouring face.
///
/// `edge` is the slot (0, 1 or 2) inside `face`; slot `i` is the edge running
/// from corner `i` to corner `(i + 1) % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceEdge {
    pub face: usize,
    pub edge: u8,
}

/// A triangle with its face-face adjacency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [usize; 3],
    /// One entry per edge slot; `None` on a border edge.
    pub adjacency: [Option<FaceEdge>; 3],
    /// Unit normal, `None` for zero-area faces.
    pub normal: Option<Vector3d>,
}

impl Face {
    /// Vertex indices of edge `slot`
    pub fn edge(&self, slot: usize) -> (usize, usize) {
        (self.vertices[slot], self.vertices[(slot + 1) % 3])
    }

    /// True when edge `slot` has no neighbouring face
    pub fn is_border(&self, slot: usize) -> bool {
        self.adjacency[slot].is_none()
    }

    /// Indices of the faces adjacent across any edge
    pub fn neighbors(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.iter().flatten().map(|fe| fe.face)
    }
}

/// Integer types accepted as face indices.
///
/// Negative values and values that do not fit `usize` are rejected when the
/// mesh is built.
pub trait FaceIndex: Copy {
    fn to_index(self) -> Option<usize>;
    fn to_i128(self) -> i128;
}

macro_rules! impl_face_index {
    ($($t:ty),*) => {
        $(
            impl FaceIndex for $t {
                fn to_index(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                fn to_i128(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_face_index!(i32, i64, isize, u32, u64, usize);

/// A triangle mesh or, without faces, a point cloud.
///
/// Built once and read-only afterwards. Faces live in one contiguous arena and
/// refer to each other by index, never by pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    bbox: BoundingBox,
}

impl Mesh {
    /// Create a mesh from vertex positions and triangle indices.
    ///
    /// Every index is validated before anything else is computed; the first
    /// out-of-range index yields [`Error::InvalidIndex`].
    pub fn from_vertices_and_faces<I: FaceIndex>(positions: &[Point3d], faces: &[[I; 3]]) -> Result<Self> {
        let vertex_count = positions.len();
        let indexed = faces
            .iter()
            .enumerate()
            .map(|(face, raw)| {
                let mut out = [0usize; 3];
                for (slot, &index) in raw.iter().enumerate() {
                    out[slot] = index
                        .to_index()
                        .filter(|&i| i < vertex_count)
                        .ok_or(Error::InvalidIndex {
                            face,
                            slot,
                            index: index.to_i128(),
                            vertex_count,
                        })?;
                }
                Ok(out)
            })
            .collect::<Result<Vec<[usize; 3]>>>()?;

        let mut vertices: Vec<Vertex> = positions.iter().copied().map(Vertex::new).collect();

        let normals: Vec<Option<Vector3d>> = indexed
            .par_iter()
            .map(|f| {
                let n = triangle_cross(&positions[f[0]], &positions[f[1]], &positions[f[2]]);
                let len = n.norm();
                if len > DEGENERATE_EPS && len.is_finite() {
                    Some(n / len)
                } else {
                    None
                }
            })
            .collect();

        let adjacency = build_adjacency(&indexed, &mut vertices);

        let faces: Vec<Face> = indexed
            .into_iter()
            .zip(adjacency)
            .zip(normals)
            .map(|((vertices, adjacency), normal)| Face {
                vertices,
                adjacency,
                normal,
            })
            .collect();

        let bbox = BoundingBox::from_points(positions);
        debug!(
            vertices = vertices.len(),
            faces = faces.len(),
            "built mesh"
        );

        Ok(Self {
            vertices,
            faces,
            bbox,
        })
    }

    /// Create a point cloud: no faces, no adjacency
    pub fn from_vertices(positions: &[Point3d]) -> Self {
        Self {
            vertices: positions.iter().copied().map(Vertex::new).collect(),
            faces: Vec::new(),
            bbox: BoundingBox::from_points(positions),
        }
    }

    /// Attach one normal per vertex
    pub fn with_vertex_normals(mut self, normals: Vec<Vector3d>) -> Result<Self> {
        if normals.len() != self.vertices.len() {
            return Err(Error::InvalidParameter(format!(
                "expected {} vertex normals, got {}",
                self.vertices.len(),
                normals.len()
            )));
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = Some(normal);
        }
        Ok(self)
    }

    /// Fill vertex normals with the area-weighted average of incident face normals.
    ///
    /// Vertices touched only by degenerate faces, or by none, keep `None`.
    pub fn compute_vertex_normals(mut self) -> Self {
        let mut sums = vec![Vector3d::zeros(); self.vertices.len()];
        for face in &self.faces {
            let [a, b, c] = face.vertices;
            // The cross product length is twice the area, which is the weight we want.
            let n = triangle_cross(
                &self.vertices[a].position,
                &self.vertices[b].position,
                &self.vertices[c].position,
            );
            for &vi in &face.vertices {
                sums[vi] += n;
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            let len = sum.norm();
            if len > DEGENERATE_EPS {
                vertex.normal = Some(sum / len);
            }
        }
        self
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the mesh has no faces
    pub fn is_point_cloud(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Point3d {
        self.vertices[vertex].position
    }

    /// Vertex positions in insertion order
    pub fn export_vertices(&self) -> Vec<Point3d> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Corner positions of a face
    pub fn face_positions(&self, face: usize) -> [Point3d; 3] {
        let [a, b, c] = self.faces[face].vertices;
        [self.position(a), self.position(b), self.position(c)]
    }

    /// Half the cross-product magnitude of two edge vectors
    pub fn face_area(&self, face: usize) -> f64 {
        let [a, b, c] = self.face_positions(face);
        0.5 * triangle_cross(&a, &b, &c).norm()
    }

    pub fn face_centroid(&self, face: usize) -> Point3d {
        let [a, b, c] = self.face_positions(face);
        Point3d::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Area of every face, in face order
    pub fn face_areas(&self) -> Vec<f64> {
        (0..self.faces.len())
            .into_par_iter()
            .map(|f| self.face_area(f))
            .collect()
    }

    pub fn total_area(&self) -> f64 {
        (0..self.faces.len())
            .into_par_iter()
            .map(|f| self.face_area(f))
            .sum()
    }

    /// Interpolate a point inside a face from barycentric weights
    pub fn interpolate(&self, face: usize, barycentric: &Vector3d) -> Point3d {
        let [a, b, c] = self.face_positions(face);
        Point3d::from(a.coords * barycentric.x + b.coords * barycentric.y + c.coords * barycentric.z)
    }
}

fn triangle_cross(a: &Point3d, b: &Point3d, c: &Point3d) -> Vector3d {
    (b - a).cross(&(c - a))
}

/// Match undirected edges across faces and record, per face edge slot, the
/// neighbour on the other side.
///
/// Two faces on an edge point at each other. When more than two faces share an
/// edge they form a fan: each points at the next face of the fan and the last
/// wraps to the first. Vertex flags are updated along the way.
fn build_adjacency(faces: &[[usize; 3]], vertices: &mut [Vertex]) -> Vec<[Option<FaceEdge>; 3]> {
    let mut adjacency = vec![[None; 3]; faces.len()];
    if faces.is_empty() {
        return adjacency;
    }

    // (min vertex, max vertex, face, slot)
    let mut edges: Vec<(usize, usize, usize, u8)> = faces
        .par_iter()
        .enumerate()
        .flat_map_iter(|(fi, f)| {
            (0..3u8).filter_map(move |slot| {
                let a = f[slot as usize];
                let b = f[(slot as usize + 1) % 3];
                // A collapsed edge has no neighbour to match.
                (a != b).then(|| (a.min(b), a.max(b), fi, slot))
            })
        })
        .collect();
    edges.par_sort_unstable();

    let mut referenced = vec![false; vertices.len()];
    for f in faces {
        for &vi in f {
            referenced[vi] = true;
        }
    }

    for run in edges.chunk_by(|x, y| x.0 == y.0 && x.1 == y.1) {
        let (a, b) = (run[0].0, run[0].1);
        match run.len() {
            1 => {
                vertices[a].flags |= VertexFlags::BOUNDARY;
                vertices[b].flags |= VertexFlags::BOUNDARY;
            }
            n => {
                if n > 2 {
                    vertices[a].flags |= VertexFlags::NON_MANIFOLD;
                    vertices[b].flags |= VertexFlags::NON_MANIFOLD;
                }
                for (i, &(_, _, face, slot)) in run.iter().enumerate() {
                    let (_, _, next_face, next_slot) = run[(i + 1) % n];
                    adjacency[face][slot as usize] = Some(FaceEdge {
                        face: next_face,
                        edge: next_slot,
                    });
                }
            }
        }
    }

    for (vertex, used) in vertices.iter_mut().zip(referenced) {
        if !used {
            vertex.flags |= VertexFlags::UNREFERENCED;
        }
    }

    adjacency
}

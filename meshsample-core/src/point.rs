//! Point, vertex and sample types

use bitflags::bitflags;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

bitflags! {
    /// Per-vertex topology flags, filled in when a mesh is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VertexFlags: u32 {
        /// The vertex lies on an edge used by exactly one face.
        const BOUNDARY = 1 << 0;
        /// The vertex lies on an edge shared by more than two faces.
        const NON_MANIFOLD = 1 << 1;
        /// The mesh has faces but none of them references this vertex.
        const UNREFERENCED = 1 << 2;
    }
}

/// A mesh vertex: position, optional normal and topology flags
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3d,
    pub normal: Option<Vector3d>,
    pub flags: VertexFlags,
}

impl Vertex {
    pub fn new(position: Point3d) -> Self {
        Self {
            position,
            normal: None,
            flags: VertexFlags::empty(),
        }
    }

    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3d::new(x, y, z))
    }

    pub fn is_boundary(&self) -> bool {
        self.flags.contains(VertexFlags::BOUNDARY)
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3d::origin())
    }
}

impl From<Point3d> for Vertex {
    fn from(position: Point3d) -> Self {
        Self::new(position)
    }
}

/// Where a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Provenance {
    /// No recorded origin (e.g. a cluster representative).
    #[default]
    None,
    /// Copied from the vertex with this index.
    Vertex(usize),
    /// Drawn inside a face; `barycentric` weights the face's three corners.
    Face { face: usize, barycentric: Vector3d },
}

/// A sampled point with optional provenance and an averaging weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point3d,
    pub provenance: Provenance,
    pub weight: f64,
}

impl Sample {
    /// Create a sample with no provenance and unit weight
    pub fn new(position: Point3d) -> Self {
        Self {
            position,
            provenance: Provenance::None,
            weight: 1.0,
        }
    }

    /// Create a sample that copies a mesh vertex
    pub fn from_vertex(position: Point3d, vertex: usize) -> Self {
        Self {
            position,
            provenance: Provenance::Vertex(vertex),
            weight: 1.0,
        }
    }

    /// Create a sample lying inside a face
    pub fn on_face(position: Point3d, face: usize, barycentric: Vector3d) -> Self {
        Self {
            position,
            provenance: Provenance::Face { face, barycentric },
            weight: 1.0,
        }
    }

    /// Set the averaging weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Source face index, if the sample was drawn on a face
    pub fn face(&self) -> Option<usize> {
        match self.provenance {
            Provenance::Face { face, .. } => Some(face),
            _ => None,
        }
    }

    /// Source vertex index, if the sample copies a vertex
    pub fn vertex(&self) -> Option<usize> {
        match self.provenance {
            Provenance::Vertex(vertex) => Some(vertex),
            _ => None,
        }
    }
}

impl From<Point3d> for Sample {
    fn from(position: Point3d) -> Self {
        Self::new(position)
    }
}

impl From<Sample> for Point3d {
    fn from(sample: Sample) -> Self {
        sample.position
    }
}

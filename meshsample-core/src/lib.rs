//! Core data structures and traits for meshsample
//!
//! This crate provides the mesh model shared by every sampling algorithm:
//! vertices, faces with an index-based face-face adjacency arena, bounding
//! boxes, samples with provenance, and the error type.

pub mod point;
pub mod bounds;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use bounds::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

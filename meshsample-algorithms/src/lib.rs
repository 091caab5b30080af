//! # MeshSample Algorithms
//!
//! Downsampling algorithms for triangle meshes and point clouds.
//!
//! This crate provides the uniform grid index, uniform vertex and surface
//! sampling, Poisson-disk sampling with straight-line or surface distance,
//! and grid clustering.

pub mod spatial_grid;
pub mod sampling;
pub mod geodesic;
pub mod poisson;
pub mod clustering;

// Re-export commonly used items
pub use spatial_grid::*;
pub use sampling::*;
pub use geodesic::*;
pub use poisson::*;
pub use clustering::*;

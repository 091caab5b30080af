//! Error types for meshsample

use thiserror::Error;

/// Main error type for meshsample operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A face references a vertex outside `[0, vertex_count)`.
    #[error("Invalid index: face {face} slot {slot} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidIndex {
        face: usize,
        slot: usize,
        index: i128,
        vertex_count: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for meshsample operations
pub type Result<T> = std::result::Result<T, Error>;

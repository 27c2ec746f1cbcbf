//! Error types for `renweave`
//!
//! Graph mutation, traversal, and compilation are infallible by design:
//! mutations with missing preconditions are silent no-ops, traversal of an
//! unreachable target yields empty collections, and the compiler degrades
//! locally instead of aborting. The variants here cover the persistence and
//! CLI edge of the crate, where I/O and malformed documents are real
//! failure modes.

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `renweave` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Document Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document file could not be found.
    #[error("graph document not found: {path}")]
    DocumentNotFound {
        /// The missing document path.
        path: PathBuf,
    },

    /// The document parsed but is not usable as a dialog graph.
    #[error("invalid graph document: {message}")]
    InvalidDocument {
        /// Description of what is invalid.
        message: String,
    },
}

/// A specialized Result type for `renweave` operations.
pub type Result<T> = std::result::Result<T, Error>;

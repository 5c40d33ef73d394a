//! Structured error types for annotated matrix operations.

use thiserror::Error;

/// Unified error type for all container operations.
#[derive(Debug, Error)]
pub enum AnnError {
    /// Malformed or conflicting construction input (unsupported annotation
    /// source, mixed construction styles, ragged annotation columns).
    #[error("schema error: {0}")]
    Schema(String),

    /// The matrix is not one of the accepted storage representations.
    #[error("matrix needs to be one of the following types [Dense, Masked, Sparse], not {found}")]
    Representation { found: String },

    /// Wrong matrix rank, mismatched name/column counts, or a column of the
    /// wrong length.
    #[error("shape error: {0}")]
    Shape(String),

    /// Annotation length disagrees with the matrix dimension it is bound to.
    #[error(
        "{what} needs to have the same amount of rows as data has {expected_of} ({expected}), but has {actual} rows"
    )]
    DimensionMismatch {
        what: &'static str,
        expected_of: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A label was not found in the identifier column of an axis.
    #[error("label {label:?} not in {axis}")]
    LabelNotFound { label: String, axis: &'static str },

    /// An index expression of unsupported shape, type, or range.
    #[error("index error: {0}")]
    Index(String),
}

impl AnnError {
    /// Whether this error came from resolving an index or a label.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, AnnError::LabelNotFound { .. } | AnnError::Index(_))
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AnnError>;

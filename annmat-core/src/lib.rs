//! Shared primitives for the annotated matrix workspace.
//!
//! `annmat-core` provides the foundation the container crate builds on:
//!
//! - **Error types**: [`AnnError`] and [`Result`] for structured error handling
//! - **Traits**: [`Summarizable`] and [`Shaped`]

pub mod error;
pub mod traits;

pub use error::{AnnError, Result};
pub use traits::*;

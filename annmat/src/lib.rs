//! Annotated data matrices.
//!
//! This crate provides a container binding a two-dimensional matrix to
//! per-row and per-column annotation tables and to unstructured metadata:
//!
//! - **Container**: [`AnnotatedMatrix`] with label and position indexing,
//!   region assignment, deletion and transposition
//! - **Annotation tables**: [`AnnotationTable`] keyed by an identifier column
//! - **Storage**: dense, [`Masked`] or [`SparseMatrix`] behind [`StorageVariant`]
//! - **Index expressions**: [`Selector`] and [`Index`]
//! - **Groups**: [`select_groups`] over a categorical row annotation
//!
//! # Quick start
//!
//! ```
//! use annmat::{AnnotatedMatrix, AnnotationSource};
//! use annmat_core::{Shaped, Summarizable};
//! use ndarray::array;
//!
//! let adata = AnnotatedMatrix::new(
//!     array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
//!     AnnotationSource::mapping([("smp_names", vec!["A", "B"])]),
//!     AnnotationSource::Absent,
//! )
//! .unwrap()
//! .with_extra("iroot", 0_i64);
//!
//! let t = adata.transpose();
//! assert_eq!(t.shape(), (3, 2));
//! assert_eq!(t.col_names().as_strings().unwrap(), &["A", "B"]);
//! assert_eq!(
//!     adata.summary(),
//!     "AnnotatedMatrix: 2 rows \u{00d7} 3 cols (Dense), 0 row keys, 0 col keys, 1 extra"
//! );
//! ```

pub mod ann_matrix;
pub mod column;
pub mod groups;
pub mod keys;
pub mod masked;
pub mod selector;
pub mod sparse;
pub mod storage;
pub mod table;
pub mod value;

pub use ann_matrix::{AnnotatedMatrix, DData, Extra, Item};
pub use column::ColumnData;
pub use groups::{select_groups, GroupSubset, Groups};
pub use keys::Axis;
pub use masked::{Masked, MaskedArray, MaskedMatrix};
pub use selector::{Bound, Index, Key, Normalized, Selector};
pub use sparse::{Csr, SparseMatrix};
pub use storage::{Assign, StorageKind, StorageVariant};
pub use table::{AnnotationSource, AnnotationTable};
pub use value::{mapping, Mapping, Value};

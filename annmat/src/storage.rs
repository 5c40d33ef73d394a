//! Backing-matrix representations.
//!
//! A container holds exactly one [`StorageVariant`]: dense, masked or sparse.
//! The variant is decided once by [`StorageVariant::classify`] and every
//! derived matrix (slice, transpose) keeps the same kind.

use std::collections::HashSet;
use std::fmt;

use annmat_core::{AnnError, Result, Shaped};
use ndarray::{Array2, Axis as NdAxis};

use crate::keys::Axis;
use crate::masked::{coerce_2d, MaskedMatrix};
use crate::sparse::SparseMatrix;
use crate::value::Value;

/// Tag of a [`StorageVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageKind {
    Dense,
    Masked,
    Sparse,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Dense => "Dense",
            StorageKind::Masked => "Masked",
            StorageKind::Sparse => "Sparse",
        };
        f.write_str(name)
    }
}

/// The primary data matrix (n_rows × n_cols).
#[derive(Debug, Clone, PartialEq)]
pub enum StorageVariant {
    /// Dense row-major matrix.
    Dense(Array2<f64>),
    /// Dense matrix with a missing-value mask.
    Masked(MaskedMatrix),
    /// Sparse COO matrix.
    Sparse(SparseMatrix),
}

/// A value written into a matrix region.
#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    /// Broadcast one value over the region.
    Scalar(f64),
    /// A block broadcastable to the region's shape.
    Block(Array2<f64>),
}

impl Assign {
    /// Interpret a dynamic value as an assignment.
    ///
    /// Numeric scalars and 0-D arrays broadcast. 1-D arrays and numeric lists
    /// are treated as a single row; 2-D arrays, masked arrays and sparse
    /// matrices are blocks. Masked entries are written as NaN.
    ///
    /// # Errors
    ///
    /// [`AnnError::Shape`] if the value has no numeric block form.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(Assign::Scalar(i as f64)),
            Value::Float(f) => Ok(Assign::Scalar(f)),
            Value::Bool(b) => Ok(Assign::Scalar(if b { 1.0 } else { 0.0 })),
            Value::Floats(v) => Ok(row_block(v)),
            Value::Ints(v) => Ok(row_block(v.into_iter().map(|i| i as f64).collect())),
            Value::Bools(v) => Ok(row_block(
                v.into_iter().map(|b| if b { 1.0 } else { 0.0 }).collect(),
            )),
            Value::Dense(a) if a.ndim() == 0 => a
                .iter()
                .next()
                .map(|&v| Assign::Scalar(v))
                .ok_or_else(|| AnnError::Shape("empty 0-D array".into())),
            Value::Dense(a) if a.ndim() == 1 => Ok(row_block(a.iter().copied().collect())),
            Value::Dense(a) => coerce_2d(a).map(Assign::Block),
            Value::Masked(m) => m.into_matrix().map(|m| Assign::Block(m.filled(f64::NAN))),
            Value::Sparse(s) => Ok(Assign::Block(s.to_dense())),
            other => Err(AnnError::Shape(format!(
                "cannot broadcast a {} value into a matrix region",
                other.type_name()
            ))),
        }
    }
}

fn row_block(values: Vec<f64>) -> Assign {
    let n = values.len();
    Assign::Block(Array2::from_shape_fn((1, n), |(_, j)| values[j]))
}

impl From<f64> for Assign {
    fn from(v: f64) -> Self {
        Assign::Scalar(v)
    }
}

impl From<Array2<f64>> for Assign {
    fn from(a: Array2<f64>) -> Self {
        Assign::Block(a)
    }
}

impl StorageVariant {
    /// Classify a raw value as Dense, Masked or Sparse, in that order, and
    /// coerce it to two dimensions.
    ///
    /// # Errors
    ///
    /// [`AnnError::Representation`] if the value is none of the three, and
    /// [`AnnError::Shape`] if a dense or masked array is neither 1-D nor 2-D.
    pub fn classify(value: Value) -> Result<Self> {
        match value {
            Value::Dense(a) => Ok(StorageVariant::Dense(coerce_2d(a)?)),
            Value::Masked(m) => Ok(StorageVariant::Masked(m.into_matrix()?)),
            Value::Sparse(s) => Ok(StorageVariant::Sparse(s)),
            other => Err(AnnError::Representation {
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Which representation this is.
    pub fn kind(&self) -> StorageKind {
        match self {
            StorageVariant::Dense(_) => StorageKind::Dense,
            StorageVariant::Masked(_) => StorageKind::Masked,
            StorageVariant::Sparse(_) => StorageKind::Sparse,
        }
    }

    /// Value at `(row, col)`. `None` when out of bounds or masked.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            StorageVariant::Dense(a) => a.get((row, col)).copied(),
            StorageVariant::Masked(m) => m.get(row, col),
            StorageVariant::Sparse(s) => {
                let (n_rows, n_cols) = s.shape();
                (row < n_rows && col < n_cols).then(|| s.get(row, col))
            }
        }
    }

    /// Set a value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        match self {
            StorageVariant::Dense(a) => match a.get_mut((row, col)) {
                Some(cell) => {
                    *cell = value;
                    Ok(())
                }
                None => Err(AnnError::Index(format!(
                    "index ({row}, {col}) out of bounds for {:?}",
                    a.dim()
                ))),
            },
            StorageVariant::Masked(m) => m.set(row, col, value),
            StorageVariant::Sparse(s) => s.set(row, col, value),
        }
    }

    /// Pick rows and columns by position. Positions may repeat and must be in
    /// bounds.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        match self {
            StorageVariant::Dense(a) => {
                StorageVariant::Dense(a.select(NdAxis(0), rows).select(NdAxis(1), cols))
            }
            StorageVariant::Masked(m) => StorageVariant::Masked(m.select(rows, cols)),
            StorageVariant::Sparse(s) => StorageVariant::Sparse(s.select(rows, cols)),
        }
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        match self {
            StorageVariant::Dense(a) => {
                StorageVariant::Dense(a.t().as_standard_layout().into_owned())
            }
            StorageVariant::Masked(m) => StorageVariant::Masked(m.transpose()),
            StorageVariant::Sparse(s) => StorageVariant::Sparse(s.transpose()),
        }
    }

    /// Copy without the given rows (or columns).
    pub(crate) fn without(&self, axis: Axis, positions: &[usize]) -> Self {
        let (n_rows, n_cols) = self.shape();
        let drop: HashSet<usize> = positions.iter().copied().collect();
        match axis {
            Axis::Rows => {
                let keep: Vec<usize> = (0..n_rows).filter(|i| !drop.contains(i)).collect();
                self.select(&keep, &(0..n_cols).collect::<Vec<_>>())
            }
            Axis::Cols => {
                let keep: Vec<usize> = (0..n_cols).filter(|j| !drop.contains(j)).collect();
                self.select(&(0..n_rows).collect::<Vec<_>>(), &keep)
            }
        }
    }

    /// Write `value` into the region `rows × cols`.
    pub(crate) fn assign(&mut self, rows: &[usize], cols: &[usize], value: &Assign) -> Result<()> {
        let region = (rows.len(), cols.len());
        let block = match value {
            Assign::Scalar(v) => Array2::from_elem(region, *v),
            Assign::Block(b) => b
                .broadcast(region)
                .map(|view| view.to_owned())
                .ok_or_else(|| {
                    AnnError::Shape(format!(
                        "could not broadcast value of shape {:?} into region of shape {:?}",
                        b.dim(),
                        region
                    ))
                })?,
        };
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                self.set(r, c, block[[i, j]])?;
            }
        }
        Ok(())
    }

    /// Sum of values in each row. Masked entries are skipped.
    pub fn row_sums(&self) -> Vec<f64> {
        match self {
            StorageVariant::Dense(a) => a.sum_axis(NdAxis(1)).to_vec(),
            StorageVariant::Masked(m) => m.row_sums(),
            StorageVariant::Sparse(s) => s.row_sums(),
        }
    }

    /// Sum of values in each column. Masked entries are skipped.
    pub fn column_sums(&self) -> Vec<f64> {
        match self {
            StorageVariant::Dense(a) => a.sum_axis(NdAxis(0)).to_vec(),
            StorageVariant::Masked(m) => m.column_sums(),
            StorageVariant::Sparse(s) => s.column_sums(),
        }
    }

    /// Mean value of each column.
    pub fn column_means(&self) -> Vec<f64> {
        match self {
            StorageVariant::Dense(a) => {
                if a.nrows() == 0 {
                    return vec![];
                }
                let n = a.nrows() as f64;
                self.column_sums().into_iter().map(|s| s / n).collect()
            }
            StorageVariant::Masked(m) => m.column_means(),
            StorageVariant::Sparse(s) => s.column_means(),
        }
    }

    /// Number of stored non-zero values. Masked entries are not counted.
    pub fn nnz(&self) -> usize {
        match self {
            StorageVariant::Dense(a) => a.iter().filter(|&&v| v != 0.0).count(),
            StorageVariant::Masked(m) => m
                .data()
                .iter()
                .zip(m.mask())
                .filter(|&(&v, &masked)| !masked && v != 0.0)
                .count(),
            StorageVariant::Sparse(s) => s.nnz(),
        }
    }

    /// Dense copy. Masked entries become NaN.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            StorageVariant::Dense(a) => a.clone(),
            StorageVariant::Masked(m) => m.filled(f64::NAN),
            StorageVariant::Sparse(s) => s.to_dense(),
        }
    }
}

impl Shaped for StorageVariant {
    fn shape(&self) -> (usize, usize) {
        match self {
            StorageVariant::Dense(a) => a.dim(),
            StorageVariant::Masked(m) => m.shape(),
            StorageVariant::Sparse(s) => s.shape(),
        }
    }
}

impl From<Array2<f64>> for StorageVariant {
    fn from(a: Array2<f64>) -> Self {
        StorageVariant::Dense(a)
    }
}

impl From<MaskedMatrix> for StorageVariant {
    fn from(m: MaskedMatrix) -> Self {
        StorageVariant::Masked(m)
    }
}

impl From<SparseMatrix> for StorageVariant {
    fn from(s: SparseMatrix) -> Self {
        StorageVariant::Sparse(s)
    }
}

impl From<StorageVariant> for Value {
    fn from(s: StorageVariant) -> Self {
        match s {
            StorageVariant::Dense(a) => Value::Dense(a.into_dyn()),
            StorageVariant::Masked(m) => Value::Masked(m.into_dyn()),
            StorageVariant::Sparse(s) => Value::Sparse(s),
        }
    }
}

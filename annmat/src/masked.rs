//! Masked arrays: dense values paired with a per-element validity mask.
//!
//! A `true` mask entry marks the value as missing. [`MaskedArray`] is the
//! arbitrary-rank input form; [`MaskedMatrix`] is the two-dimensional form
//! held by the container.

use annmat_core::{AnnError, Result, Shaped};
use ndarray::{Array, Array2, ArrayD, Axis, Dimension, Ix2, IxDyn};

/// Dense values with a same-shaped mask. `true` means masked.
#[derive(Debug, Clone, PartialEq)]
pub struct Masked<D: Dimension> {
    data: Array<f64, D>,
    mask: Array<bool, D>,
}

/// Masked array of any rank.
pub type MaskedArray = Masked<IxDyn>;

/// Two-dimensional masked array.
pub type MaskedMatrix = Masked<Ix2>;

impl<D: Dimension> Masked<D> {
    /// Pair `data` with `mask`. Both must have the same shape.
    pub fn new(data: Array<f64, D>, mask: Array<bool, D>) -> Result<Self> {
        if data.shape() != mask.shape() {
            return Err(AnnError::Shape(format!(
                "mask shape {:?} does not match data shape {:?}",
                mask.shape(),
                data.shape()
            )));
        }
        Ok(Self { data, mask })
    }

    /// Wrap `data` with nothing masked.
    pub fn unmasked(data: Array<f64, D>) -> Self {
        let mask = Array::from_elem(data.raw_dim(), false);
        Self { data, mask }
    }

    /// The underlying values, including masked ones.
    pub fn data(&self) -> &Array<f64, D> {
        &self.data
    }

    /// The mask (`true` = masked).
    pub fn mask(&self) -> &Array<bool, D> {
        &self.mask
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Number of masked elements.
    pub fn count_masked(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Convert to a dynamic-rank masked array.
    pub fn into_dyn(self) -> MaskedArray {
        Masked {
            data: self.data.into_dyn(),
            mask: self.mask.into_dyn(),
        }
    }
}

impl MaskedArray {
    /// Coerce to two dimensions; a 1-D array of length `n` becomes `n × 1`.
    pub fn into_matrix(self) -> Result<MaskedMatrix> {
        Ok(Masked {
            data: coerce_2d(self.data)?,
            mask: coerce_2d(self.mask)?,
        })
    }
}

/// Coerce a dynamic-rank array to two dimensions; 1-D becomes a column.
pub(crate) fn coerce_2d<A: Clone>(arr: ArrayD<A>) -> Result<Array2<A>> {
    match arr.ndim() {
        1 => {
            let n = arr.len();
            Array2::from_shape_vec((n, 1), arr.iter().cloned().collect())
                .map_err(|e| AnnError::Shape(e.to_string()))
        }
        2 => arr
            .into_dimensionality::<Ix2>()
            .map_err(|e| AnnError::Shape(e.to_string())),
        d => Err(AnnError::Shape(format!("X needs to be 2-dimensional, not {d}D"))),
    }
}

impl MaskedMatrix {
    /// Value at `(row, col)`, or `None` when masked or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.mask.get((row, col)) {
            Some(&false) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    /// Write a value and unmask it.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (n_rows, n_cols) = self.shape();
        if row >= n_rows || col >= n_cols {
            return Err(AnnError::Index(format!(
                "index ({row}, {col}) out of bounds for ({n_rows}, {n_cols})"
            )));
        }
        self.data[[row, col]] = value;
        self.mask[[row, col]] = false;
        Ok(())
    }

    /// Copy with masked entries replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Array2<f64> {
        let mut out = self.data.clone();
        out.zip_mut_with(&self.mask, |v, &m| {
            if m {
                *v = fill;
            }
        });
        out
    }

    /// Pick rows and columns by position. Positions may repeat.
    pub fn select(&self, row_idx: &[usize], col_idx: &[usize]) -> Self {
        Self {
            data: self.data.select(Axis(0), row_idx).select(Axis(1), col_idx),
            mask: self.mask.select(Axis(0), row_idx).select(Axis(1), col_idx),
        }
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.t().as_standard_layout().into_owned(),
            mask: self.mask.t().as_standard_layout().into_owned(),
        }
    }

    /// Sum of unmasked values in each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data
            .outer_iter()
            .zip(self.mask.outer_iter())
            .map(|(row, mask)| {
                row.iter()
                    .zip(mask.iter())
                    .filter(|&(_, &m)| !m)
                    .map(|(&v, _)| v)
                    .sum()
            })
            .collect()
    }

    /// Sum of unmasked values in each column.
    pub fn column_sums(&self) -> Vec<f64> {
        self.transpose().row_sums()
    }

    /// Mean of unmasked values in each column; NaN for fully masked columns.
    pub fn column_means(&self) -> Vec<f64> {
        let t = self.transpose();
        t.row_sums()
            .into_iter()
            .zip(t.mask.outer_iter())
            .map(|(sum, mask)| {
                let n = mask.iter().filter(|&&m| !m).count();
                if n == 0 {
                    f64::NAN
                } else {
                    sum / n as f64
                }
            })
            .collect()
    }
}

impl Shaped for MaskedMatrix {
    fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

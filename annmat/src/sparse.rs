//! Sparse storage for annotated matrices.
//!
//! [`SparseMatrix`] keeps explicit `(row, col, value)` entries; every other
//! position reads as zero. A position holds at most one entry. Slicing and
//! transposition build new matrices.

use std::collections::HashSet;

use annmat_core::{AnnError, Result, Shaped, Summarizable};
use ndarray::Array2;

/// Coordinate-list sparse matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseMatrix {
    entries: Vec<(usize, usize, f64)>,
    n_rows: usize,
    n_cols: usize,
}

/// Compressed sparse row parts, as exchanged with loaders.
///
/// Row `i` owns `data[indptr[i]..indptr[i + 1]]`, with column positions in
/// the same slice of `indices`.
#[derive(Debug, Clone, PartialEq)]
pub struct Csr {
    pub data: Vec<f64>,
    pub indices: Vec<usize>,
    pub indptr: Vec<usize>,
}

impl SparseMatrix {
    /// All-zero matrix of the given shape.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self { entries: Vec::new(), n_rows, n_cols }
    }

    /// Square matrix with ones on the diagonal.
    pub fn identity(n: usize) -> Self {
        Self {
            entries: (0..n).map(|i| (i, i, 1.0)).collect(),
            n_rows: n,
            n_cols: n,
        }
    }

    /// Build from parallel position and value lists.
    ///
    /// # Errors
    ///
    /// [`AnnError::Shape`] if the lists differ in length or a position is
    /// given twice, [`AnnError::Index`] if a position lies outside the shape.
    pub fn from_triplets(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
        n_rows: usize,
        n_cols: usize,
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(AnnError::Shape(format!(
                "got {} row positions, {} column positions and {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }
        let mut seen = HashSet::with_capacity(rows.len());
        let mut entries = Vec::with_capacity(rows.len());
        for ((r, c), v) in rows.into_iter().zip(cols).zip(values) {
            if r >= n_rows || c >= n_cols {
                return Err(AnnError::Index(format!(
                    "entry ({r}, {c}) outside a {n_rows}x{n_cols} matrix"
                )));
            }
            if !seen.insert((r, c)) {
                return Err(AnnError::Shape(format!("entry ({r}, {c}) given twice")));
            }
            entries.push((r, c, v));
        }
        Ok(Self { entries, n_rows, n_cols })
    }

    /// Keep the entries of `data` whose magnitude exceeds `threshold`.
    pub fn from_dense(data: &Array2<f64>, threshold: f64) -> Self {
        let (n_rows, n_cols) = data.dim();
        let entries = data
            .indexed_iter()
            .filter(|(_, v)| v.abs() > threshold)
            .map(|((r, c), &v)| (r, c, v))
            .collect();
        Self { entries, n_rows, n_cols }
    }

    fn position(&self, row: usize, col: usize) -> Option<usize> {
        self.entries.iter().position(|&(r, c, _)| r == row && c == col)
    }

    /// Value at `(row, col)`; zero when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.position(row, col).map_or(0.0, |i| self.entries[i].2)
    }

    /// Overwrite the value at `(row, col)`. Writing zero drops the entry.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.n_rows || col >= self.n_cols {
            return Err(AnnError::Index(format!(
                "({row}, {col}) outside a {}x{} matrix",
                self.n_rows, self.n_cols
            )));
        }
        match (self.position(row, col), value == 0.0) {
            (Some(i), true) => {
                self.entries.swap_remove(i);
            }
            (Some(i), false) => self.entries[i].2 = value,
            (None, true) => {}
            (None, false) => self.entries.push((row, col, value)),
        }
        Ok(())
    }

    /// Stored entry count.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Stored entries over total positions.
    pub fn density(&self) -> f64 {
        let cells = self.n_rows * self.n_cols;
        if cells == 0 {
            return 0.0;
        }
        self.entries.len() as f64 / cells as f64
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for &(r, c, v) in &self.entries {
            dense[[r, c]] = v;
        }
        dense
    }

    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_rows];
        for &(r, _, v) in &self.entries {
            sums[r] += v;
        }
        sums
    }

    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_cols];
        for &(_, c, v) in &self.entries {
            sums[c] += v;
        }
        sums
    }

    /// Column means; unstored positions count as zeros.
    pub fn column_means(&self) -> Vec<f64> {
        if self.n_rows == 0 {
            return vec![];
        }
        let n = self.n_rows as f64;
        self.column_sums().into_iter().map(|s| s / n).collect()
    }

    /// Pick rows and columns by position. Positions may repeat.
    ///
    /// Callers guarantee all positions are in bounds.
    pub fn select(&self, row_idx: &[usize], col_idx: &[usize]) -> Self {
        let targets = |picked: &[usize], n: usize| {
            let mut t = vec![Vec::new(); n];
            for (new, &old) in picked.iter().enumerate() {
                t[old].push(new);
            }
            t
        };
        let row_targets = targets(row_idx, self.n_rows);
        let col_targets = targets(col_idx, self.n_cols);

        let mut out = SparseMatrix::new(row_idx.len(), col_idx.len());
        for &(r, c, v) in &self.entries {
            for &nr in &row_targets[r] {
                out.entries.extend(col_targets[c].iter().map(|&nc| (nr, nc, v)));
            }
        }
        out
    }

    pub fn transpose(&self) -> Self {
        Self {
            entries: self.entries.iter().map(|&(r, c, v)| (c, r, v)).collect(),
            n_rows: self.n_cols,
            n_cols: self.n_rows,
        }
    }

    /// Compress by row. Entries within a row are ordered by column.
    pub fn to_csr(&self) -> Csr {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|&(r, c, _)| (r, c));

        let mut indptr = vec![0usize; self.n_rows + 1];
        for &(r, _, _) in &sorted {
            indptr[r + 1] += 1;
        }
        for r in 0..self.n_rows {
            indptr[r + 1] += indptr[r];
        }
        Csr {
            data: sorted.iter().map(|e| e.2).collect(),
            indices: sorted.iter().map(|e| e.1).collect(),
            indptr,
        }
    }

    /// Expand compressed rows.
    ///
    /// # Errors
    ///
    /// [`AnnError::Shape`] if the parts disagree with each other or with
    /// `n_rows`, plus any error of [`from_triplets`](Self::from_triplets).
    pub fn from_csr(csr: Csr, n_rows: usize, n_cols: usize) -> Result<Self> {
        let Csr { data, indices, indptr } = csr;
        if data.len() != indices.len() {
            return Err(AnnError::Shape(format!(
                "{} values but {} column positions",
                data.len(),
                indices.len()
            )));
        }
        if indptr.len() != n_rows + 1 {
            return Err(AnnError::Shape(format!(
                "row pointer has {} entries, {n_rows} rows need {}",
                indptr.len(),
                n_rows + 1
            )));
        }
        let well_formed = indptr.first() == Some(&0)
            && indptr.windows(2).all(|w| w[0] <= w[1])
            && indptr.last() == Some(&data.len());
        if !well_formed {
            return Err(AnnError::Shape(
                "row pointer must rise from 0 to the value count".into(),
            ));
        }

        let rows = indptr
            .windows(2)
            .enumerate()
            .flat_map(|(r, w)| std::iter::repeat(r).take(w[1] - w[0]))
            .collect();
        Self::from_triplets(rows, indices, data, n_rows, n_cols)
    }

    /// Stored `(row, col, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries.iter().copied()
    }
}

impl Shaped for SparseMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }
}

impl Summarizable for SparseMatrix {
    fn summary(&self) -> String {
        format!(
            "SparseMatrix: {}\u{00d7}{}, {} stored ({:.2}% dense)",
            self.n_rows,
            self.n_cols,
            self.nnz(),
            self.density() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn diagonal() -> SparseMatrix {
        SparseMatrix::from_triplets(vec![0, 1, 2], vec![0, 1, 2], vec![1.0, 2.0, 3.0], 3, 3)
            .unwrap()
    }

    #[test]
    fn empty_matrix() {
        let m = SparseMatrix::new(4, 6);
        assert_eq!(m.shape(), (4, 6));
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.density(), 0.0);
        assert_eq!(SparseMatrix::new(0, 3).density(), 0.0);
    }

    #[test]
    fn triplets_read_back() {
        let m = diagonal();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(2, 2), 3.0);
        assert_eq!(m.get(2, 0), 0.0);
    }

    #[test]
    fn triplets_validated() {
        let outside = SparseMatrix::from_triplets(vec![3], vec![0], vec![1.0], 3, 3);
        assert!(matches!(outside, Err(AnnError::Index(_))));

        let twice = SparseMatrix::from_triplets(vec![1, 1], vec![2, 2], vec![1.0, 2.0], 3, 3);
        assert!(matches!(twice, Err(AnnError::Shape(_))));

        let ragged = SparseMatrix::from_triplets(vec![0], vec![0, 1], vec![1.0], 3, 3);
        assert!(matches!(ragged, Err(AnnError::Shape(_))));
    }

    #[test]
    fn set_overwrites_and_drops() {
        let mut m = diagonal();
        m.set(0, 0, -1.0).unwrap();
        assert_eq!(m.get(0, 0), -1.0);
        assert_eq!(m.nnz(), 3);

        m.set(2, 0, 8.0).unwrap();
        assert_eq!(m.nnz(), 4);

        m.set(1, 1, 0.0).unwrap();
        m.set(0, 1, 0.0).unwrap();
        assert_eq!(m.nnz(), 3);

        assert!(matches!(m.set(0, 3, 1.0), Err(AnnError::Index(_))));
    }

    #[test]
    fn dense_threshold() {
        let data = array![[0.2, -4.0], [6.0, 0.0]];
        let m = SparseMatrix::from_dense(&data, 0.5);
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.to_dense(), array![[0.0, -4.0], [6.0, 0.0]]);
        assert_eq!(SparseMatrix::identity(2).to_dense(), array![[1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn select_repeats_positions() {
        let m = diagonal();
        let sub = m.select(&[2, 0, 2], &[2, 1]);
        assert_eq!(sub.shape(), (3, 2));
        assert_eq!(sub.to_dense(), array![[3.0, 0.0], [0.0, 0.0], [3.0, 0.0]]);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn transpose_moves_entries() {
        let m = SparseMatrix::from_triplets(vec![1], vec![2], vec![5.0], 2, 3).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.get(2, 1), 5.0);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn sums_and_means() {
        let m = SparseMatrix::from_triplets(vec![0, 0, 1], vec![0, 1, 0], vec![1.0, 2.0, 3.0], 2, 2)
            .unwrap();
        assert_eq!(m.row_sums(), vec![3.0, 3.0]);
        assert_eq!(m.column_sums(), vec![4.0, 2.0]);
        assert_eq!(m.column_means(), vec![2.0, 1.0]);
    }

    #[test]
    fn summary_line() {
        let m = SparseMatrix::from_triplets(vec![3], vec![1], vec![1.0], 10, 20).unwrap();
        assert_eq!(m.summary(), "SparseMatrix: 10\u{00d7}20, 1 stored (0.50% dense)");
    }

    #[test]
    fn csr_layout() {
        let m = SparseMatrix::from_triplets(
            vec![2, 0, 2, 0],
            vec![1, 3, 0, 0],
            vec![4.0, 2.0, 3.0, 1.0],
            3,
            4,
        )
        .unwrap();
        let csr = m.to_csr();
        assert_eq!(csr.indptr, vec![0, 2, 2, 4]);
        assert_eq!(csr.indices, vec![0, 3, 0, 1]);
        assert_eq!(csr.data, vec![1.0, 2.0, 3.0, 4.0]);

        let back = SparseMatrix::from_csr(csr, 3, 4).unwrap();
        assert_eq!(back.to_dense(), m.to_dense());
    }

    #[test]
    fn csr_rejects_bad_row_pointer() {
        let short = Csr { data: vec![1.0], indices: vec![0], indptr: vec![0, 1] };
        assert!(matches!(SparseMatrix::from_csr(short, 2, 2), Err(AnnError::Shape(_))));

        let falling = Csr { data: vec![1.0], indices: vec![0], indptr: vec![0, 1, 0] };
        assert!(SparseMatrix::from_csr(falling, 2, 2).is_err());
    }
}

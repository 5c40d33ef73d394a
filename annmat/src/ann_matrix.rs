//! Annotated matrix container.
//!
//! Binds a two-dimensional matrix to a row [`AnnotationTable`], a column
//! [`AnnotationTable`], and a schema-free `extra` mapping, keeping the three in
//! structural agreement under slicing, relabeling and transposition.
//!
//! # Structure
//!
//! - `X`: primary data matrix (rows × columns), dense, masked or sparse
//! - row table: per-row annotations, identifier column `smp_names`
//! - column table: per-column annotations, identifier column `var_names`
//! - `extra`: unstructured whole-dataset entries
//!
//! # Example
//!
//! ```
//! use annmat::{AnnotatedMatrix, AnnotationSource, Selector};
//! use ndarray::array;
//!
//! let adata = AnnotatedMatrix::new(
//!     array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
//!     AnnotationSource::mapping([("smp_names", vec!["A", "B"])]),
//!     AnnotationSource::mapping([("var_names", vec!["a", "b", "c"])]),
//! )
//! .unwrap();
//!
//! let sub = adata.select("A", Selector::labels_between("b", "c")).unwrap();
//! assert_eq!(sub.matrix().to_dense(), array![[2.0, 3.0]]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use annmat_core::{AnnError, Result, Shaped, Summarizable};
use log::debug;

use crate::column::ColumnData;
use crate::keys::{
    Axis, COL_ANNOTATION_KEYS, COL_NAMES, COL_NAME_KEYS, MATRIX_KEY, ROW_ANNOTATION_KEYS,
    ROW_NAMES, ROW_NAME_KEYS,
};
use crate::selector::{normalize, Index, Normalized, Selector};
use crate::storage::{Assign, StorageKind, StorageVariant};
use crate::table::{AnnotationSource, AnnotationTable};
use crate::value::{take, Mapping, Value};

/// Unstructured whole-dataset metadata.
pub type Extra = BTreeMap<String, Value>;

/// Combined construction mapping: the matrix under `"X"`, identifier lists,
/// nested annotation mappings, and any extra entries.
pub type DData = Mapping;

/// Result of [`AnnotatedMatrix::get`].
#[derive(Debug, Clone)]
pub enum Item<'a> {
    /// An entry of the `extra` mapping.
    Extra(&'a Value),
    /// A sliced container.
    Subset(AnnotatedMatrix),
}

impl<'a> Item<'a> {
    /// The sliced container, if this is one.
    pub fn into_subset(self) -> Option<AnnotatedMatrix> {
        match self {
            Item::Subset(m) => Some(m),
            Item::Extra(_) => None,
        }
    }

    /// The extra entry, if this is one.
    pub fn as_extra(&self) -> Option<&'a Value> {
        match self {
            Item::Extra(v) => Some(*v),
            Item::Subset(_) => None,
        }
    }
}

/// A matrix with row and column annotations and unstructured metadata.
#[derive(Debug, Clone)]
pub struct AnnotatedMatrix {
    x: StorageVariant,
    rows: AnnotationTable,
    cols: AnnotationTable,
    /// Shared with slices and transposes; copied on first write.
    extra: Arc<Extra>,
}

impl AnnotatedMatrix {
    /// Create a container from a matrix and two annotation sources.
    ///
    /// # Errors
    ///
    /// See [`from_parts`](Self::from_parts).
    pub fn new(
        x: impl Into<Value>,
        rows: impl Into<AnnotationSource>,
        cols: impl Into<AnnotationSource>,
    ) -> Result<Self> {
        Self::from_parts(x.into(), rows.into(), cols.into(), Extra::new())
    }

    /// Create a container from a combined mapping.
    pub fn from_ddata(ddata: DData) -> Result<Self> {
        Self::from_parts(
            Value::Map(ddata),
            AnnotationSource::Absent,
            AnnotationSource::Absent,
            Extra::new(),
        )
    }

    /// General constructor.
    ///
    /// `source` is either a matrix (dense, masked or sparse) or a combined
    /// mapping. With a combined mapping, `rows`, `cols` and `extra` must be
    /// empty.
    ///
    /// # Errors
    ///
    /// - [`AnnError::Schema`] for mixed construction styles, a combined
    ///   mapping without a matrix, or malformed annotations.
    /// - [`AnnError::Representation`] if the matrix is not dense, masked or sparse.
    /// - [`AnnError::Shape`] if the matrix is not 1-D or 2-D.
    /// - [`AnnError::DimensionMismatch`] if annotations disagree with the matrix.
    pub fn from_parts(
        source: Value,
        rows: AnnotationSource,
        cols: AnnotationSource,
        extra: Extra,
    ) -> Result<Self> {
        let (x, rows, cols, extra) = match source {
            Value::Map(ddata) => {
                let absent = |s: &AnnotationSource| matches!(s, AnnotationSource::Absent);
                if !absent(&rows) || !absent(&cols) || !extra.is_empty() {
                    return Err(AnnError::Schema(
                        "if the data source is a combined mapping, it needs to contain all metadata"
                            .into(),
                    ));
                }
                unpack_ddata(ddata)?
            }
            x => (x, rows, cols, extra),
        };
        let x = StorageVariant::classify(x)?;
        Self::assemble(x, rows, cols, Arc::new(extra))
    }

    fn assemble(
        x: StorageVariant,
        rows: AnnotationSource,
        cols: AnnotationSource,
        extra: Arc<Extra>,
    ) -> Result<Self> {
        let (n_rows, n_cols) = x.shape();
        let rows = AnnotationTable::new(rows, ROW_NAMES, n_rows)?;
        let cols = AnnotationTable::new(cols, COL_NAMES, n_cols)?;
        check_dimension(Axis::Rows, n_rows, rows.len())?;
        check_dimension(Axis::Cols, n_cols, cols.len())?;
        Ok(Self { x, rows, cols, extra })
    }

    /// Add an extra entry, builder style.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert_extra(key, value);
        self
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.x.n_rows()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The primary data matrix.
    pub fn matrix(&self) -> &StorageVariant {
        &self.x
    }

    /// Which representation backs the matrix.
    pub fn storage_kind(&self) -> StorageKind {
        self.x.kind()
    }

    /// Row annotations.
    pub fn row_table(&self) -> &AnnotationTable {
        &self.rows
    }

    /// Column annotations.
    pub fn col_table(&self) -> &AnnotationTable {
        &self.cols
    }

    fn table(&self, axis: Axis) -> &AnnotationTable {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Cols => &self.cols,
        }
    }

    fn table_mut(&mut self, axis: Axis) -> &mut AnnotationTable {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Cols => &mut self.cols,
        }
    }

    fn dim(&self, axis: Axis) -> usize {
        match axis {
            Axis::Rows => self.x.n_rows(),
            Axis::Cols => self.x.n_cols(),
        }
    }

    /// Row identifiers.
    pub fn row_names(&self) -> &ColumnData {
        self.rows.names()
    }

    /// Column identifiers.
    pub fn col_names(&self) -> &ColumnData {
        self.cols.names()
    }

    /// Replace the row identifiers.
    pub fn set_row_names(&mut self, names: impl Into<ColumnData>) -> Result<()> {
        self.rows.set_names(names)
    }

    /// Replace the column identifiers.
    pub fn set_col_names(&mut self, names: impl Into<ColumnData>) -> Result<()> {
        self.cols.set_names(names)
    }

    /// Row annotation column names, identifier excluded.
    pub fn row_keys(&self) -> Vec<&str> {
        self.rows.columns()
    }

    /// Column annotation column names, identifier excluded.
    pub fn col_keys(&self) -> Vec<&str> {
        self.cols.columns()
    }

    /// Set or append one row annotation column.
    pub fn add_row_column(&mut self, name: &str, values: impl Into<ColumnData>) -> Result<()> {
        self.rows.set_column(name, values)
    }

    /// Set or append one column annotation column.
    pub fn add_col_column(&mut self, name: &str, values: impl Into<ColumnData>) -> Result<()> {
        self.cols.set_column(name, values)
    }

    /// Set or append several row annotation columns.
    pub fn set_row_columns(&mut self, names: Vec<String>, values: Vec<ColumnData>) -> Result<()> {
        self.rows.set_columns(names, values)
    }

    /// Set or append several column annotation columns.
    pub fn set_col_columns(&mut self, names: Vec<String>, values: Vec<ColumnData>) -> Result<()> {
        self.cols.set_columns(names, values)
    }

    /// Replace the row table.
    ///
    /// The source is coerced into a table bound to `smp_names`. When the
    /// coerced identifiers are exactly `0..n` (no labels supplied), the
    /// current row labels are kept.
    ///
    /// # Errors
    ///
    /// [`AnnError::DimensionMismatch`] if the new table length differs from
    /// the number of rows.
    pub fn set_row_table(&mut self, source: impl Into<AnnotationSource>) -> Result<()> {
        self.set_table(Axis::Rows, source.into())
    }

    /// Replace the column table. See [`set_row_table`](Self::set_row_table).
    pub fn set_col_table(&mut self, source: impl Into<AnnotationSource>) -> Result<()> {
        self.set_table(Axis::Cols, source.into())
    }

    fn set_table(&mut self, axis: Axis, source: AnnotationSource) -> Result<()> {
        let expected = self.dim(axis);
        let mut table = AnnotationTable::new(source, axis.name_col(), expected)?;
        check_dimension(axis, expected, table.len())?;
        if table.has_default_names() {
            debug!("{}: no labels supplied, keeping existing identifiers", axis.name_col());
            table.set_names(self.table(axis).names().clone())?;
        }
        *self.table_mut(axis) = table;
        Ok(())
    }

    /// Unstructured metadata.
    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    /// Look up an extra entry.
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Look up an extra entry, falling back to `default`.
    pub fn get_extra_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.extra.get(key).unwrap_or(default)
    }

    /// Whether `key` is present in the extra mapping.
    pub fn contains(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Insert an extra entry, returning the previous value.
    pub fn insert_extra(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        Arc::make_mut(&mut self.extra).insert(key.to_string(), value.into())
    }

    /// Remove an extra entry.
    pub fn remove_extra(&mut self, key: &str) -> Option<Value> {
        if !self.extra.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.extra).remove(key)
    }

    /// Whether both containers still share one extra mapping.
    pub fn shares_extra_with(&self, other: &AnnotatedMatrix) -> bool {
        Arc::ptr_eq(&self.extra, &other.extra)
    }

    fn normalize_pair(&self, rows: &Selector, cols: &Selector) -> Result<(Normalized, Normalized)> {
        Ok((
            normalize(rows, &self.rows, Axis::Rows)?,
            normalize(cols, &self.cols, Axis::Cols)?,
        ))
    }

    fn positions(&self, rows: &Selector, cols: &Selector) -> Result<(Vec<usize>, Vec<usize>)> {
        let (r, c) = self.normalize_pair(rows, cols)?;
        let (n_rows, n_cols) = self.x.shape();
        Ok((r.positions(n_rows), c.positions(n_cols)))
    }

    /// Unified read access.
    ///
    /// A key returns the extra entry; any other index returns a sliced
    /// container.
    ///
    /// # Errors
    ///
    /// [`AnnError::LabelNotFound`] for a missing key or label, and
    /// [`AnnError::Index`] for invalid positions or masks.
    pub fn get(&self, index: impl Into<Index>) -> Result<Item<'_>> {
        match index.into() {
            Index::Key(key) => self
                .extra
                .get(&key)
                .map(Item::Extra)
                .ok_or(AnnError::LabelNotFound { label: key, axis: "extra" }),
            Index::Rows(rows) => self.subset(&rows, &Selector::All).map(Item::Subset),
            Index::Pair(rows, cols) => self.subset(&rows, &cols).map(Item::Subset),
        }
    }

    /// Slice rows and columns into a new container.
    ///
    /// The result owns copies of the selected matrix region and annotation
    /// rows, and shares the extra mapping.
    pub fn select(&self, rows: impl Into<Selector>, cols: impl Into<Selector>) -> Result<Self> {
        self.subset(&rows.into(), &cols.into())
    }

    fn subset(&self, rows: &Selector, cols: &Selector) -> Result<Self> {
        let (r, c) = self.positions(rows, cols)?;
        let x = self.x.select(&r, &c);
        let row_table = self.rows.subset(&r);
        let col_table = self.cols.subset(&c);
        Self::assemble(x, row_table.into(), col_table.into(), Arc::clone(&self.extra))
    }

    /// Unified write access.
    ///
    /// A key writes the extra mapping. Any other index writes `value` into the
    /// selected matrix region; annotations are not touched.
    pub fn set(&mut self, index: impl Into<Index>, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (rows, cols) = match index.into() {
            Index::Key(key) => {
                Arc::make_mut(&mut self.extra).insert(key, value);
                return Ok(());
            }
            Index::Rows(rows) => (rows, Selector::All),
            Index::Pair(rows, cols) => (rows, cols),
        };
        let (r, c) = self.positions(&rows, &cols)?;
        self.x.assign(&r, &c, &Assign::from_value(value)?)
    }

    /// Write into the selected matrix region.
    pub fn assign(
        &mut self,
        rows: impl Into<Selector>,
        cols: impl Into<Selector>,
        value: impl Into<Assign>,
    ) -> Result<()> {
        let (r, c) = self.positions(&rows.into(), &cols.into())?;
        self.x.assign(&r, &c, &value.into())
    }

    /// Unified delete.
    ///
    /// A key removes the extra entry. Otherwise the selected rows (when all
    /// columns are selected) or columns (when all rows are selected) are
    /// removed from the matrix together with their annotation rows.
    ///
    /// # Errors
    ///
    /// [`AnnError::Index`] when neither axis selects everything, since a
    /// rectangular matrix cannot drop a partial region.
    pub fn delete(&mut self, index: impl Into<Index>) -> Result<()> {
        let (rows, cols) = match index.into() {
            Index::Key(key) => {
                return match self.remove_extra(&key) {
                    Some(_) => Ok(()),
                    None => Err(AnnError::LabelNotFound { label: key, axis: "extra" }),
                };
            }
            Index::Rows(rows) => (rows, Selector::All),
            Index::Pair(rows, cols) => (rows, cols),
        };

        let (r, c) = self.normalize_pair(&rows, &cols)?;
        let (n_rows, n_cols) = self.x.shape();
        let (axis, positions) = if c.is_full() {
            (Axis::Rows, r.positions(n_rows))
        } else if r.is_full() {
            (Axis::Cols, c.positions(n_cols))
        } else {
            return Err(AnnError::Index(
                "deletion needs all rows or all columns selected on the other axis".into(),
            ));
        };

        let x = self.x.without(axis, &positions);
        let table = self.table(axis).without_rows(&positions);
        debug!("{}: deleted {} entries", axis.name_col(), positions.len());
        self.x = x;
        *self.table_mut(axis) = table;
        Ok(())
    }

    /// Transposed copy: rows become columns and the annotation tables swap
    /// sides. The original is unchanged.
    pub fn transpose(&self) -> Self {
        Self {
            x: self.x.transpose(),
            rows: self.cols.flipped(),
            cols: self.rows.flipped(),
            extra: Arc::clone(&self.extra),
        }
    }

    /// Export into the combined-mapping form accepted by
    /// [`from_ddata`](Self::from_ddata).
    pub fn to_ddata(&self) -> DData {
        let annotations = |t: &AnnotationTable| {
            Value::Map(
                t.iter()
                    .map(|(k, c)| (k.to_string(), Value::from(c.clone())))
                    .collect(),
            )
        };
        let mut d: DData = vec![
            (MATRIX_KEY.to_string(), Value::from(self.x.clone())),
            ("smp".to_string(), annotations(&self.rows)),
            ("var".to_string(), annotations(&self.cols)),
            (ROW_NAMES.to_string(), Value::from(self.rows.names().clone())),
            (COL_NAMES.to_string(), Value::from(self.cols.names().clone())),
        ];
        d.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        d
    }
}

impl Shaped for AnnotatedMatrix {
    fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }
}

impl Summarizable for AnnotatedMatrix {
    fn summary(&self) -> String {
        let (n_rows, n_cols) = self.x.shape();
        format!(
            "AnnotatedMatrix: {} rows \u{00d7} {} cols ({}), {} row keys, {} col keys, {} extra",
            n_rows,
            n_cols,
            self.x.kind(),
            self.rows.columns().len(),
            self.cols.columns().len(),
            self.extra.len(),
        )
    }
}

fn check_dimension(axis: Axis, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AnnError::DimensionMismatch {
            what: axis.metadata_label(),
            expected_of: axis.dimension_label(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Split a combined mapping into matrix, row and column annotations, and
/// extra entries.
fn unpack_ddata(mut ddata: DData) -> Result<(Value, AnnotationSource, AnnotationSource, Extra)> {
    let x = take(&mut ddata, MATRIX_KEY).ok_or_else(|| {
        AnnError::Schema(format!("combined mapping has no {MATRIX_KEY:?} entry"))
    })?;
    let rows = axis_annotations(&mut ddata, Axis::Rows, &ROW_NAME_KEYS, &ROW_ANNOTATION_KEYS)?;
    let cols = axis_annotations(&mut ddata, Axis::Cols, &COL_NAME_KEYS, &COL_ANNOTATION_KEYS)?;
    debug!("unpacked combined mapping with {} extra entries", ddata.len());
    Ok((x, rows, cols, ddata.into_iter().collect()))
}

fn axis_annotations(
    ddata: &mut DData,
    axis: Axis,
    name_keys: &[&str],
    annotation_keys: &[&str],
) -> Result<AnnotationSource> {
    let name_col = axis.name_col();
    let mut merged: Mapping = Vec::new();
    let names = name_keys.iter().find_map(|k| take(ddata, k));
    let has_names = names.is_some();
    if let Some(names) = names {
        merged.push((name_col.to_string(), names));
    }

    for key in annotation_keys {
        let Some(nested) = take(ddata, key) else {
            continue;
        };
        let Value::Map(entries) = nested else {
            return Err(AnnError::Schema(format!(
                "{key:?} needs to be a mapping of annotations, not {}",
                nested.type_name()
            )));
        };
        for (k, v) in entries {
            if has_names && k == name_col {
                continue;
            }
            match merged.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => merged.push((k, v)),
            }
        }
    }
    Ok(AnnotationSource::Mapping(merged))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    fn arb_matrix() -> impl Strategy<Value = Array2<f64>> {
        (1..6usize, 1..6usize).prop_flat_map(|(r, c)| {
            proptest::collection::vec(-100.0..100.0f64, r * c)
                .prop_map(move |v| Array2::from_shape_vec((r, c), v).unwrap())
        })
    }

    fn labeled(x: Array2<f64>) -> AnnotatedMatrix {
        let (r, c) = x.dim();
        let rows: Vec<String> = (0..r).map(|i| format!("r{i}")).collect();
        let cols: Vec<String> = (0..c).map(|j| format!("c{j}")).collect();
        AnnotatedMatrix::new(
            x,
            AnnotationSource::mapping([(ROW_NAMES, rows)]),
            AnnotationSource::mapping([(COL_NAMES, cols)]),
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn shape_is_preserved(x in arb_matrix()) {
            let dim = x.dim();
            let adata = labeled(x);
            prop_assert_eq!(adata.shape(), dim);
            prop_assert_eq!(adata.row_table().len(), dim.0);
            prop_assert_eq!(adata.col_table().len(), dim.1);
        }

        #[test]
        fn double_transpose_is_identity(x in arb_matrix()) {
            let adata = labeled(x);
            let back = adata.transpose().transpose();
            prop_assert_eq!(back.matrix(), adata.matrix());
            prop_assert_eq!(back.row_names(), adata.row_names());
            prop_assert_eq!(back.col_names(), adata.col_names());
        }

        #[test]
        fn label_and_position_agree(x in arb_matrix(), i in 0..6usize, j in 0..6usize) {
            let (r, c) = x.dim();
            let (i, j) = (i % r, j % c);
            let adata = labeled(x);
            let by_label = adata.select(format!("r{i}"), format!("c{j}")).unwrap();
            let by_pos = adata.select(i, j).unwrap();
            prop_assert_eq!(by_label.matrix(), by_pos.matrix());
            prop_assert_eq!(by_label.row_table(), by_pos.row_table());
            prop_assert_eq!(by_label.col_table(), by_pos.col_table());
        }

        #[test]
        fn mask_selects_flagged_columns(x in arb_matrix(), seed in any::<u64>()) {
            let c = x.ncols();
            let mask: Vec<bool> = (0..c).map(|j| (seed >> (j % 64)) & 1 == 1).collect();
            let expected = mask.iter().filter(|&&m| m).count();
            let adata = labeled(x);
            let sub = adata.select(.., mask).unwrap();
            prop_assert_eq!(sub.shape(), (adata.len(), expected));
        }
    }
}

//! Annotation tables bound to one axis of a matrix.
//!
//! An [`AnnotationTable`] is a set of named [`ColumnData`] columns sharing one
//! row count, plus a designated identifier column holding the per-entry
//! names. The identifier column defaults to `0..n` when not supplied.
//!
//! Tables are value objects: appending a column builds a replacement table
//! and installs it in one assignment, so a failed update never leaves a
//! half-modified table behind.

use std::collections::HashSet;

use annmat_core::{AnnError, Result, Summarizable};
use log::debug;
use ndarray::Array2;

use crate::column::ColumnData;
use crate::keys::{Axis, ROW_NAMES};
use crate::value::{Mapping, Value};

/// Where an annotation table is built from.
#[derive(Debug, Clone, Default)]
pub enum AnnotationSource {
    /// No annotations: only a default identifier column.
    #[default]
    Absent,
    /// Copy of an existing table.
    Table(AnnotationTable),
    /// Column name → 1-D sequence.
    Mapping(Mapping),
    /// A dynamically typed value; must be a [`Value::Map`].
    Value(Value),
}

impl AnnotationSource {
    /// Build a mapping source from `(name, column)` pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        AnnotationSource::Mapping(crate::value::mapping(entries))
    }
}

impl From<AnnotationTable> for AnnotationSource {
    fn from(t: AnnotationTable) -> Self {
        AnnotationSource::Table(t)
    }
}

impl From<Mapping> for AnnotationSource {
    fn from(m: Mapping) -> Self {
        AnnotationSource::Mapping(m)
    }
}

impl From<Value> for AnnotationSource {
    fn from(v: Value) -> Self {
        AnnotationSource::Value(v)
    }
}

impl<T: Into<AnnotationSource>> From<Option<T>> for AnnotationSource {
    fn from(o: Option<T>) -> Self {
        o.map_or(AnnotationSource::Absent, Into::into)
    }
}

/// Named annotation columns with one identifier column.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTable {
    name_col: String,
    names: ColumnData,
    columns: Vec<(String, ColumnData)>,
}

impl AnnotationTable {
    /// Build a table from `source`, bound to identifier column `name_col`.
    ///
    /// `n_rows_hint` sizes the default identifier column when the source
    /// supplies no columns at all.
    ///
    /// # Errors
    ///
    /// [`AnnError::Schema`] if the source is not a table or mapping, if a
    /// mapping value is not a 1-D sequence, or if column lengths disagree.
    pub fn new(source: AnnotationSource, name_col: &str, n_rows_hint: usize) -> Result<Self> {
        match source {
            AnnotationSource::Absent => Ok(Self {
                name_col: name_col.to_string(),
                names: ColumnData::range(n_rows_hint),
                columns: Vec::new(),
            }),
            AnnotationSource::Table(t) => Ok(t.rebound(name_col)),
            AnnotationSource::Mapping(m) => Self::from_mapping(m, name_col, n_rows_hint),
            AnnotationSource::Value(Value::Map(m)) => Self::from_mapping(m, name_col, n_rows_hint),
            AnnotationSource::Value(other) => Err(AnnError::Schema(format!(
                "annotation needs to be a table or mapping, not {}",
                other.type_name()
            ))),
        }
    }

    fn from_mapping(entries: Mapping, name_col: &str, n_rows_hint: usize) -> Result<Self> {
        let mut names = None;
        let mut columns = Vec::with_capacity(entries.len());
        let mut n_rows = None;

        for (key, value) in entries {
            let type_name = value.type_name();
            let col = value.into_column().ok_or_else(|| {
                AnnError::Schema(format!(
                    "annotation column {key:?} needs to be a 1-D sequence, not {type_name}"
                ))
            })?;
            match n_rows {
                None => n_rows = Some(col.len()),
                Some(n) if n != col.len() => {
                    return Err(AnnError::Schema(format!(
                        "annotation column {key:?} has {} entries, expected {n}",
                        col.len()
                    )));
                }
                Some(_) => {}
            }
            if key == name_col {
                names = Some(col);
            } else if let Some(slot) = columns.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = col;
            } else {
                columns.push((key, col));
            }
        }

        let n_rows = n_rows.unwrap_or(n_rows_hint);
        Ok(Self {
            name_col: name_col.to_string(),
            names: names.unwrap_or_else(|| ColumnData::range(n_rows)),
            columns,
        })
    }

    /// Same columns, bound to `name_col`. A column already carrying that name
    /// becomes the identifier column; the old identifier is kept as an
    /// ordinary column.
    fn rebound(mut self, name_col: &str) -> Self {
        if self.name_col == name_col {
            return self;
        }
        let n = self.len();
        let old_name = std::mem::replace(&mut self.name_col, name_col.to_string());
        let new_names = match self.columns.iter().position(|(k, _)| k == name_col) {
            Some(pos) => self.columns.remove(pos).1,
            None => ColumnData::range(n),
        };
        let old_names = std::mem::replace(&mut self.names, new_names);
        self.columns.push((old_name, old_names));
        self
    }

    /// Same data with the identifier column renamed to the opposite axis's
    /// reserved name.
    ///
    /// An ordinary column already carrying that name takes over the old
    /// identifier name, so flipping twice gives back the original table.
    pub fn flipped(&self) -> Self {
        let name_col = match Axis::of_name_col(&self.name_col) {
            Some(axis) => axis.opposite().name_col(),
            None => ROW_NAMES,
        };
        let columns = self
            .columns
            .iter()
            .map(|(k, c)| {
                if k == name_col {
                    debug!("{name_col}: column renamed to {} on flip", self.name_col);
                    (self.name_col.clone(), c.clone())
                } else {
                    (k.clone(), c.clone())
                }
            })
            .collect();
        Self {
            name_col: name_col.to_string(),
            names: self.names.clone(),
            columns,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the identifier column.
    pub fn name_col(&self) -> &str {
        &self.name_col
    }

    /// The identifier column.
    pub fn names(&self) -> &ColumnData {
        &self.names
    }

    /// Column names excluding the identifier column, in table order.
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Look up a column by name. The identifier column is addressable too.
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        if name == self.name_col {
            return Some(&self.names);
        }
        self.columns.iter().find(|(k, _)| k == name).map(|(_, c)| c)
    }

    /// Whether a column named `name` exists (identifier included).
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Iterate over `(name, column)` pairs, identifier column excluded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnData)> + '_ {
        self.columns.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Position of the first identifier equal to `label`.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.names.position_of(label)
    }

    /// Whether the identifier column is the default `0..n`.
    pub fn has_default_names(&self) -> bool {
        self.names.is_default_range()
    }

    /// Replace the identifier column.
    pub fn set_names(&mut self, names: impl Into<ColumnData>) -> Result<()> {
        let names = names.into();
        self.check_length(&self.name_col, &names)?;
        self.names = names;
        Ok(())
    }

    /// Set a single column. See [`set_columns`](Self::set_columns).
    pub fn set_column(&mut self, name: &str, values: impl Into<ColumnData>) -> Result<()> {
        self.set_columns(vec![name.to_string()], vec![values.into()])
    }

    /// Set several columns at once.
    ///
    /// Existing columns are overwritten element-for-element. Unknown names are
    /// appended at the end, which installs a replacement table. Nothing is
    /// changed if any column fails validation.
    ///
    /// # Errors
    ///
    /// [`AnnError::Shape`] if `names` and `values` differ in length, or if a
    /// column does not have exactly [`len`](Self::len) entries.
    pub fn set_columns(&mut self, names: Vec<String>, values: Vec<ColumnData>) -> Result<()> {
        self.validate_columns(&names, &values)?;
        if names.iter().all(|n| self.contains(n)) {
            for (name, col) in names.into_iter().zip(values) {
                self.overwrite(&name, col);
            }
            return Ok(());
        }
        let replacement = self.with_columns(names, values)?;
        debug!(
            "{}: installing replacement table with {} columns",
            self.name_col,
            replacement.columns.len()
        );
        *self = replacement;
        Ok(())
    }

    /// Set columns from the rows of a matrix: row `i` becomes column `names[i]`.
    pub fn set_numeric_rows(&mut self, names: Vec<String>, rows: &Array2<f64>) -> Result<()> {
        let values = rows
            .outer_iter()
            .map(|r| ColumnData::Numeric(r.to_vec()))
            .collect();
        self.set_columns(names, values)
    }

    /// A copy of this table with the given columns set or appended.
    pub fn with_columns(&self, names: Vec<String>, values: Vec<ColumnData>) -> Result<Self> {
        self.validate_columns(&names, &values)?;
        let mut next = self.clone();
        for (name, col) in names.into_iter().zip(values) {
            if next.contains(&name) {
                next.overwrite(&name, col);
            } else {
                next.columns.push((name, col));
            }
        }
        Ok(next)
    }

    fn validate_columns(&self, names: &[String], values: &[ColumnData]) -> Result<()> {
        if names.len() != values.len() {
            return Err(AnnError::Shape(format!(
                "You passed {} column keys but {} arrays as columns. If you passed a matrix \
                 instead of a sequence of arrays, try transposing it.",
                names.len(),
                values.len()
            )));
        }
        for (name, col) in names.iter().zip(values) {
            self.check_length(name, col)?;
        }
        Ok(())
    }

    fn check_length(&self, name: &str, col: &ColumnData) -> Result<()> {
        let n = self.len();
        if col.len() > n {
            return Err(AnnError::Shape(format!(
                "New column {name:?} has too many entries ({} > {n})",
                col.len()
            )));
        }
        if col.len() < n {
            return Err(AnnError::Shape(format!(
                "New column {name:?} has too few entries ({} < {n})",
                col.len()
            )));
        }
        Ok(())
    }

    fn overwrite(&mut self, name: &str, col: ColumnData) {
        if name == self.name_col {
            self.names = col;
        } else if let Some(slot) = self.columns.iter_mut().find(|(k, _)| k == name) {
            slot.1 = col;
        }
    }

    /// Rows at the given positions, in order. Positions may repeat.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            name_col: self.name_col.clone(),
            names: self.names.subset(indices),
            columns: self
                .columns
                .iter()
                .map(|(k, c)| (k.clone(), c.subset(indices)))
                .collect(),
        }
    }

    /// Copy without the rows at the given positions.
    pub fn without_rows(&self, positions: &[usize]) -> Self {
        let drop: HashSet<usize> = positions.iter().copied().collect();
        let keep: Vec<usize> = (0..self.len()).filter(|i| !drop.contains(i)).collect();
        self.subset(&keep)
    }

    /// Export as a mapping of column name → values, identifier column first.
    pub fn to_mapping(&self) -> Mapping {
        std::iter::once((self.name_col.clone(), Value::from(self.names.clone())))
            .chain(self.columns.iter().map(|(k, c)| (k.clone(), Value::from(c.clone()))))
            .collect()
    }
}

impl Summarizable for AnnotationTable {
    fn summary(&self) -> String {
        format!(
            "AnnotationTable: {} rows, {} columns ({})",
            self.len(),
            self.columns.len(),
            self.name_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::COL_NAMES;
    use ndarray::array;

    fn two_rows() -> AnnotationTable {
        AnnotationTable::new(
            AnnotationSource::mapping([("smp_names", vec!["A", "B"])]),
            ROW_NAMES,
            2,
        )
        .unwrap()
    }

    #[test]
    fn absent_source_gives_range() {
        let t = AnnotationTable::new(AnnotationSource::Absent, ROW_NAMES, 3).unwrap();
        assert_eq!(t.len(), 3);
        assert!(t.has_default_names());
        assert!(t.columns().is_empty());
        assert_eq!(t.name_col(), "smp_names");
    }

    #[test]
    fn mapping_synthesizes_identifier() {
        let t = AnnotationTable::new(
            AnnotationSource::mapping([("Smp", vec!["A", "B"])]),
            ROW_NAMES,
            99,
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.names(), &ColumnData::range(2));
        assert_eq!(t.columns(), vec!["Smp"]);
    }

    #[test]
    fn empty_mapping_uses_hint() {
        let t = AnnotationTable::new(AnnotationSource::Mapping(Vec::new()), COL_NAMES, 4).unwrap();
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn ragged_mapping_is_schema_error() {
        let src = AnnotationSource::Mapping(vec![
            ("a".into(), Value::from(vec![1_i64, 2])),
            ("b".into(), Value::from(vec![1_i64, 2, 3])),
        ]);
        let r = AnnotationTable::new(src, ROW_NAMES, 2);
        assert!(matches!(r, Err(AnnError::Schema(_))));
    }

    #[test]
    fn non_mapping_value_is_schema_error() {
        let r = AnnotationTable::new(AnnotationSource::Value(Value::from(3_i64)), ROW_NAMES, 2);
        assert!(matches!(r, Err(AnnError::Schema(_))));

        let src = AnnotationSource::mapping([("a", 3_i64)]);
        assert!(matches!(AnnotationTable::new(src, ROW_NAMES, 2), Err(AnnError::Schema(_))));
    }

    #[test]
    fn table_source_is_copied() {
        let t = two_rows();
        let copy = AnnotationTable::new(AnnotationSource::Table(t.clone()), ROW_NAMES, 0).unwrap();
        assert_eq!(copy, t);
    }

    #[test]
    fn flipped_renames_identifier() {
        let mut t = two_rows();
        t.set_column("group", vec!["x", "y"]).unwrap();
        let f = t.flipped();
        assert_eq!(f.name_col(), "var_names");
        assert_eq!(f.names(), t.names());
        assert_eq!(f.columns(), vec!["group"]);
        assert_eq!(f.flipped(), t);
        // original untouched
        assert_eq!(t.name_col(), "smp_names");
    }

    #[test]
    fn flip_keeps_column_named_like_new_identifier() {
        let mut t = two_rows();
        t.set_column("var_names", vec!["p", "q"]).unwrap();
        let f = t.flipped();
        assert_eq!(f.name_col(), "var_names");
        assert_eq!(f.column("var_names"), Some(t.names()));
        assert_eq!(f.column("smp_names"), Some(&ColumnData::from(vec!["p", "q"])));
        assert_eq!(f.flipped(), t);
    }

    #[test]
    fn append_and_overwrite_columns() {
        let mut t = two_rows();
        t.set_column("new", vec![1_i64, 2]).unwrap();
        assert_eq!(t.column("new"), Some(&ColumnData::Integers(vec![1, 2])));

        t.set_columns(
            vec!["new2".into(), "new3".into()],
            vec![ColumnData::from(vec!["A", "B"]), ColumnData::from(vec!["c", "d"])],
        )
        .unwrap();
        assert_eq!(t.columns(), vec!["new", "new2", "new3"]);

        t.set_column("new", vec![5_i64, 6]).unwrap();
        assert_eq!(t.column("new"), Some(&ColumnData::Integers(vec![5, 6])));
        assert_eq!(t.columns(), vec!["new", "new2", "new3"]);
    }

    #[test]
    fn too_long_column_is_rejected() {
        let mut t = two_rows();
        let err = t.set_column("new4", vec!["far", "too", "long"]).unwrap_err();
        assert!(matches!(err, AnnError::Shape(_)));
        assert!(err.to_string().contains("too many entries"));
        assert!(t.columns().is_empty());
    }

    #[test]
    fn name_value_count_mismatch() {
        let mut t = two_rows();
        let r = t.set_columns(vec!["a".into(), "b".into()], vec![ColumnData::range(2)]);
        assert!(matches!(r, Err(AnnError::Shape(_))));
    }

    #[test]
    fn failed_batch_changes_nothing() {
        let mut t = two_rows();
        let r = t.set_columns(
            vec!["ok".into(), "bad".into()],
            vec![ColumnData::range(2), ColumnData::range(5)],
        );
        assert!(r.is_err());
        assert!(!t.contains("ok"));
    }

    #[test]
    fn numeric_rows_become_columns() {
        let mut t = two_rows();
        t.set_numeric_rows(vec!["x".into(), "y".into()], &array![[1.0, 2.0], [3.0, 4.0]])
            .unwrap();
        assert_eq!(t.column("y"), Some(&ColumnData::Numeric(vec![3.0, 4.0])));
    }

    #[test]
    fn subset_and_remove_rows() {
        let mut t = two_rows();
        t.set_column("v", vec![10.0, 20.0]).unwrap();
        let s = t.subset(&[1]);
        assert_eq!(s.names(), &ColumnData::from(vec!["B"]));
        assert_eq!(s.column("v"), Some(&ColumnData::Numeric(vec![20.0])));

        let r = t.without_rows(&[0]);
        assert_eq!(r, s);
    }

    #[test]
    fn label_position() {
        let t = two_rows();
        assert_eq!(t.position_of("B"), Some(1));
        assert_eq!(t.position_of("Z"), None);
    }

    #[test]
    fn mapping_export_puts_identifier_first() {
        let mut t = two_rows();
        t.set_column("v", vec![1_i64, 2]).unwrap();
        let m = t.to_mapping();
        assert_eq!(m[0].0, "smp_names");
        assert_eq!(m[1], ("v".to_string(), Value::Ints(vec![1, 2])));
    }

    #[test]
    fn summary_format() {
        assert_eq!(two_rows().summary(), "AnnotationTable: 2 rows, 0 columns (smp_names)");
    }
}

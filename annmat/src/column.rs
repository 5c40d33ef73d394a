//! Typed annotation columns.
//!
//! A [`ColumnData`] is one named column of an
//! [`AnnotationTable`](crate::table::AnnotationTable): a fixed-length sequence
//! of a uniform element type.

/// A metadata column with typed data.
///
/// Supports string, integer, numeric, boolean and categorical columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnData {
    /// Free-text string values.
    Strings(Vec<String>),
    /// Integer values. Default identifier columns are `0..n`.
    Integers(Vec<i64>),
    /// Numeric (f64) values.
    Numeric(Vec<f64>),
    /// Boolean flags.
    Booleans(Vec<bool>),
    /// Categorical data stored as integer codes indexing into a category list.
    Categorical {
        codes: Vec<i32>,
        categories: Vec<String>,
    },
}

impl ColumnData {
    /// The default identifier column `0..n`.
    pub fn range(n: usize) -> Self {
        ColumnData::Integers((0..n as i64).collect())
    }

    /// Number of elements in this column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Strings(v) => v.len(),
            ColumnData::Integers(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Booleans(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the element type.
    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Strings(_) => "str",
            ColumnData::Integers(_) => "int64",
            ColumnData::Numeric(_) => "float64",
            ColumnData::Booleans(_) => "bool",
            ColumnData::Categorical { .. } => "category",
        }
    }

    /// Try to get as string slice. Returns `None` if not `Strings` variant.
    pub fn as_strings(&self) -> Option<&Vec<String>> {
        match self {
            ColumnData::Strings(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as integer slice. Returns `None` if not `Integers` variant.
    pub fn as_integers(&self) -> Option<&Vec<i64>> {
        match self {
            ColumnData::Integers(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as numeric slice. Returns `None` if not `Numeric` variant.
    pub fn as_numeric(&self) -> Option<&Vec<f64>> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is exactly the default identifier sequence `0..len`.
    pub fn is_default_range(&self) -> bool {
        match self {
            ColumnData::Integers(v) => v.iter().enumerate().all(|(i, &x)| x == i as i64),
            _ => false,
        }
    }

    /// Render element `i` as a string, if in bounds.
    ///
    /// Categorical codes outside the category list render as `None`.
    pub fn value_string(&self, i: usize) -> Option<String> {
        match self {
            ColumnData::Strings(v) => v.get(i).cloned(),
            ColumnData::Integers(v) => v.get(i).map(|x| x.to_string()),
            ColumnData::Numeric(v) => v.get(i).map(|x| x.to_string()),
            ColumnData::Booleans(v) => v.get(i).map(|x| x.to_string()),
            ColumnData::Categorical { codes, categories } => codes
                .get(i)
                .and_then(|&c| usize::try_from(c).ok())
                .and_then(|c| categories.get(c).cloned()),
        }
    }

    /// Position of the first element equal to `label`.
    ///
    /// Only string-valued columns (strings and categorical) can match a label;
    /// integer identifiers never match a string label.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        match self {
            ColumnData::Strings(v) => v.iter().position(|s| s == label),
            ColumnData::Categorical { codes, categories } => {
                let code = categories.iter().position(|c| c == label)? as i32;
                codes.iter().position(|&c| c == code)
            }
            _ => None,
        }
    }

    /// Subset to the given indices. Indices may repeat.
    pub(crate) fn subset(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Strings(v) => {
                ColumnData::Strings(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnData::Integers(v) => {
                ColumnData::Integers(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Numeric(v) => {
                ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Booleans(v) => {
                ColumnData::Booleans(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Categorical { codes, categories } => ColumnData::Categorical {
                codes: indices.iter().map(|&i| codes[i]).collect(),
                categories: categories.clone(),
            },
        }
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        ColumnData::Strings(v)
    }
}

impl From<Vec<&str>> for ColumnData {
    fn from(v: Vec<&str>) -> Self {
        ColumnData::Strings(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        ColumnData::Integers(v)
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::Numeric(v)
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        ColumnData::Booleans(v)
    }
}

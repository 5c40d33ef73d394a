//! Dynamically typed values for unstructured metadata and combined mappings.
//!
//! Downstream code stores arbitrary entries in a container's `extra` mapping
//! (root cells, group names, colors, ...) by convention, so the store is
//! schema-free. [`Value`] is also the input type for matrices and annotation
//! mappings arriving from loaders.

use ndarray::{Array1, Array2, ArrayD};

use crate::column::ColumnData;
use crate::masked::{MaskedArray, MaskedMatrix};
use crate::sparse::SparseMatrix;

/// Ordered list of named values. Used for annotation mappings and for the
/// combined construction mapping.
pub type Mapping = Vec<(String, Value)>;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strs(Vec<String>),
    Categorical {
        codes: Vec<i32>,
        categories: Vec<String>,
    },
    /// One boolean mask per row.
    BoolMatrix(Vec<Vec<bool>>),
    /// Dense array of any rank.
    Dense(ArrayD<f64>),
    /// Masked array of any rank.
    Masked(MaskedArray),
    Sparse(SparseMatrix),
    /// Nested mapping.
    Map(Mapping),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::Bools(_) => "Bools",
            Value::Ints(_) => "Ints",
            Value::Floats(_) => "Floats",
            Value::Strs(_) => "Strs",
            Value::Categorical { .. } => "Categorical",
            Value::BoolMatrix(_) => "BoolMatrix",
            Value::Dense(_) => "Dense",
            Value::Masked(_) => "Masked",
            Value::Sparse(_) => "Sparse",
            Value::Map(_) => "Map",
        }
    }

    /// Interpret a one-dimensional sequence as an annotation column.
    ///
    /// Returns `None` for scalars, matrices and mappings.
    pub fn into_column(self) -> Option<ColumnData> {
        match self {
            Value::Bools(v) => Some(ColumnData::Booleans(v)),
            Value::Ints(v) => Some(ColumnData::Integers(v)),
            Value::Floats(v) => Some(ColumnData::Numeric(v)),
            Value::Strs(v) => Some(ColumnData::Strings(v)),
            Value::Categorical { codes, categories } => {
                Some(ColumnData::Categorical { codes, categories })
            }
            Value::Dense(a) if a.ndim() == 1 => Some(ColumnData::Numeric(a.iter().copied().collect())),
            _ => None,
        }
    }

    /// Borrow as a string list.
    pub fn as_strs(&self) -> Option<&[String]> {
        match self {
            Value::Strs(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a nested mapping.
    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric scalar, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<ColumnData> for Value {
    fn from(c: ColumnData) -> Self {
        match c {
            ColumnData::Strings(v) => Value::Strs(v),
            ColumnData::Integers(v) => Value::Ints(v),
            ColumnData::Numeric(v) => Value::Floats(v),
            ColumnData::Booleans(v) => Value::Bools(v),
            ColumnData::Categorical { codes, categories } => Value::Categorical { codes, categories },
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::Bools(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Ints(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Floats(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strs(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::Strs(v.into_iter().map(String::from).collect())
    }
}

impl From<Array1<f64>> for Value {
    fn from(a: Array1<f64>) -> Self {
        Value::Dense(a.into_dyn())
    }
}

impl From<Array2<f64>> for Value {
    fn from(a: Array2<f64>) -> Self {
        Value::Dense(a.into_dyn())
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Dense(a)
    }
}

impl From<MaskedArray> for Value {
    fn from(m: MaskedArray) -> Self {
        Value::Masked(m)
    }
}

impl From<MaskedMatrix> for Value {
    fn from(m: MaskedMatrix) -> Self {
        Value::Masked(m.into_dyn())
    }
}

impl From<SparseMatrix> for Value {
    fn from(s: SparseMatrix) -> Self {
        Value::Sparse(s)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Map(m)
    }
}

/// Build a [`Mapping`] from `(key, value)` pairs.
pub fn mapping<K, V, I>(entries: I) -> Mapping
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Remove the first entry named `key` from a mapping.
pub(crate) fn take(map: &mut Mapping, key: &str) -> Option<Value> {
    let pos = map.iter().position(|(k, _)| k == key)?;
    Some(map.remove(pos).1)
}

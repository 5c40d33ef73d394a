//! Reserved names and axis metadata.

/// Identifier column of the row (sample) table.
pub const ROW_NAMES: &str = "smp_names";

/// Identifier column of the column (variable) table.
pub const COL_NAMES: &str = "var_names";

/// Key holding the matrix in a combined mapping.
pub const MATRIX_KEY: &str = "X";

/// Row identifier list keys in a combined mapping, in lookup order.
pub const ROW_NAME_KEYS: [&str; 2] = ["row_names", ROW_NAMES];

/// Column identifier list keys in a combined mapping, in lookup order.
pub const COL_NAME_KEYS: [&str; 2] = ["col_names", COL_NAMES];

/// Nested row annotation keys in a combined mapping, merged in this order.
pub const ROW_ANNOTATION_KEYS: [&str; 2] = ["row", "smp"];

/// Nested column annotation keys in a combined mapping, merged in this order.
pub const COL_ANNOTATION_KEYS: [&str; 2] = ["col", "var"];

/// One of the two matrix axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Rows,
    Cols,
}

impl Axis {
    /// Identifier column name bound to this axis.
    pub fn name_col(self) -> &'static str {
        match self {
            Axis::Rows => ROW_NAMES,
            Axis::Cols => COL_NAMES,
        }
    }

    /// The other axis.
    pub fn opposite(self) -> Axis {
        match self {
            Axis::Rows => Axis::Cols,
            Axis::Cols => Axis::Rows,
        }
    }

    /// Axis bound to an identifier column name, if it is a reserved one.
    pub fn of_name_col(name: &str) -> Option<Axis> {
        match name {
            ROW_NAMES => Some(Axis::Rows),
            COL_NAMES => Some(Axis::Cols),
            _ => None,
        }
    }

    pub(crate) fn metadata_label(self) -> &'static str {
        match self {
            Axis::Rows => "Sample metadata",
            Axis::Cols => "Feature metadata",
        }
    }

    pub(crate) fn dimension_label(self) -> &'static str {
        match self {
            Axis::Rows => "rows",
            Axis::Cols => "columns",
        }
    }
}

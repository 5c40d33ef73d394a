//! Group selection over a row annotation column.
//!
//! A grouping is stored as a row column `key` holding each row's group, plus
//! the extra entries `"{key}_names"` (the group names, in order) and,
//! optionally, `"{key}_masks"` (one precomputed row mask per group).

use annmat_core::{AnnError, Result};
use log::debug;

use crate::ann_matrix::AnnotatedMatrix;
use crate::column::ColumnData;
use crate::keys::ROW_NAMES;
use crate::value::Value;

/// Which groups to select.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupSubset {
    #[default]
    All,
    /// Group names, or group positions written as strings.
    Names(Vec<String>),
}

impl GroupSubset {
    /// Parse `"all"` or a comma separated list of names.
    pub fn parse(s: &str) -> Self {
        if s == "all" {
            return GroupSubset::All;
        }
        GroupSubset::Names(s.split(',').map(str::to_string).collect())
    }
}

impl From<&str> for GroupSubset {
    fn from(s: &str) -> Self {
        GroupSubset::parse(s)
    }
}

impl From<Vec<&str>> for GroupSubset {
    fn from(v: Vec<&str>) -> Self {
        GroupSubset::Names(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for GroupSubset {
    fn from(v: Vec<String>) -> Self {
        GroupSubset::Names(v)
    }
}

/// Selected group names and one row mask per selected group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups {
    pub names: Vec<String>,
    pub masks: Vec<Vec<bool>>,
}

impl Groups {
    /// Number of selected groups.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over `(name, mask)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[bool])> + '_ {
        self.names
            .iter()
            .zip(&self.masks)
            .map(|(n, m)| (n.as_str(), m.as_slice()))
    }
}

/// Select groups of rows by the grouping stored under `key`.
///
/// Names not present in `"{key}_names"` are retried as group positions
/// (`"0"`, `"1"`, ...).
///
/// # Errors
///
/// - [`AnnError::LabelNotFound`] if `"{key}_names"` is missing, if the row
///   column `key` is missing and no masks are stored, or if no requested
///   group matches.
/// - [`AnnError::Schema`] if the stored names or masks have the wrong type.
/// - [`AnnError::Shape`] if stored masks disagree with the groups or rows.
pub fn select_groups(
    adata: &AnnotatedMatrix,
    subset: impl Into<GroupSubset>,
    key: &str,
) -> Result<Groups> {
    let names_key = format!("{key}_names");
    let names = match adata.get_extra(&names_key) {
        Some(Value::Strs(v)) => v.clone(),
        Some(other) => {
            return Err(AnnError::Schema(format!(
                "{names_key:?} needs to be a list of strings, not {}",
                other.type_name()
            )))
        }
        None => {
            return Err(AnnError::LabelNotFound {
                label: names_key,
                axis: "extra",
            })
        }
    };

    let masks = match adata.get_extra(&format!("{key}_masks")) {
        Some(Value::BoolMatrix(m)) => stored_masks(m, names.len(), adata.len())?,
        Some(other) => {
            return Err(AnnError::Schema(format!(
                "{key}_masks needs to be a boolean matrix, not {}",
                other.type_name()
            )))
        }
        None => {
            let column = adata
                .row_table()
                .column(key)
                .ok_or_else(|| AnnError::LabelNotFound {
                    label: key.to_string(),
                    axis: ROW_NAMES,
                })?;
            computed_masks(column, &names)
        }
    };

    let requested = match subset.into() {
        GroupSubset::All => return Ok(Groups { names, masks }),
        GroupSubset::Names(requested) => requested,
    };

    let mut ids: Vec<usize> = (0..names.len())
        .filter(|&i| requested.contains(&names[i]))
        .collect();
    if ids.is_empty() {
        ids = (0..names.len())
            .filter(|i| requested.contains(&i.to_string()))
            .collect();
    }
    if ids.is_empty() {
        return Err(AnnError::LabelNotFound {
            label: requested.join(","),
            axis: "groups",
        });
    }
    debug!("{key}: selected {} of {} groups", ids.len(), names.len());

    Ok(Groups {
        names: ids.iter().map(|&i| names[i].clone()).collect(),
        masks: ids.iter().map(|&i| masks[i].clone()).collect(),
    })
}

fn stored_masks(masks: &[Vec<bool>], n_groups: usize, n_rows: usize) -> Result<Vec<Vec<bool>>> {
    if masks.len() != n_groups {
        return Err(AnnError::Shape(format!(
            "{} group masks stored for {n_groups} groups",
            masks.len()
        )));
    }
    if let Some(m) = masks.iter().find(|m| m.len() != n_rows) {
        return Err(AnnError::Shape(format!(
            "group mask has {} entries, but data has {n_rows} rows",
            m.len()
        )));
    }
    Ok(masks.to_vec())
}

/// One mask per group name; a name absent from the column falls back to
/// matching its position.
fn computed_masks(column: &ColumnData, names: &[String]) -> Vec<Vec<bool>> {
    let values: Vec<Option<String>> = (0..column.len()).map(|i| column.value_string(i)).collect();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let target = if values.iter().flatten().any(|v| v == name) {
                name.clone()
            } else {
                i.to_string()
            };
            values
                .iter()
                .map(|v| v.as_deref() == Some(target.as_str()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::AnnotationSource;
    use ndarray::Array2;

    fn grouped() -> AnnotatedMatrix {
        AnnotatedMatrix::new(
            Array2::<f64>::zeros((4, 2)),
            AnnotationSource::mapping([("louvain", vec!["x", "y", "x", "z"])]),
            AnnotationSource::Absent,
        )
        .unwrap()
        .with_extra("louvain_names", vec!["x", "y", "z"])
    }

    #[test]
    fn parse_subset() {
        assert_eq!(GroupSubset::parse("all"), GroupSubset::All);
        assert_eq!(
            GroupSubset::parse("a,b"),
            GroupSubset::Names(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn all_groups() {
        let g = select_groups(&grouped(), GroupSubset::All, "louvain").unwrap();
        assert_eq!(g.names, vec!["x", "y", "z"]);
        assert_eq!(g.masks[0], vec![true, false, true, false]);
        assert_eq!(g.masks[2], vec![false, false, false, true]);
    }

    #[test]
    fn named_subset() {
        let g = select_groups(&grouped(), "z,x", "louvain").unwrap();
        // keeps stored group order
        assert_eq!(g.names, vec!["x", "z"]);
        assert_eq!(g.len(), 2);
        let (name, mask) = g.iter().nth(1).unwrap();
        assert_eq!(name, "z");
        assert_eq!(mask, &[false, false, false, true]);
    }

    #[test]
    fn index_fallback() {
        let g = select_groups(&grouped(), vec!["1"], "louvain").unwrap();
        assert_eq!(g.names, vec!["y"]);
    }

    #[test]
    fn numeric_group_column_matches_positions() {
        let adata = AnnotatedMatrix::new(
            Array2::<f64>::zeros((3, 1)),
            AnnotationSource::mapping([("k", vec![0_i64, 1, 0])]),
            AnnotationSource::Absent,
        )
        .unwrap()
        .with_extra("k_names", vec!["first", "second"]);
        let g = select_groups(&adata, GroupSubset::All, "k").unwrap();
        assert_eq!(g.masks, vec![vec![true, false, true], vec![false, true, false]]);
    }

    #[test]
    fn stored_masks_win() {
        let adata = grouped().with_extra(
            "louvain_masks",
            Value::BoolMatrix(vec![
                vec![true, true, true, true],
                vec![false; 4],
                vec![false; 4],
            ]),
        );
        let g = select_groups(&adata, "x", "louvain").unwrap();
        assert_eq!(g.masks, vec![vec![true; 4]]);
    }

    #[test]
    fn stored_masks_shape_checked() {
        let adata = grouped().with_extra("louvain_masks", Value::BoolMatrix(vec![vec![true; 4]]));
        assert!(matches!(
            select_groups(&adata, GroupSubset::All, "louvain"),
            Err(AnnError::Shape(_))
        ));
    }

    #[test]
    fn nothing_matches() {
        let r = select_groups(&grouped(), "nope", "louvain");
        assert!(matches!(r, Err(AnnError::LabelNotFound { axis: "groups", .. })));
    }

    #[test]
    fn missing_names_entry() {
        let r = select_groups(&grouped(), GroupSubset::All, "other");
        assert!(matches!(r, Err(AnnError::LabelNotFound { axis: "extra", .. })));
    }
}

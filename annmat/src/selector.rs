//! Index expressions and their normalization to positions.
//!
//! Every axis of an [`AnnotatedMatrix`](crate::AnnotatedMatrix) is indexed
//! independently by a [`Selector`]. Selectors name positions, labels from the
//! axis' identifier column, ranges with positional or label bounds, lists, or
//! boolean masks. [`normalize`] resolves labels against the identifier column
//! and produces a [`Normalized`] selection which is then expanded to explicit
//! positions.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

use annmat_core::{AnnError, Result};
use log::trace;

use crate::keys::Axis;
use crate::table::AnnotationTable;

/// One element of a list selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Pos(isize),
    Label(String),
    Flag(bool),
}

/// A range bound: a position or a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Pos(isize),
    Label(String),
}

/// Selection along one axis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// The whole axis.
    #[default]
    All,
    /// One position; negative values count from the end.
    Pos(isize),
    /// One label from the identifier column.
    Label(String),
    /// A half-open range. Label stop bounds are inclusive. `None` bounds are
    /// open; `step` defaults to 1.
    Range {
        start: Option<Bound>,
        stop: Option<Bound>,
        step: Option<isize>,
    },
    /// Positions, labels, or flags. A list made only of flags is a mask.
    List(Vec<Key>),
    /// Boolean mask; must match the axis length.
    Mask(Vec<bool>),
}

impl Selector {
    /// Label range; both ends are included.
    pub fn labels_between(start: &str, stop: &str) -> Self {
        Selector::Range {
            start: Some(Bound::Label(start.to_string())),
            stop: Some(Bound::Label(stop.to_string())),
            step: None,
        }
    }

    /// List of labels.
    pub fn labels<S: AsRef<str>>(labels: &[S]) -> Self {
        Selector::List(labels.iter().map(|s| Key::Label(s.as_ref().to_string())).collect())
    }

    /// List of positions.
    pub fn positions(positions: &[usize]) -> Self {
        Selector::List(positions.iter().map(|&p| Key::Pos(p as isize)).collect())
    }

    /// Whether this selects the whole axis without resolving anything.
    pub fn is_all(&self) -> bool {
        matches!(
            self,
            Selector::All
                | Selector::Range {
                    start: None,
                    stop: None,
                    step: None | Some(1),
                }
        )
    }
}

impl From<usize> for Selector {
    fn from(i: usize) -> Self {
        Selector::Pos(i as isize)
    }
}

impl From<isize> for Selector {
    fn from(i: isize) -> Self {
        Selector::Pos(i)
    }
}

impl From<i32> for Selector {
    fn from(i: i32) -> Self {
        Selector::Pos(i as isize)
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::Label(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::Label(s)
    }
}

impl From<Vec<&str>> for Selector {
    fn from(v: Vec<&str>) -> Self {
        Selector::labels(&v)
    }
}

impl From<Vec<usize>> for Selector {
    fn from(v: Vec<usize>) -> Self {
        Selector::positions(&v)
    }
}

impl From<Vec<bool>> for Selector {
    fn from(v: Vec<bool>) -> Self {
        Selector::Mask(v)
    }
}

impl From<Vec<Key>> for Selector {
    fn from(v: Vec<Key>) -> Self {
        Selector::List(v)
    }
}

impl From<RangeFull> for Selector {
    fn from(_: RangeFull) -> Self {
        Selector::All
    }
}

impl From<Range<usize>> for Selector {
    fn from(r: Range<usize>) -> Self {
        Selector::Range {
            start: Some(Bound::Pos(r.start as isize)),
            stop: Some(Bound::Pos(r.end as isize)),
            step: None,
        }
    }
}

impl From<RangeFrom<usize>> for Selector {
    fn from(r: RangeFrom<usize>) -> Self {
        Selector::Range {
            start: Some(Bound::Pos(r.start as isize)),
            stop: None,
            step: None,
        }
    }
}

impl From<RangeTo<usize>> for Selector {
    fn from(r: RangeTo<usize>) -> Self {
        Selector::Range {
            start: None,
            stop: Some(Bound::Pos(r.end as isize)),
            step: None,
        }
    }
}

impl From<RangeInclusive<&str>> for Selector {
    fn from(r: RangeInclusive<&str>) -> Self {
        Selector::labels_between(r.start(), r.end())
    }
}

/// A full index expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// Key into the unstructured `extra` mapping.
    Key(String),
    /// Row selection; all columns.
    Rows(Selector),
    /// Row and column selection.
    Pair(Selector, Selector),
}

impl Index {
    /// The row and column selectors. `None` for [`Index::Key`].
    pub fn selectors(&self) -> Option<(&Selector, &Selector)> {
        const ALL: &Selector = &Selector::All;
        match self {
            Index::Key(_) => None,
            Index::Rows(r) => Some((r, ALL)),
            Index::Pair(r, c) => Some((r, c)),
        }
    }
}

impl From<&str> for Index {
    fn from(s: &str) -> Self {
        Index::Key(s.to_string())
    }
}

impl From<String> for Index {
    fn from(s: String) -> Self {
        Index::Key(s)
    }
}

impl From<Selector> for Index {
    fn from(s: Selector) -> Self {
        Index::Rows(s)
    }
}

impl From<usize> for Index {
    fn from(i: usize) -> Self {
        Index::Rows(i.into())
    }
}

impl From<isize> for Index {
    fn from(i: isize) -> Self {
        Index::Rows(i.into())
    }
}

impl From<i32> for Index {
    fn from(i: i32) -> Self {
        Index::Rows(i.into())
    }
}

impl<R: Into<Selector>, C: Into<Selector>> From<(R, C)> for Index {
    fn from((r, c): (R, C)) -> Self {
        Index::Pair(r.into(), c.into())
    }
}

/// A selector with labels resolved to positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// `start..stop` by `step`; open bounds are `None`.
    Slice {
        start: Option<usize>,
        stop: Option<usize>,
        step: isize,
    },
    /// Explicit positions, possibly repeated.
    Positions(Vec<usize>),
}

impl Normalized {
    /// The unrestricted slice.
    pub const FULL: Normalized = Normalized::Slice {
        start: None,
        stop: None,
        step: 1,
    };

    /// Whether this is the unrestricted slice.
    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    /// Expand to explicit positions on an axis of length `len`.
    ///
    /// Slice bounds are clamped to the axis the way half-open ranges are.
    pub fn positions(&self, len: usize) -> Vec<usize> {
        match self {
            Normalized::Positions(p) => p.clone(),
            Normalized::Slice { start, stop, step } if *step > 0 => {
                let start = start.unwrap_or(0).min(len);
                let stop = stop.unwrap_or(len).min(len);
                (start..stop.max(start)).step_by(*step as usize).collect()
            }
            Normalized::Slice { start, stop, step } => {
                if len == 0 {
                    return Vec::new();
                }
                let first = start.map_or(len - 1, |s| s.min(len - 1)) as isize;
                let last = stop.map_or(-1, |s| s as isize);
                let mut out = Vec::new();
                let mut i = first;
                while i > last {
                    out.push(i as usize);
                    i += step;
                }
                out
            }
        }
    }
}

fn wrap(pos: isize, len: usize) -> Option<usize> {
    let resolved = if pos < 0 { pos + len as isize } else { pos };
    (0..len as isize).contains(&resolved).then_some(resolved as usize)
}

fn lookup(label: &str, names: &AnnotationTable, axis: Axis) -> Result<usize> {
    names.position_of(label).ok_or_else(|| AnnError::LabelNotFound {
        label: label.to_string(),
        axis: axis.name_col(),
    })
}

fn position(pos: isize, len: usize, axis: Axis) -> Result<usize> {
    wrap(pos, len).ok_or_else(|| {
        AnnError::Index(format!(
            "position {pos} is out of bounds for {} of length {len}",
            axis.dimension_label()
        ))
    })
}

/// Resolve a selector against the identifier column of `table`, which is
/// bound to `axis`.
pub fn normalize(selector: &Selector, table: &AnnotationTable, axis: Axis) -> Result<Normalized> {
    let len = table.len();
    let normalized = match selector {
        Selector::All => Normalized::FULL,
        Selector::Pos(i) => {
            let i = position(*i, len, axis)?;
            Normalized::Slice { start: Some(i), stop: Some(i + 1), step: 1 }
        }
        Selector::Label(s) => {
            let i = lookup(s, table, axis)?;
            Normalized::Slice { start: Some(i), stop: Some(i + 1), step: 1 }
        }
        Selector::Range { start, stop, step } => {
            let step = step.unwrap_or(1);
            if step == 0 {
                return Err(AnnError::Index("slice step cannot be zero".into()));
            }
            let start = match start {
                None => None,
                Some(Bound::Pos(p)) => match clamp_bound(*p, len) {
                    Some(i) => Some(i),
                    None if step < 0 => return Ok(Normalized::Positions(Vec::new())),
                    None => Some(0),
                },
                Some(Bound::Label(s)) => Some(lookup(s, table, axis)?),
            };
            let stop = match stop {
                None => None,
                Some(Bound::Pos(p)) => match clamp_bound(*p, len) {
                    Some(i) => Some(i),
                    // Runs through position 0 when stepping backwards.
                    None if step < 0 => None,
                    None => Some(0),
                },
                Some(Bound::Label(s)) => Some(lookup(s, table, axis)? + 1),
            };
            Normalized::Slice { start, stop, step }
        }
        Selector::Mask(mask) => mask_positions(mask, len, axis)?,
        Selector::List(keys) => {
            let flags = keys.iter().filter(|k| matches!(k, Key::Flag(_))).count();
            if flags == keys.len() && !keys.is_empty() {
                let mask: Vec<bool> = keys
                    .iter()
                    .map(|k| matches!(k, Key::Flag(true)))
                    .collect();
                mask_positions(&mask, len, axis)?
            } else {
                let positions = keys
                    .iter()
                    .map(|k| match k {
                        Key::Pos(p) => position(*p, len, axis),
                        Key::Label(s) => lookup(s, table, axis),
                        Key::Flag(_) => Err(AnnError::Index(
                            "cannot mix boolean flags with positions or labels in one index"
                                .into(),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Normalized::Positions(positions)
            }
        }
    };
    trace!("{}: {:?} -> {:?}", axis.name_col(), selector, normalized);
    Ok(normalized)
}

/// Range bounds clamp instead of failing; negative bounds count from the end.
/// `None` means the bound lies before the first position.
fn clamp_bound(pos: isize, len: usize) -> Option<usize> {
    if pos < 0 {
        let resolved = pos + len as isize;
        (resolved >= 0).then_some(resolved as usize)
    } else {
        Some((pos as usize).min(len))
    }
}

fn mask_positions(mask: &[bool], len: usize, axis: Axis) -> Result<Normalized> {
    if mask.len() != len {
        return Err(AnnError::Index(format!(
            "boolean index of length {} does not match {} of length {len}",
            mask.len(),
            axis.dimension_label()
        )));
    }
    Ok(Normalized::Positions(
        mask.iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect(),
    ))
}

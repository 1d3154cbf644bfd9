/// Pointer-position to insertion-index resolution.
///
/// Shared by the drag-over indicator, the internal drop, and external
/// file/URI drops, so all three agree on where an item lands.
use serde::{Deserialize, Serialize};

/// One sibling's extent along the axis of its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub start: f64,
    pub end: f64,
}

impl Extent {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Extent of `size` units centred on `center`.
    pub fn centered(center: f64, size: f64) -> Self {
        Self {
            start: center - size / 2.0,
            end: center + size / 2.0,
        }
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum InsertionPoint {
    /// Insert before the sibling currently at this index.
    Index(usize),
    Append,
}

impl InsertionPoint {
    /// Concrete index in a container of `len` siblings.
    pub fn to_index(self, len: usize) -> usize {
        match self {
            InsertionPoint::Index(i) => i.min(len),
            InsertionPoint::Append => len,
        }
    }
}

/// Resolve where an item dropped at `coord` goes among `siblings`.
///
/// The first sibling whose center lies strictly beyond the pointer is the
/// insertion point. A pointer exactly on a center does not qualify that
/// sibling.
pub fn resolve_insertion(siblings: &[Extent], coord: f64) -> InsertionPoint {
    if siblings.is_empty() {
        return InsertionPoint::Index(0);
    }
    siblings
        .iter()
        .position(|s| coord < s.center())
        .map_or(InsertionPoint::Append, InsertionPoint::Index)
}

/// Layout of one column as seen by the pointer: its horizontal extent and
/// the vertical extents of its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub column_id: String,
    pub horizontal: Extent,
    #[serde(default)]
    pub tasks: Vec<Extent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Index of the column whose horizontal center is nearest to `x`.
/// Equal distances resolve to the leftmost column.
pub fn nearest_column(columns: &[ColumnLayout], x: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, col) in columns.iter().enumerate() {
        let distance = (col.horizontal.center() - x).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub column_id: String,
    pub insertion: InsertionPoint,
}

/// Resolve an arbitrary board point to a column and an insertion point
/// within it.
pub fn resolve_drop_target(columns: &[ColumnLayout], point: Point) -> Option<DropTarget> {
    let index = nearest_column(columns, point.x)?;
    let column = &columns[index];
    Some(DropTarget {
        column_id: column.column_id.clone(),
        insertion: resolve_insertion(&column.tasks, point.y),
    })
}

/// Resolve a column reorder along the horizontal axis.
pub fn resolve_column_insertion(columns: &[ColumnLayout], x: f64) -> InsertionPoint {
    let extents: Vec<Extent> = columns.iter().map(|c| c.horizontal).collect();
    resolve_insertion(&extents, x)
}

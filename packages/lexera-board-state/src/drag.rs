/// Internal drag-and-drop tracking.
///
/// The drag-over indicator and the final drop are both computed by
/// [`position::resolve_drop_target`] / [`position::resolve_column_insertion`]
/// from the same layout, so the indicator always shows where the item lands.
use crate::position::{self, ColumnLayout, DropTarget, InsertionPoint, Point};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragItem {
    Task { task_id: String, column_id: String },
    Column { column_id: String },
}

impl DragItem {
    pub fn id(&self) -> &str {
        match self {
            DragItem::Task { task_id, .. } => task_id,
            DragItem::Column { column_id } => column_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indicator {
    Task(DropTarget),
    Column(InsertionPoint),
}

#[derive(Debug, Default)]
pub struct DragTracker {
    active: Option<DragItem>,
    indicator: Option<Indicator>,
}

pub(crate) fn resolve(item: &DragItem, layout: &[ColumnLayout], point: Point) -> Option<Indicator> {
    match item {
        DragItem::Task { .. } => position::resolve_drop_target(layout, point).map(Indicator::Task),
        DragItem::Column { .. } => Some(Indicator::Column(position::resolve_column_insertion(
            layout, point.x,
        ))),
    }
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, item: DragItem) {
        self.active = Some(item);
        self.indicator = None;
    }

    pub fn active(&self) -> Option<&DragItem> {
        self.active.as_ref()
    }

    pub fn indicator(&self) -> Option<&Indicator> {
        self.indicator.as_ref()
    }

    /// Update the drop indicator for the pointer position.
    pub fn over(&mut self, layout: &[ColumnLayout], point: Point) -> Option<&Indicator> {
        let item = self.active.as_ref()?;
        self.indicator = resolve(item, layout, point);
        self.indicator.as_ref()
    }

    /// Finish the drag. Returns the item and where it lands.
    pub fn drop(&mut self, layout: &[ColumnLayout], point: Point) -> Option<(DragItem, Indicator)> {
        let item = self.active.take()?;
        self.indicator = None;
        let landing = resolve(&item, layout, point)?;
        Some((item, landing))
    }

    pub fn cancel(&mut self) {
        self.active = None;
        self.indicator = None;
    }
}

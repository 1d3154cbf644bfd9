use std::time::Instant;

use super::{BoardCache, RenderScope};
use crate::error::BoardError;
use crate::identity;
use crate::include;
use crate::position::InsertionPoint;
use crate::tags;
use crate::types::KanbanColumn;

impl BoardCache {
    /// Create an empty column. Returns its id.
    pub fn add_column(&mut self, title: &str, at: InsertionPoint, now: Instant) -> Result<String, BoardError> {
        self.ensure_valid()?;
        self.admit_creation(&["column", title], now)?;
        let id = identity::new_column_id(&self.board.collect_ids());
        let index = at.to_index(self.board.columns.len());
        self.board.columns.insert(index, KanbanColumn::new(id.clone(), title));
        self.commit(RenderScope::ColumnOrder);
        Ok(id)
    }

    /// Remove a column and every task in it.
    pub fn delete_column(&mut self, column_id: &str) -> Result<KanbanColumn, BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let removed = self.board.columns.remove(index);
        self.commit(RenderScope::ColumnOrder);
        Ok(removed)
    }

    /// Deep-copy a column right after the original. Every copied task gets a
    /// fresh id. Returns the new column id.
    pub fn duplicate_column(&mut self, column_id: &str) -> Result<String, BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let mut taken = self.board.collect_ids();
        let mut copy = self.board.columns[index].clone();
        copy.id = identity::new_column_id(&taken);
        taken.insert(copy.id.clone());
        for task in &mut copy.tasks {
            task.id = identity::new_task_id(&taken);
            taken.insert(task.id.clone());
        }
        let id = copy.id.clone();
        self.board.columns.insert(index + 1, copy);
        self.commit(RenderScope::ColumnOrder);
        Ok(id)
    }

    /// Move a column so that it ends up at `to_index` (clamped).
    pub fn move_column(&mut self, column_id: &str, to_index: usize) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let from = self.column_position(column_id)?;
        let to = to_index.min(self.board.columns.len() - 1);
        if from == to {
            return Ok(());
        }
        let column = self.board.columns.remove(from);
        self.board.columns.insert(to, column);
        self.commit(RenderScope::ColumnOrder);
        Ok(())
    }

    /// Move a column to an insertion point computed against the current
    /// layout, which still contains the dragged column.
    pub fn move_column_to(&mut self, column_id: &str, at: InsertionPoint) -> Result<(), BoardError> {
        let from = self.column_position(column_id)?;
        let mut to = at.to_index(self.board.columns.len());
        if to > from {
            to -= 1;
        }
        self.move_column(column_id, to)
    }

    /// Set a column's editable title. For include-mode columns this is the
    /// clean title; the include markers are kept.
    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let column = &mut self.board.columns[index];
        column.title = if column.include.include_mode {
            include::retitle(&mut column.include, title)
        } else {
            title.to_string()
        };
        self.commit(RenderScope::Column(column_id.to_string()));
        Ok(())
    }

    /// Toggle a user tag on a column title. Returns whether the tag is now set.
    pub fn toggle_column_tag(&mut self, column_id: &str, tag: &str) -> Result<bool, BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let column = &mut self.board.columns[index];
        let active = if column.include.include_mode {
            let toggled = tags::toggle_tag(&include::clean_title(&column.title, &column.include), tag);
            column.title = include::retitle(&mut column.include, &toggled);
            tags::has_tag(&toggled, tag)
        } else {
            column.title = tags::toggle_tag(&column.title, tag);
            tags::has_tag(&column.title, tag)
        };
        self.commit(RenderScope::Column(column_id.to_string()));
        Ok(active)
    }

    pub fn set_column_include(&mut self, column_id: &str, files: Vec<String>) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let column = &mut self.board.columns[index];
        column.title = include::enable(&column.title, &mut column.include, files);
        self.commit(RenderScope::Column(column_id.to_string()));
        Ok(())
    }

    pub fn clear_column_include(&mut self, column_id: &str) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let index = self.column_position(column_id)?;
        let column = &mut self.board.columns[index];
        column.title = include::disable(&column.title, &mut column.include);
        self.commit(RenderScope::Column(column_id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use std::time::Duration;

    fn column_ids(cache: &BoardCache) -> Vec<&str> {
        cache.board().columns.iter().map(|c| c.id.as_str()).collect()
    }

    fn three_columns() -> BoardCache {
        make_cache(make_board(vec![
            ("col-a", "A", vec![make_task("task-1", "One")]),
            ("col-b", "B", vec![]),
            ("col-c", "C", vec![]),
        ]))
    }

    #[test]
    fn test_add_column_at_index() {
        let mut cache = three_columns();
        let id = cache
            .add_column("New", InsertionPoint::Index(1), Instant::now())
            .unwrap();
        assert_eq!(column_ids(&cache), vec!["col-a", id.as_str(), "col-b", "col-c"]);
        assert_eq!(cache.board().columns[1].title, "New");
        assert!(cache.is_dirty());
    }

    #[test]
    fn test_add_column_empty_title_kept_empty() {
        let mut cache = three_columns();
        let id = cache.add_column("", InsertionPoint::Append, Instant::now()).unwrap();
        assert_eq!(cache.board().find_column(&id).unwrap().title, "");
    }

    #[test]
    fn test_add_column_double_fire_suppressed() {
        let mut cache = three_columns();
        let t0 = Instant::now();
        cache.add_column("Ideas", InsertionPoint::Append, t0).unwrap();
        let second = cache.add_column("Ideas", InsertionPoint::Append, t0 + Duration::from_millis(200));
        assert!(matches!(second, Err(BoardError::DuplicateSuppressed(_))));
        assert_eq!(cache.board().columns.len(), 4);
        cache
            .add_column("Ideas", InsertionPoint::Append, t0 + Duration::from_secs(3))
            .unwrap();
        assert_eq!(cache.board().columns.len(), 5);
    }

    #[test]
    fn test_delete_column() {
        let mut cache = three_columns();
        let removed = cache.delete_column("col-a").unwrap();
        assert_eq!(removed.tasks.len(), 1);
        assert_eq!(column_ids(&cache), vec!["col-b", "col-c"]);
        assert_eq!(
            cache.delete_column("col-a").unwrap_err(),
            BoardError::ColumnNotFound("col-a".to_string())
        );
    }

    #[test]
    fn test_duplicate_column_gets_fresh_ids() {
        let mut cache = three_columns();
        let id = cache.duplicate_column("col-a").unwrap();
        let board = cache.board();
        assert_eq!(board.columns[1].id, id);
        assert_eq!(board.columns[1].title, "A");
        assert_eq!(board.columns[1].tasks[0].title, "One");
        assert_ne!(board.columns[1].tasks[0].id, "task-1");
        assert_eq!(board.collect_ids().len(), 6);
    }

    #[test]
    fn test_move_column() {
        let mut cache = three_columns();
        cache.move_column("col-a", 2).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-b", "col-c", "col-a"]);
        cache.move_column("col-a", 99).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-b", "col-c", "col-a"]);
        cache.move_column("col-a", 0).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-a", "col-b", "col-c"]);
    }

    #[test]
    fn test_move_column_to_insertion_point() {
        let mut cache = three_columns();
        // Dropped before col-c while dragging col-a: lands between b and c.
        cache.move_column_to("col-a", InsertionPoint::Index(2)).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-b", "col-a", "col-c"]);
        cache.move_column_to("col-c", InsertionPoint::Index(0)).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-c", "col-b", "col-a"]);
        cache.move_column_to("col-c", InsertionPoint::Append).unwrap();
        assert_eq!(column_ids(&cache), vec!["col-b", "col-a", "col-c"]);
    }

    #[test]
    fn test_toggle_column_tag_keeps_row_directive_last() {
        let mut cache = make_cache(make_board(vec![("col-a", "Backlog #row2", vec![])]));
        assert!(cache.toggle_column_tag("col-a", "urgent").unwrap());
        assert_eq!(cache.board().columns[0].title, "Backlog #urgent #row2");
        assert!(!cache.toggle_column_tag("col-a", "#urgent").unwrap());
        assert_eq!(cache.board().columns[0].title, "Backlog #row2");
    }

    #[test]
    fn test_include_mode_column_round_trip() {
        let mut cache = make_cache(make_board(vec![("col-a", "Reading", vec![])]));
        cache
            .set_column_include("col-a", vec!["lists/books.md".to_string()])
            .unwrap();
        assert_eq!(cache.board().columns[0].title, "!!!include(lists/books.md)!!! Reading");

        cache.rename_column("col-a", "Books").unwrap();
        assert_eq!(cache.board().columns[0].title, "!!!include(lists/books.md)!!! Books");

        cache.toggle_column_tag("col-a", "done").unwrap();
        assert_eq!(
            cache.board().columns[0].include.original_title.as_deref(),
            Some("Books #done")
        );

        cache.clear_column_include("col-a").unwrap();
        let column = &cache.board().columns[0];
        assert_eq!(column.title, "Books #done");
        assert!(!column.include.include_mode);
    }
}

use std::time::Instant;

use super::{BoardCache, RenderScope};
use crate::command::{Direction, TaskField};
use crate::error::BoardError;
use crate::identity;
use crate::include;
use crate::position::InsertionPoint;
use crate::tags;
use crate::types::{KanbanTask, TaskLocation};

impl BoardCache {
    /// Create a task in `column_id` at `at`. Returns the new task id.
    pub fn add_task(
        &mut self,
        column_id: &str,
        title: &str,
        description: &str,
        at: InsertionPoint,
        now: Instant,
    ) -> Result<String, BoardError> {
        self.ensure_valid()?;
        let column_index = self.column_position(column_id)?;
        self.admit_creation(&["task", column_id, title, description], now)?;
        let id = identity::new_task_id(&self.board.collect_ids());
        let tasks = &mut self.board.columns[column_index].tasks;
        let task_index = at.to_index(tasks.len());
        tasks.insert(task_index, KanbanTask::new(id.clone(), title, description));
        self.commit_task(TaskLocation {
            column_index,
            task_index,
        });
        Ok(id)
    }

    /// Remove a task wherever it currently is; `column_hint` may be stale.
    pub fn delete_task(&mut self, task_id: &str, column_hint: Option<&str>) -> Result<KanbanTask, BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let column = &mut self.board.columns[loc.column_index];
        let removed = column.tasks.remove(loc.task_index);
        let column_id = column.id.clone();
        self.commit(RenderScope::Column(column_id));
        Ok(removed)
    }

    /// Copy a task directly below the original. Returns the copy's id.
    pub fn duplicate_task(&mut self, task_id: &str, column_hint: Option<&str>) -> Result<String, BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let mut copy = self.board.columns[loc.column_index].tasks[loc.task_index].clone();
        copy.id = identity::new_task_id(&self.board.collect_ids());
        let id = copy.id.clone();
        let target = TaskLocation {
            column_index: loc.column_index,
            task_index: loc.task_index + 1,
        };
        self.board.columns[loc.column_index].tasks.insert(target.task_index, copy);
        self.commit_task(target);
        Ok(id)
    }

    /// Move a task to `to_column` at an insertion point computed against the
    /// current layout (which still contains the dragged task).
    ///
    /// The target is validated before anything is removed, so a failed move
    /// leaves the board untouched.
    pub fn move_task(
        &mut self,
        task_id: &str,
        column_hint: Option<&str>,
        to_column: &str,
        at: InsertionPoint,
    ) -> Result<TaskLocation, BoardError> {
        self.ensure_valid()?;
        let from = self.task_position(task_id, column_hint)?;
        let to_column_index = self.column_position(to_column)?;

        let mut to_index = at.to_index(self.board.columns[to_column_index].tasks.len());
        if to_column_index == from.column_index && to_index > from.task_index {
            to_index -= 1;
        }
        let target = TaskLocation {
            column_index: to_column_index,
            task_index: to_index,
        };
        if target == from {
            return Ok(from);
        }

        let task = self.board.columns[from.column_index].tasks.remove(from.task_index);
        self.board.columns[to_column_index].tasks.insert(to_index, task);

        if from.column_index == to_column_index {
            self.commit(RenderScope::Column(to_column.to_string()));
        } else {
            let source_id = self.board.columns[from.column_index].id.clone();
            self.commit(RenderScope::Column(source_id));
            if let Some(sink) = self.sink.as_mut() {
                sink.render(&self.board, RenderScope::Column(to_column.to_string()));
            }
        }
        Ok(target)
    }

    /// Move a task within its column. Returns false when already at the
    /// boundary in that direction; there is no wraparound.
    pub fn move_task_direction(
        &mut self,
        task_id: &str,
        column_hint: Option<&str>,
        direction: Direction,
    ) -> Result<bool, BoardError> {
        self.ensure_valid()?;
        let from = self.task_position(task_id, column_hint)?;
        let last = self.board.columns[from.column_index].tasks.len() - 1;
        let to = match direction {
            Direction::Top => 0,
            Direction::Up => from.task_index.saturating_sub(1),
            Direction::Down => (from.task_index + 1).min(last),
            Direction::Bottom => last,
        };
        if to == from.task_index {
            return Ok(false);
        }
        let column = &mut self.board.columns[from.column_index];
        let task = column.tasks.remove(from.task_index);
        column.tasks.insert(to, task);
        let column_id = column.id.clone();
        self.commit(RenderScope::Column(column_id));
        Ok(true)
    }

    /// Move a task to the end of another column.
    pub fn move_task_to_column(
        &mut self,
        task_id: &str,
        column_hint: Option<&str>,
        to_column: &str,
    ) -> Result<TaskLocation, BoardError> {
        self.move_task(task_id, column_hint, to_column, InsertionPoint::Append)
    }

    /// Set a task's title or description. For include-mode tasks the title
    /// is the clean title and the include markers are kept.
    pub fn edit_task(
        &mut self,
        task_id: &str,
        column_hint: Option<&str>,
        field: TaskField,
        value: &str,
    ) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let task = self.board.task_mut_at(loc);
        match field {
            TaskField::Title if task.include.include_mode => {
                task.title = include::retitle(&mut task.include, value);
            }
            TaskField::Title => task.title = value.to_string(),
            TaskField::Description => task.description = value.to_string(),
        }
        self.commit_task(loc);
        Ok(())
    }

    /// Toggle a user tag on a task title. Returns whether the tag is now set.
    pub fn toggle_task_tag(&mut self, task_id: &str, column_hint: Option<&str>, tag: &str) -> Result<bool, BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let task = self.board.task_mut_at(loc);
        let active = if task.include.include_mode {
            let toggled = tags::toggle_tag(&include::clean_title(&task.title, &task.include), tag);
            task.title = include::retitle(&mut task.include, &toggled);
            tags::has_tag(&toggled, tag)
        } else {
            task.title = tags::toggle_tag(&task.title, tag);
            tags::has_tag(&task.title, tag)
        };
        self.commit_task(loc);
        Ok(active)
    }

    pub fn set_task_include(
        &mut self,
        task_id: &str,
        column_hint: Option<&str>,
        files: Vec<String>,
    ) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let task = self.board.task_mut_at(loc);
        task.title = include::enable(&task.title, &mut task.include, files);
        self.commit_task(loc);
        Ok(())
    }

    pub fn clear_task_include(&mut self, task_id: &str, column_hint: Option<&str>) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let loc = self.task_position(task_id, column_hint)?;
        let task = self.board.task_mut_at(loc);
        task.title = include::disable(&task.title, &mut task.include);
        self.commit_task(loc);
        Ok(())
    }
}

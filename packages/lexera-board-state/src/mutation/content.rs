use serde::{Deserialize, Serialize};

use super::{BoardCache, RenderScope};
use crate::command::{FieldRef, TaskField};
use crate::error::BoardError;
use crate::include;
use crate::types::KanbanBoard;

/// One asset path rewrite reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    pub from: String,
    pub to: String,
}

/// Markdown link for a file path; image files get an image link.
pub fn link_markdown(path: &str, is_image: bool) -> String {
    let name = path
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path);
    let target = include::encode_include_path(path);
    if is_image {
        format!("![{}]({})", name, target)
    } else {
        format!("[{}]({})", name, target)
    }
}

pub(crate) fn append_field_text(existing: &str, addition: &str, single_line: bool) -> String {
    if existing.is_empty() {
        addition.to_string()
    } else if single_line {
        format!("{} {}", existing.trim_end(), addition)
    } else {
        format!("{}\n{}", existing.trim_end_matches('\n'), addition)
    }
}

/// Rewrite asset paths in every task title and description, in both their
/// plain and percent-encoded forms. Returns the number of fields changed.
pub(crate) fn remap_paths(board: &mut KanbanBoard, mappings: &[PathMapping]) -> usize {
    let mut changed = 0;
    let mut rewrite = |text: &mut String| {
        let mut updated = text.clone();
        for m in mappings {
            updated = updated.replace(&m.from, &m.to);
            let (from_enc, to_enc) = (
                include::encode_include_path(&m.from),
                include::encode_include_path(&m.to),
            );
            if from_enc != m.from {
                updated = updated.replace(&from_enc, &to_enc);
            }
        }
        if updated != *text {
            *text = updated;
            changed += 1;
        }
    };
    for column in &mut board.columns {
        for task in &mut column.tasks {
            rewrite(&mut task.title);
            rewrite(&mut task.description);
            if let Some(original) = task.include.original_title.as_mut() {
                rewrite(original);
            }
        }
    }
    changed
}

impl BoardCache {
    /// Current editable text of a field. Include-mode titles yield the clean
    /// title.
    pub fn field_text(&self, field: &FieldRef) -> Result<String, BoardError> {
        match field {
            FieldRef::ColumnTitle { column_id } => {
                let column = self
                    .board
                    .find_column(column_id)
                    .ok_or_else(|| BoardError::ColumnNotFound(column_id.clone()))?;
                Ok(include::clean_title(&column.title, &column.include))
            }
            FieldRef::TaskTitle { column_id, task_id } | FieldRef::TaskDescription { column_id, task_id } => {
                let loc = self.task_position(task_id, Some(column_id))?;
                let task = &self.board.columns[loc.column_index].tasks[loc.task_index];
                Ok(match field {
                    FieldRef::TaskDescription { .. } => task.description.clone(),
                    _ => include::clean_title(&task.title, &task.include),
                })
            }
        }
    }

    /// Write a field's editable text.
    pub fn set_field(&mut self, field: &FieldRef, value: &str) -> Result<(), BoardError> {
        match field {
            FieldRef::ColumnTitle { column_id } => self.rename_column(column_id, value),
            FieldRef::TaskTitle { column_id, task_id } => {
                self.edit_task(task_id, Some(column_id), TaskField::Title, value)
            }
            FieldRef::TaskDescription { column_id, task_id } => {
                self.edit_task(task_id, Some(column_id), TaskField::Description, value)
            }
        }
    }

    /// Append a link to a field: space-separated on titles, on its own line
    /// in descriptions.
    pub fn insert_link(&mut self, field: &FieldRef, link: &str) -> Result<(), BoardError> {
        self.ensure_valid()?;
        let current = self.field_text(field)?;
        let updated = append_field_text(&current, link, field.is_single_line());
        self.set_field(field, &updated)
    }

    /// Apply host-reported asset path rewrites to the cache.
    pub fn apply_path_remap(&mut self, mappings: &[PathMapping]) -> Result<usize, BoardError> {
        self.ensure_valid()?;
        let changed = remap_paths(&mut self.board, mappings);
        if changed > 0 {
            self.commit(RenderScope::Board);
        }
        Ok(changed)
    }
}

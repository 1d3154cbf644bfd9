/// Snapshot-vs-cache diff.
///
/// Compares the last-saved snapshot with the live cache by id and produces
/// the ordered change-set sent with a save. Tasks are matched across all
/// columns, so a task moved between columns is a move and not a
/// delete-plus-add.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::KanbanBoard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTitleChange {
    pub column_id: String,
    pub old_title: String,
    pub new_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContentChange {
    pub task_id: String,
    pub column_id: String,
    pub old_title: String,
    pub new_title: String,
    pub old_description: String,
    pub new_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMove {
    pub task_id: String,
    pub from_column: String,
    pub to_column: String,
    pub old_index: usize,
    pub new_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeletion {
    pub task_id: String,
    pub column_id: String,
}

/// A task created since the last save. Reported for completeness only; the
/// save request carries the full board, which is what persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub task_id: String,
    pub column_id: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub column_title_changes: Vec<ColumnTitleChange>,
    pub task_content_changes: Vec<TaskContentChange>,
    pub task_moves: Vec<TaskMove>,
    pub task_deletions: Vec<TaskDeletion>,
    pub column_order_changed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_deletions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_tasks: Vec<NewTask>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.column_order_changed
            && self.column_title_changes.is_empty()
            && self.task_content_changes.is_empty()
            && self.task_moves.is_empty()
            && self.task_deletions.is_empty()
            && self.column_deletions.is_empty()
            && self.new_tasks.is_empty()
    }

    /// Number of individual changes, counting a column reorder as one.
    pub fn len(&self) -> usize {
        usize::from(self.column_order_changed)
            + self.column_title_changes.len()
            + self.task_content_changes.len()
            + self.task_moves.len()
            + self.task_deletions.len()
            + self.column_deletions.len()
            + self.new_tasks.len()
    }
}

/// Where a task sat in the snapshot.
#[derive(Debug, Clone)]
struct TaskSnapshot<'a> {
    column_id: &'a str,
    position: usize,
    title: &'a str,
    description: &'a str,
}

fn snapshot_tasks(board: &KanbanBoard) -> HashMap<&str, TaskSnapshot<'_>> {
    let mut map = HashMap::new();
    for col in &board.columns {
        for (position, task) in col.tasks.iter().enumerate() {
            map.insert(
                task.id.as_str(),
                TaskSnapshot {
                    column_id: &col.id,
                    position,
                    title: &task.title,
                    description: &task.description,
                },
            );
        }
    }
    map
}

/// Compute the change-set that takes `snapshot` to `cache`.
pub fn reconcile(snapshot: &KanbanBoard, cache: &KanbanBoard) -> ChangeSet {
    let old_tasks = snapshot_tasks(snapshot);
    let mut changes = ChangeSet {
        column_order_changed: !snapshot
            .columns
            .iter()
            .map(|c| &c.id)
            .eq(cache.columns.iter().map(|c| &c.id)),
        ..ChangeSet::default()
    };

    // Deletions, in snapshot order.
    let live_ids: HashSet<&str> = cache
        .columns
        .iter()
        .flat_map(|c| c.tasks.iter().map(|t| t.id.as_str()))
        .collect();
    for col in &snapshot.columns {
        if cache.find_column(&col.id).is_none() {
            changes.column_deletions.push(col.id.clone());
        }
        for task in &col.tasks {
            if !live_ids.contains(task.id.as_str()) {
                changes.task_deletions.push(TaskDeletion {
                    task_id: task.id.clone(),
                    column_id: col.id.clone(),
                });
            }
        }
    }

    for col in &cache.columns {
        if let Some(old_col) = snapshot.find_column(&col.id) {
            if old_col.title != col.title {
                changes.column_title_changes.push(ColumnTitleChange {
                    column_id: col.id.clone(),
                    old_title: old_col.title.clone(),
                    new_title: col.title.clone(),
                });
            }
        }

        for (index, task) in col.tasks.iter().enumerate() {
            let Some(old) = old_tasks.get(task.id.as_str()) else {
                changes.new_tasks.push(NewTask {
                    task_id: task.id.clone(),
                    column_id: col.id.clone(),
                    index,
                });
                continue;
            };
            if old.column_id != col.id || old.position != index {
                changes.task_moves.push(TaskMove {
                    task_id: task.id.clone(),
                    from_column: old.column_id.to_string(),
                    to_column: col.id.clone(),
                    old_index: old.position,
                    new_index: index,
                });
            }
            if old.title != task.title || old.description != task.description {
                changes.task_content_changes.push(TaskContentChange {
                    task_id: task.id.clone(),
                    column_id: col.id.clone(),
                    old_title: old.title.to_string(),
                    new_title: task.title.clone(),
                    old_description: old.description.to_string(),
                    new_description: task.description.clone(),
                });
            }
        }
    }

    changes
}

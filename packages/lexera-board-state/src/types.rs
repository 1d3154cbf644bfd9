use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Include-mode metadata shared by columns and tasks.
///
/// When `include_mode` is set, the item's content is sourced from the listed
/// files. `original_title` holds the clean, user-editable title; the stored
/// `title` is that clean title plus the include markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeInfo {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_mode: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
}

impl IncludeInfo {
    pub fn is_active(&self) -> bool {
        self.include_mode && !self.include_files.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub include: IncludeInfo,
}

impl KanbanTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            include: IncludeInfo::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<KanbanTask>,
    #[serde(flatten)]
    pub include: IncludeInfo,
}

impl KanbanColumn {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tasks: Vec::new(),
            include: IncludeInfo::default(),
        }
    }

    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}

/// The in-memory board document: ordered columns of ordered tasks.
///
/// Ordering is purely positional. There is no stored index field, so every
/// splice renumbers siblings implicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanBoard {
    pub valid: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub columns: Vec<KanbanColumn>,
}

/// Where a task currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLocation {
    pub column_index: usize,
    pub task_index: usize,
}

impl KanbanBoard {
    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    pub fn find_column(&self, column_id: &str) -> Option<&KanbanColumn> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// Locate a task, trying the hinted column first and then every column.
    ///
    /// The hint may be stale (a drag or reorder can move the task between menu
    /// construction and the click), so it is only a fast path.
    pub fn locate_task(&self, task_id: &str, column_hint: Option<&str>) -> Option<TaskLocation> {
        if let Some(hint) = column_hint {
            if let Some(column_index) = self.column_index(hint) {
                if let Some(task_index) = self.columns[column_index].task_index(task_id) {
                    return Some(TaskLocation {
                        column_index,
                        task_index,
                    });
                }
            }
        }
        self.columns
            .iter()
            .enumerate()
            .find_map(|(column_index, col)| {
                col.task_index(task_id).map(|task_index| TaskLocation {
                    column_index,
                    task_index,
                })
            })
    }

    pub fn find_task(&self, task_id: &str) -> Option<(&KanbanColumn, &KanbanTask)> {
        let loc = self.locate_task(task_id, None)?;
        let col = &self.columns[loc.column_index];
        Some((col, &col.tasks[loc.task_index]))
    }

    pub fn task_mut_at(&mut self, loc: TaskLocation) -> &mut KanbanTask {
        &mut self.columns[loc.column_index].tasks[loc.task_index]
    }

    /// All column and task ids currently on the board.
    pub fn collect_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for col in &self.columns {
            ids.insert(col.id.clone());
            for task in &col.tasks {
                ids.insert(task.id.clone());
            }
        }
        ids
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_board() -> KanbanBoard {
        let mut todo = KanbanColumn::new("col-a", "Todo");
        todo.tasks.push(KanbanTask::new("task-1", "One", ""));
        todo.tasks.push(KanbanTask::new("task-2", "Two", ""));
        let mut done = KanbanColumn::new("col-b", "Done");
        done.tasks.push(KanbanTask::new("task-3", "Three", "desc"));
        KanbanBoard {
            valid: true,
            title: "Board".to_string(),
            columns: vec![todo, done],
        }
    }

    #[test]
    fn test_locate_task_with_correct_hint() {
        let board = make_board();
        let loc = board.locate_task("task-2", Some("col-a")).unwrap();
        assert_eq!(loc.column_index, 0);
        assert_eq!(loc.task_index, 1);
    }

    #[test]
    fn test_locate_task_falls_back_on_stale_hint() {
        let board = make_board();
        let loc = board.locate_task("task-3", Some("col-a")).unwrap();
        assert_eq!(loc.column_index, 1);
        assert_eq!(loc.task_index, 0);

        let loc = board.locate_task("task-1", Some("col-missing")).unwrap();
        assert_eq!(loc.column_index, 0);
    }

    #[test]
    fn test_locate_missing_task() {
        let board = make_board();
        assert!(board.locate_task("task-9", None).is_none());
    }

    #[test]
    fn test_collect_ids() {
        let board = make_board();
        let ids = board.collect_ids();
        assert_eq!(ids.len(), 5);
        assert!(ids.contains("col-b"));
        assert!(ids.contains("task-3"));
        assert_eq!(board.task_count(), 3);
    }

    #[test]
    fn test_include_metadata_serializes_flat_camel_case() {
        let mut task = KanbanTask::new("task-1", "!!!include(a.md)!!! Notes", "");
        task.include = IncludeInfo {
            include_mode: true,
            include_files: vec!["a.md".to_string()],
            original_title: Some("Notes".to_string()),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["includeMode"], true);
        assert_eq!(json["includeFiles"][0], "a.md");
        assert_eq!(json["originalTitle"], "Notes");

        let plain = serde_json::to_value(KanbanTask::new("task-2", "x", "")).unwrap();
        assert!(plain.get("includeMode").is_none());
    }

    #[test]
    fn test_board_deserializes_with_defaults() {
        let board: KanbanBoard = serde_json::from_str(
            r#"{"valid":true,"columns":[{"id":"col-1","title":"Todo","tasks":[{"id":"task-1","title":"A"}]}]}"#,
        )
        .unwrap();
        assert!(board.valid);
        assert_eq!(board.columns[0].tasks[0].description, "");
        assert!(!board.columns[0].include.include_mode);
    }
}

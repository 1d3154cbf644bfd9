/// Typed board commands.
///
/// Every menu item, key binding, and host request that changes the board is
/// one `Command` variant, dispatched through a single exhaustive match in
/// [`crate::session::BoardSession::dispatch`].
use serde::{Deserialize, Serialize};

use crate::position::InsertionPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Top,
    Up,
    Down,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    Title,
    Description,
}

/// A reference to one editable text field on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum FieldRef {
    #[serde(rename_all = "camelCase")]
    ColumnTitle { column_id: String },
    #[serde(rename_all = "camelCase")]
    TaskTitle { column_id: String, task_id: String },
    #[serde(rename_all = "camelCase")]
    TaskDescription { column_id: String, task_id: String },
}

impl FieldRef {
    pub fn task(column_id: &str, task_id: &str, field: TaskField) -> Self {
        let (column_id, task_id) = (column_id.to_string(), task_id.to_string());
        match field {
            TaskField::Title => FieldRef::TaskTitle { column_id, task_id },
            TaskField::Description => FieldRef::TaskDescription { column_id, task_id },
        }
    }

    pub fn column_id(&self) -> &str {
        match self {
            FieldRef::ColumnTitle { column_id }
            | FieldRef::TaskTitle { column_id, .. }
            | FieldRef::TaskDescription { column_id, .. } => column_id,
        }
    }

    /// Title fields commit on Enter; descriptions are multi-line.
    pub fn is_single_line(&self) -> bool {
        !matches!(self, FieldRef::TaskDescription { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    AddColumn { title: String, at: InsertionPoint },
    #[serde(rename_all = "camelCase")]
    DeleteColumn { column_id: String },
    #[serde(rename_all = "camelCase")]
    DuplicateColumn { column_id: String },
    #[serde(rename_all = "camelCase")]
    MoveColumn { column_id: String, to_index: usize },
    /// Drag reorder; `at` is resolved against the layout that still
    /// contains the dragged column.
    #[serde(rename_all = "camelCase")]
    DropColumn { column_id: String, at: InsertionPoint },
    #[serde(rename_all = "camelCase")]
    RenameColumn { column_id: String, title: String },
    #[serde(rename_all = "camelCase")]
    ToggleColumnTag { column_id: String, tag: String },
    #[serde(rename_all = "camelCase")]
    SetColumnInclude { column_id: String, files: Vec<String> },
    #[serde(rename_all = "camelCase")]
    ClearColumnInclude { column_id: String },
    #[serde(rename_all = "camelCase")]
    AddTask {
        column_id: String,
        title: String,
        #[serde(default)]
        description: String,
        at: InsertionPoint,
    },
    #[serde(rename_all = "camelCase")]
    DeleteTask { task_id: String, column_id: String },
    #[serde(rename_all = "camelCase")]
    DuplicateTask { task_id: String, column_id: String },
    #[serde(rename_all = "camelCase")]
    MoveTask {
        task_id: String,
        column_id: String,
        direction: Direction,
    },
    #[serde(rename_all = "camelCase")]
    MoveTaskToColumn {
        task_id: String,
        column_id: String,
        to_column_id: String,
    },
    #[serde(rename_all = "camelCase")]
    DropTask {
        task_id: String,
        column_id: String,
        to_column_id: String,
        at: InsertionPoint,
    },
    #[serde(rename_all = "camelCase")]
    EditTask {
        task_id: String,
        column_id: String,
        field: TaskField,
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    ToggleTaskTag {
        task_id: String,
        column_id: String,
        tag: String,
    },
    #[serde(rename_all = "camelCase")]
    SetTaskInclude {
        task_id: String,
        column_id: String,
        files: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ClearTaskInclude { task_id: String, column_id: String },
    Save,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let cmd = Command::MoveTask {
            task_id: "task-1".to_string(),
            column_id: "col-1".to_string(),
            direction: Direction::Top,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["action"], "moveTask");
        assert_eq!(json["taskId"], "task-1");
        assert_eq!(json["direction"], "top");
    }

    #[test]
    fn test_command_from_menu_payload() {
        let cmd: Command = serde_json::from_str(
            r#"{"action":"addTask","columnId":"col-1","title":"New","at":{"kind":"append"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::AddTask {
                column_id: "col-1".to_string(),
                title: "New".to_string(),
                description: String::new(),
                at: InsertionPoint::Append,
            }
        );
    }

    #[test]
    fn test_field_ref_helpers() {
        let field = FieldRef::task("col-1", "task-1", TaskField::Description);
        assert_eq!(field.column_id(), "col-1");
        assert!(!field.is_single_line());
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["field"], "taskDescription");
        assert_eq!(json["taskId"], "task-1");
    }
}

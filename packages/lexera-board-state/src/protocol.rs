/// Message envelopes exchanged with the host process.
///
/// Both directions are internally tagged JSON objects (`{"type": ..., ...}`).
/// The host pushes whole boards and status; the board state layer reports
/// edits, save requests, and user-facing status.
use serde::{Deserialize, Serialize};

use crate::command::{Command, FieldRef};
use crate::mutation::PathMapping;
use crate::reconcile::ChangeSet;
use crate::types::KanbanBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveFailureKind {
    /// The document was locked or mid-edit; trying again shortly may work.
    Busy,
    Timeout,
    /// The backing document changed underneath us.
    Conflict,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl SaveFailureKind {
    pub fn is_recoverable(self) -> bool {
        matches!(self, SaveFailureKind::Busy | SaveFailureKind::Timeout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
}

/// Messages sent from the host to the board state layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    #[serde(rename_all = "camelCase")]
    BoardUpdate {
        board: KanbanBoard,
        #[serde(default)]
        path_remap: Vec<PathMapping>,
    },
    #[serde(rename_all = "camelCase")]
    FileInfo { info: FileInfo },
    #[serde(rename_all = "camelCase")]
    UndoRedoState { can_undo: bool, can_redo: bool },
    #[serde(rename_all = "camelCase")]
    InsertLink {
        target: FieldRef,
        relative_path: String,
        #[serde(default)]
        is_image: bool,
    },
    #[serde(rename_all = "camelCase")]
    PathRemap { mappings: Vec<PathMapping> },
    #[serde(rename_all = "camelCase")]
    SaveResult {
        request_id: u64,
        success: bool,
        #[serde(default)]
        failure: Option<SaveFailureKind>,
        #[serde(default)]
        message: String,
    },
    Command { command: Command },
}

/// Messages sent from the board state layer to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// A structural or content edit was applied to the cache.
    #[serde(rename_all = "camelCase")]
    EditApplied {
        command: Command,
        #[serde(skip_serializing_if = "Option::is_none")]
        created_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TagToggled {
        target: FieldRef,
        tag: String,
        active: bool,
    },
    #[serde(rename_all = "camelCase")]
    SaveBoard {
        request_id: u64,
        board: KanbanBoard,
        changes: ChangeSet,
        requested_at_ms: i64,
    },
    #[serde(rename_all = "camelCase")]
    UnsavedChanges { has_changes: bool },
    #[serde(rename_all = "camelCase")]
    SaveFailed { message: String, retrying: bool },
    #[serde(rename_all = "camelCase")]
    Status { level: StatusLevel, message: String },
    InitializeBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

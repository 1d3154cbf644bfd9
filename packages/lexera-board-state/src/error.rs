use crate::protocol::SaveFailureKind;

/// Errors raised by structural and content operations on the board cache.
///
/// None of these are fatal: the session logs them and treats the operation
/// as a no-op, since ids can go stale between menu construction and click.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Board is not a valid kanban board")]
    InvalidBoard,

    #[error("Duplicate creation suppressed: {0:?}")]
    DuplicateSuppressed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("No save is pending")]
    NothingPending,

    #[error("Save rejected ({kind:?}): {message}")]
    Rejected {
        kind: SaveFailureKind,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

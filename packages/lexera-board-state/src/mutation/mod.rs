//! The board cache and the only code allowed to mutate it.
//!
//! Every structural or content change resolves its target ids (falling back
//! to a whole-board search when the parent hint is stale), validates the
//! whole change, then splices it in one step. A successful change marks the
//! cache dirty, bumps the revision, and asks the render sink for a localized
//! update.

mod column_ops;
mod content;
mod task_ops;

pub use content::{link_markdown, PathMapping};
pub(crate) use content::{append_field_text, remap_paths};

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use unicode_normalization::UnicodeNormalization;

use crate::error::BoardError;
use crate::types::{KanbanBoard, TaskLocation};

/// Which part of the board needs redrawing after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderScope {
    Task { column_id: String, task_id: String },
    Column(String),
    ColumnOrder,
    Board,
}

/// Receives localized redraw requests. Implemented by the view layer.
pub trait RenderSink {
    fn render(&mut self, board: &KanbanBoard, scope: RenderScope);
}

/// Suppresses textually identical creation requests that arrive within a
/// short window of each other, such as a double-fired input event.
#[derive(Debug)]
struct DuplicateGuard {
    window: Duration,
    recent: VecDeque<(String, Instant)>,
}

impl DuplicateGuard {
    fn new(window: Duration) -> Self {
        Self {
            window,
            recent: VecDeque::new(),
        }
    }

    fn key(parts: &[&str]) -> String {
        parts.join("\u{1f}").nfc().collect()
    }

    /// Returns false if `key` was already seen inside the window.
    fn admit(&mut self, key: String, now: Instant) -> bool {
        while let Some((_, at)) = self.recent.front() {
            if now.duration_since(*at) >= self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        if self.recent.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.recent.push_back((key, now));
        true
    }
}

pub struct BoardCache {
    board: KanbanBoard,
    dirty: bool,
    revision: u64,
    sink: Option<Box<dyn RenderSink>>,
    duplicates: DuplicateGuard,
}

impl BoardCache {
    pub fn new(board: KanbanBoard, duplicate_window: Duration) -> Self {
        Self {
            board,
            dirty: false,
            revision: 0,
            sink: None,
            duplicates: DuplicateGuard::new(duplicate_window),
        }
    }

    pub fn set_render_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sink = Some(sink);
    }

    pub fn board(&self) -> &KanbanBoard {
        &self.board
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Monotonic counter of applied mutations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole board with a fresh document from the host.
    /// The caller schedules the redraw; this does not render.
    pub fn replace(&mut self, board: KanbanBoard) {
        self.board = board;
        self.dirty = false;
        self.revision += 1;
    }

    /// Clear the dirty flag if nothing changed since `revision` was captured.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.dirty = false;
        }
        !self.dirty
    }

    pub fn render_all(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.render(&self.board, RenderScope::Board);
        }
    }

    fn ensure_valid(&self) -> Result<(), BoardError> {
        if self.board.valid {
            Ok(())
        } else {
            Err(BoardError::InvalidBoard)
        }
    }

    fn admit_creation(&mut self, parts: &[&str], now: Instant) -> Result<(), BoardError> {
        let key = DuplicateGuard::key(parts);
        if self.duplicates.admit(key, now) {
            Ok(())
        } else {
            log::debug!("[lexera.mutation.duplicate] Suppressed repeated creation");
            Err(BoardError::DuplicateSuppressed(parts.join(" / ")))
        }
    }

    fn column_position(&self, column_id: &str) -> Result<usize, BoardError> {
        self.board
            .column_index(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))
    }

    fn task_position(&self, task_id: &str, column_hint: Option<&str>) -> Result<TaskLocation, BoardError> {
        self.board
            .locate_task(task_id, column_hint)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))
    }

    /// Record an applied change.
    fn commit(&mut self, scope: RenderScope) {
        self.dirty = true;
        self.revision += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink.render(&self.board, scope);
        }
    }

    fn commit_task(&mut self, loc: TaskLocation) {
        let column = &self.board.columns[loc.column_index];
        let scope = RenderScope::Task {
            column_id: column.id.clone(),
            task_id: column.tasks[loc.task_index].id.clone(),
        };
        self.commit(scope);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_duplicate_guard_window() {
        let t0 = Instant::now();
        let mut guard = DuplicateGuard::new(Duration::from_secs(2));
        assert!(guard.admit("a".to_string(), t0));
        assert!(!guard.admit("a".to_string(), t0 + Duration::from_millis(1500)));
        assert!(guard.admit("b".to_string(), t0 + Duration::from_millis(1500)));
        assert!(guard.admit("a".to_string(), t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_duplicate_key_normalizes_unicode() {
        // "é" precomposed vs. "e" + combining acute accent
        assert_eq!(
            DuplicateGuard::key(&["col-1", "caf\u{e9}"]),
            DuplicateGuard::key(&["col-1", "cafe\u{301}"])
        );
    }

    #[test]
    fn test_replace_resets_dirty() {
        let mut cache = make_cache(make_board(vec![("col-a", "Todo", vec![])]));
        cache.rename_column("col-a", "Doing").unwrap();
        assert!(cache.is_dirty());
        cache.replace(make_board(vec![("col-b", "Fresh", vec![])]));
        assert!(!cache.is_dirty());
        assert_eq!(cache.board().columns[0].id, "col-b");
    }

    #[test]
    fn test_mark_saved_respects_later_mutations() {
        let mut cache = make_cache(make_board(vec![("col-a", "Todo", vec![])]));
        cache.rename_column("col-a", "One").unwrap();
        let captured = cache.revision();
        cache.rename_column("col-a", "Two").unwrap();
        assert!(!cache.mark_saved(captured));
        assert!(cache.is_dirty());
        assert!(cache.mark_saved(cache.revision()));
    }

    #[test]
    fn test_invalid_board_rejects_mutations() {
        let mut board = make_board(vec![("col-a", "Todo", vec![])]);
        board.valid = false;
        let mut cache = make_cache(board);
        assert_eq!(cache.rename_column("col-a", "X"), Err(BoardError::InvalidBoard));
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_sink_receives_localized_scopes() {
        let sink = RecordingSink::default();
        let mut cache = make_cache(make_board(vec![(
            "col-a",
            "Todo",
            vec![make_task("task-1", "One")],
        )]));
        cache.set_render_sink(Box::new(sink.clone()));
        cache.rename_column("col-a", "Doing").unwrap();
        cache
            .edit_task("task-1", Some("col-a"), crate::command::TaskField::Title, "Uno")
            .unwrap();
        assert_eq!(
            *sink.0.borrow(),
            vec![
                RenderScope::Column("col-a".to_string()),
                RenderScope::Task {
                    column_id: "col-a".to_string(),
                    task_id: "task-1".to_string()
                },
            ]
        );
    }
}

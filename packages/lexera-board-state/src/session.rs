//! One open board: the cache, save bookkeeping, transient UI state, and the
//! timers that drive them.
//!
//! All input arrives either as an [`InboundMessage`] from the host or as a
//! direct call from the view (edits, drags, drops). Everything the host needs
//! to know goes out through the outbox channel. Timers are deadlines checked
//! in [`BoardSession::tick`]; [`run_session`] sleeps until the next one.

use std::time::Instant;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::command::{Command, FieldRef, TaskField};
use crate::config::EditorConfig;
use crate::drag::{self, DragItem, DragTracker, Indicator};
use crate::drop::{self, DropKind, DropPayload, DroppedLink};
use crate::error::BoardError;
use crate::menu::{EditKey, EditOutcome, MenuController};
use crate::mutation::{link_markdown, remap_paths, BoardCache, PathMapping, RenderSink};
use crate::position::{self, ColumnLayout, InsertionPoint, Point};
use crate::protocol::{FileInfo, InboundMessage, OutboundMessage, SaveFailureKind, StatusLevel};
use crate::reconcile::{FailureOutcome, PendingSave, SaveState, SaveTracker};
use crate::schedule::{self, Debouncer, ReentrancyGuard};
use crate::types::KanbanBoard;

/// What a successfully applied command reports back to the host.
enum Applied {
    Edited { created_id: Option<String> },
    Tag { target: FieldRef, tag: String, active: bool },
    Save,
}

pub struct BoardSession {
    config: EditorConfig,
    cache: BoardCache,
    saves: SaveTracker,
    menu: MenuController,
    drag: DragTracker,
    render: Debouncer,
    drop_guard: ReentrancyGuard,
    outbox: UnboundedSender<OutboundMessage>,
    file_info: FileInfo,
    can_undo: bool,
    can_redo: bool,
    save_state: SaveState,
}

/// The command that sets `field` to `value`, for edit notifications.
fn field_command(field: &FieldRef, value: &str) -> Command {
    match field {
        FieldRef::ColumnTitle { column_id } => Command::RenameColumn {
            column_id: column_id.clone(),
            title: value.to_string(),
        },
        FieldRef::TaskTitle { column_id, task_id } => Command::EditTask {
            task_id: task_id.clone(),
            column_id: column_id.clone(),
            field: TaskField::Title,
            value: value.to_string(),
        },
        FieldRef::TaskDescription { column_id, task_id } => Command::EditTask {
            task_id: task_id.clone(),
            column_id: column_id.clone(),
            field: TaskField::Description,
            value: value.to_string(),
        },
    }
}

impl BoardSession {
    pub fn new(board: KanbanBoard, config: EditorConfig, outbox: UnboundedSender<OutboundMessage>) -> Self {
        let valid = board.valid;
        let session = Self {
            cache: BoardCache::new(board.clone(), config.duplicate_window()),
            saves: SaveTracker::new(board, config.save_retry_delay(), config.save_retry_max_age()),
            menu: MenuController::new(config.menu_close_delay(), config.menu_action_close_delay()),
            drag: DragTracker::new(),
            render: Debouncer::new(config.render_debounce()),
            drop_guard: ReentrancyGuard::new(config.drop_guard()),
            config,
            outbox,
            file_info: FileInfo::default(),
            can_undo: false,
            can_redo: false,
            save_state: SaveState::Saved,
        };
        if !valid {
            session.send(OutboundMessage::InitializeBoard);
        }
        session
    }

    pub fn set_render_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.cache.set_render_sink(sink);
    }

    pub fn board(&self) -> &KanbanBoard {
        self.cache.board()
    }

    pub fn cache(&self) -> &BoardCache {
        &self.cache
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    pub fn can_undo(&self) -> bool {
        self.can_undo
    }

    pub fn can_redo(&self) -> bool {
        self.can_redo
    }

    pub fn menu(&self) -> &MenuController {
        &self.menu
    }

    /// Pointer-level menu transitions that never touch the board.
    pub fn menu_mut(&mut self) -> &mut MenuController {
        &mut self.menu
    }

    pub fn drag_mut(&mut self) -> &mut DragTracker {
        &mut self.drag
    }

    fn send(&self, message: OutboundMessage) {
        if self.outbox.send(message).is_err() {
            log::warn!("[lexera.session] Outbox closed, dropping message");
        }
    }

    fn status(&self, level: StatusLevel, message: impl Into<String>) {
        self.send(OutboundMessage::Status {
            level,
            message: message.into(),
        });
    }

    /// Move to `state`, telling the host whenever the has-unsaved-changes
    /// flag flips.
    fn set_save_state(&mut self, state: SaveState) {
        let was_saved = self.save_state == SaveState::Saved;
        self.save_state = state;
        let is_saved = state == SaveState::Saved;
        if was_saved != is_saved {
            self.send(OutboundMessage::UnsavedChanges { has_changes: !is_saved });
        }
    }

    pub fn handle_message(&mut self, message: InboundMessage, now: Instant) {
        match message {
            InboundMessage::BoardUpdate { board, path_remap } => self.replace_board(board, &path_remap, now),
            InboundMessage::FileInfo { info } => {
                log::debug!("[lexera.session] File info: {}", info.file_name);
                self.file_info = info;
            }
            InboundMessage::UndoRedoState { can_undo, can_redo } => {
                self.can_undo = can_undo;
                self.can_redo = can_redo;
            }
            InboundMessage::InsertLink {
                target,
                relative_path,
                is_image,
            } => self.insert_link(target, &relative_path, is_image),
            InboundMessage::PathRemap { mappings } => {
                let before = self.cache.revision();
                match self.cache.apply_path_remap(&mappings) {
                    Ok(changed) if self.cache.revision() != before => {
                        log::info!("[lexera.session] Remapped paths in {} fields", changed);
                        self.set_save_state(SaveState::Unsaved);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("[lexera.session] Path remap ignored: {}", e),
                }
            }
            InboundMessage::SaveResult {
                request_id,
                success,
                failure,
                message,
            } => {
                if success {
                    self.save_succeeded(request_id);
                } else {
                    let kind = failure.unwrap_or(SaveFailureKind::Unknown);
                    self.save_failed(request_id, kind, &message, now);
                }
            }
            InboundMessage::Command { command } => {
                self.dispatch(command, now);
            }
        }
    }

    /// Swap in a fresh document from the host. The redraw is debounced so a
    /// burst of updates renders once.
    fn replace_board(&mut self, mut board: KanbanBoard, path_remap: &[PathMapping], now: Instant) {
        if !path_remap.is_empty() {
            let changed = remap_paths(&mut board, path_remap);
            log::debug!("[lexera.session] Applied {} path rewrites to incoming board", changed);
        }
        let valid = board.valid;
        self.saves.rebaseline(&board);
        self.cache.replace(board);
        self.drag.cancel();
        self.render.trigger(now);
        self.set_save_state(SaveState::Saved);
        if !valid {
            log::info!("[lexera.session] Incoming document is not a board");
            self.send(OutboundMessage::InitializeBoard);
        }
    }

    /// Apply one command. Returns true if the board changed or a save was
    /// sent. Stale ids and other rejected edits are logged and ignored.
    pub fn dispatch(&mut self, command: Command, now: Instant) -> bool {
        let before = self.cache.revision();
        let applied = match self.apply(&command, now) {
            Ok(applied) => applied,
            Err(e) => {
                log::warn!("[lexera.session.dispatch] Ignored {:?}: {}", command, e);
                return false;
            }
        };
        if let Applied::Save = applied {
            return self.save(now);
        }
        if self.cache.revision() == before {
            return false;
        }
        match applied {
            Applied::Tag { target, tag, active } => self.send(OutboundMessage::TagToggled { target, tag, active }),
            Applied::Edited { created_id } => self.send(OutboundMessage::EditApplied { command, created_id }),
            Applied::Save => {}
        }
        self.set_save_state(SaveState::Unsaved);
        true
    }

    fn apply(&mut self, command: &Command, now: Instant) -> Result<Applied, BoardError> {
        let cache = &mut self.cache;
        let edited = Applied::Edited { created_id: None };
        let created = |id: String| Applied::Edited { created_id: Some(id) };
        Ok(match command {
            Command::AddColumn { title, at } => created(cache.add_column(title, *at, now)?),
            Command::DeleteColumn { column_id } => {
                cache.delete_column(column_id)?;
                edited
            }
            Command::DuplicateColumn { column_id } => created(cache.duplicate_column(column_id)?),
            Command::MoveColumn { column_id, to_index } => {
                cache.move_column(column_id, *to_index)?;
                edited
            }
            Command::DropColumn { column_id, at } => {
                cache.move_column_to(column_id, *at)?;
                edited
            }
            Command::RenameColumn { column_id, title } => {
                cache.rename_column(column_id, title)?;
                edited
            }
            Command::ToggleColumnTag { column_id, tag } => {
                let active = cache.toggle_column_tag(column_id, tag)?;
                Applied::Tag {
                    target: FieldRef::ColumnTitle {
                        column_id: column_id.clone(),
                    },
                    tag: tag.clone(),
                    active,
                }
            }
            Command::SetColumnInclude { column_id, files } => {
                cache.set_column_include(column_id, files.clone())?;
                edited
            }
            Command::ClearColumnInclude { column_id } => {
                cache.clear_column_include(column_id)?;
                edited
            }
            Command::AddTask {
                column_id,
                title,
                description,
                at,
            } => created(cache.add_task(column_id, title, description, *at, now)?),
            Command::DeleteTask { task_id, column_id } => {
                cache.delete_task(task_id, Some(column_id))?;
                edited
            }
            Command::DuplicateTask { task_id, column_id } => {
                created(cache.duplicate_task(task_id, Some(column_id))?)
            }
            Command::MoveTask {
                task_id,
                column_id,
                direction,
            } => {
                cache.move_task_direction(task_id, Some(column_id), *direction)?;
                edited
            }
            Command::MoveTaskToColumn {
                task_id,
                column_id,
                to_column_id,
            } => {
                cache.move_task_to_column(task_id, Some(column_id), to_column_id)?;
                edited
            }
            Command::DropTask {
                task_id,
                column_id,
                to_column_id,
                at,
            } => {
                cache.move_task(task_id, Some(column_id), to_column_id, *at)?;
                edited
            }
            Command::EditTask {
                task_id,
                column_id,
                field,
                value,
            } => {
                cache.edit_task(task_id, Some(column_id), *field, value)?;
                edited
            }
            Command::ToggleTaskTag { task_id, column_id, tag } => {
                let active = cache.toggle_task_tag(task_id, Some(column_id), tag)?;
                Applied::Tag {
                    target: FieldRef::TaskTitle {
                        column_id: column_id.clone(),
                        task_id: task_id.clone(),
                    },
                    tag: tag.clone(),
                    active,
                }
            }
            Command::SetTaskInclude {
                task_id,
                column_id,
                files,
            } => {
                cache.set_task_include(task_id, Some(column_id), files.clone())?;
                edited
            }
            Command::ClearTaskInclude { task_id, column_id } => {
                cache.clear_task_include(task_id, Some(column_id))?;
                edited
            }
            Command::Save => Applied::Save,
        })
    }

    /// Dispatch a command picked from the open menu, then close the menu
    /// once the action's own redraw has gone out.
    pub fn menu_action(&mut self, command: Command, now: Instant) -> bool {
        let applied = self.dispatch(command, now);
        self.menu.action_clicked(now);
        applied
    }

    pub fn open_menu(&mut self, owner: &str) {
        let outcome = self.menu.open_menu(owner);
        self.apply_edit(outcome);
    }

    // Editing

    /// Start editing a field. Returns false if the field no longer exists.
    pub fn begin_edit(&mut self, field: FieldRef) -> bool {
        let current = match self.cache.field_text(&field) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("[lexera.session.edit] Cannot edit: {}", e);
                return false;
            }
        };
        let outcome = self.menu.begin_edit(field, current);
        self.apply_edit(outcome);
        true
    }

    pub fn edit_input(&mut self, text: &str) {
        self.menu.update_buffer(text);
    }

    /// Escape, Enter, or Ctrl/Cmd+Enter inside the editor. A `Cancel`
    /// outcome carries the text the view should restore.
    pub fn edit_key(&mut self, key: EditKey) -> Option<EditOutcome> {
        let outcome = self.menu.key(key);
        self.apply_edit(outcome)
    }

    pub fn blur_edit(&mut self) -> Option<EditOutcome> {
        let outcome = self.menu.blur();
        self.apply_edit(outcome)
    }

    fn apply_edit(&mut self, outcome: Option<EditOutcome>) -> Option<EditOutcome> {
        if let Some(EditOutcome::Commit { field, value }) = &outcome {
            let before = self.cache.revision();
            match self.cache.set_field(field, value) {
                Ok(()) if self.cache.revision() != before => {
                    self.send(OutboundMessage::EditApplied {
                        command: field_command(field, value),
                        created_id: None,
                    });
                    self.set_save_state(SaveState::Unsaved);
                }
                Ok(()) => {}
                Err(e) => log::warn!("[lexera.session.edit] Edit dropped: {}", e),
            }
        }
        outcome
    }

    /// A link picked by the host's file chooser. Goes into the open editor
    /// when it targets the field being edited, otherwise straight into the
    /// board.
    fn insert_link(&mut self, target: FieldRef, relative_path: &str, is_image: bool) {
        let link = link_markdown(relative_path, is_image);
        if self.menu.append_to_edit(&target, &link) {
            return;
        }
        let before = self.cache.revision();
        match self.cache.insert_link(&target, &link) {
            Ok(()) if self.cache.revision() != before => {
                let value = self.cache.field_text(&target).unwrap_or_default();
                self.send(OutboundMessage::EditApplied {
                    command: field_command(&target, &value),
                    created_id: None,
                });
                self.set_save_state(SaveState::Unsaved);
            }
            Ok(()) => {}
            Err(e) => log::warn!("[lexera.session.link] Link dropped: {}", e),
        }
    }

    // Saving

    /// Send the board to the host. Commits any edit in progress first.
    /// Returns true if a save request went out.
    pub fn save(&mut self, now: Instant) -> bool {
        let outcome = self.menu.finish_edit();
        self.apply_edit(outcome);

        if !self.cache.board().valid {
            log::warn!("[lexera.session.save] Refusing to save an invalid board");
            return false;
        }
        if !self.cache.is_dirty() {
            self.status(StatusLevel::Info, "No unsaved changes");
            return false;
        }
        let save = self.saves.begin(self.cache.board(), self.cache.revision(), now);
        log::info!(
            "[lexera.session.save] Sending save {} ({} changes)",
            save.request_id,
            save.changes.len()
        );
        self.send_save(save);
        self.set_save_state(SaveState::Saving);
        true
    }

    fn send_save(&self, save: PendingSave) {
        self.send(OutboundMessage::SaveBoard {
            request_id: save.request_id,
            board: save.board,
            changes: save.changes,
            requested_at_ms: chrono::Utc::now().timestamp_millis(),
        });
    }

    fn save_succeeded(&mut self, request_id: u64) {
        match self.saves.complete(request_id) {
            Ok(save) => {
                if self.cache.mark_saved(save.revision) {
                    self.set_save_state(SaveState::Saved);
                } else {
                    self.set_save_state(SaveState::Unsaved);
                }
                log::info!("[lexera.session.save] Save {} confirmed", request_id);
            }
            Err(e) => log::warn!("[lexera.session.save] Result for save {}: {}", request_id, e),
        }
    }

    fn save_failed(&mut self, request_id: u64, kind: SaveFailureKind, message: &str, now: Instant) {
        match self.saves.fail(request_id, kind, message, now) {
            FailureOutcome::RetryScheduled { .. } => {
                log::warn!("[lexera.session.save] Save {} failed ({:?}), retrying", request_id, kind);
                self.send(OutboundMessage::SaveFailed {
                    message: message.to_string(),
                    retrying: true,
                });
            }
            FailureOutcome::Stale(e) => {
                log::warn!("[lexera.session.save] Failure for save {}: {}", request_id, e);
            }
            FailureOutcome::Terminal(e) => {
                log::error!("[lexera.session.save] Save {} failed: {}", request_id, e);
                self.set_save_state(SaveState::Error);
                self.send(OutboundMessage::SaveFailed {
                    message: message.to_string(),
                    retrying: false,
                });
                self.status(StatusLevel::Error, format!("Save failed: {}", message));
            }
        }
    }

    // Drops

    /// Handle a drop on the board. Internal drops move the dragged item;
    /// file and URI drops create one task per item at the resolved position.
    /// Returns the number of tasks created or moved.
    pub fn handle_drop(&mut self, payload: &DropPayload, layout: &[ColumnLayout], point: Point, now: Instant) -> usize {
        if !self.drop_guard.try_enter(now) {
            log::debug!("[lexera.session.drop] Ignoring repeated drop event");
            return 0;
        }
        match drop::classify(payload) {
            DropKind::Internal(id) => usize::from(self.drop_internal(&id, layout, point, now)),
            DropKind::Files(links) | DropKind::Uris(links) => self.drop_links(&links, layout, point, now),
            DropKind::Unrecognized => {
                self.drag.cancel();
                log::info!("[lexera.session.drop] Drop carried nothing usable: {:?}", payload.types);
                self.status(StatusLevel::Info, "Nothing to insert from this drop");
                0
            }
        }
    }

    fn drop_internal(&mut self, id: &str, layout: &[ColumnLayout], point: Point, now: Instant) -> bool {
        let landing = match self.drag.drop(layout, point) {
            Some((item, indicator)) if item.id() == id => Some((item, indicator)),
            _ => self
                .dragged_item(id)
                .and_then(|item| drag::resolve(&item, layout, point).map(|indicator| (item, indicator))),
        };
        let command = match landing {
            Some((DragItem::Task { task_id, column_id }, Indicator::Task(target))) => Command::DropTask {
                task_id,
                column_id,
                to_column_id: target.column_id,
                at: target.insertion,
            },
            Some((DragItem::Column { column_id }, Indicator::Column(at))) => Command::DropColumn { column_id, at },
            _ => {
                log::debug!("[lexera.session.drop] No landing place for {}", id);
                return false;
            }
        };
        self.dispatch(command, now)
    }

    /// Rebuild the dragged item from the board when the drag start was
    /// never seen, e.g. a drag that began in another view of this board.
    fn dragged_item(&self, id: &str) -> Option<DragItem> {
        let board = self.cache.board();
        if let Some((column, task)) = board.find_task(id) {
            return Some(DragItem::Task {
                task_id: task.id.clone(),
                column_id: column.id.clone(),
            });
        }
        board.find_column(id).map(|column| DragItem::Column {
            column_id: column.id.clone(),
        })
    }

    fn drop_links(&mut self, links: &[DroppedLink], layout: &[ColumnLayout], point: Point, now: Instant) -> usize {
        let Some(target) = position::resolve_drop_target(layout, point) else {
            self.status(StatusLevel::Warning, "Add a column before dropping files");
            return 0;
        };
        let mut created = 0;
        for link in links {
            let at = match target.insertion {
                InsertionPoint::Index(index) => InsertionPoint::Index(index + created),
                InsertionPoint::Append => InsertionPoint::Append,
            };
            let command = Command::AddTask {
                column_id: target.column_id.clone(),
                title: link.markdown(),
                description: String::new(),
                at,
            };
            if self.dispatch(command, now) {
                created += 1;
            }
        }
        log::info!(
            "[lexera.session.drop] Created {} of {} dropped items in {}",
            created,
            links.len(),
            target.column_id
        );
        created
    }

    // Timers

    /// Fire every timer that is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.render.poll(now) {
            self.cache.render_all();
        }
        self.menu.tick(now);
        if let Some(save) = self.saves.poll_retry(now) {
            log::info!("[lexera.session.save] Retrying save {}", save.request_id);
            self.send_save(save);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        schedule::earliest([
            self.render.deadline(),
            self.menu.deadline(),
            self.saves.retry_deadline(),
        ])
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Drive a session from the host's message stream until the stream closes,
/// firing timers in between. Returns the session for inspection.
pub async fn run_session(mut session: BoardSession, mut inbound: UnboundedReceiver<InboundMessage>) -> BoardSession {
    log::info!("[lexera.session] Session started");
    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            message = inbound.recv() => match message {
                Some(message) => session.handle_message(message, Instant::now()),
                None => break,
            },
            _ = sleep_until(deadline) => session.tick(Instant::now()),
        }
    }
    log::info!("[lexera.session] Host channel closed, session stopped");
    session
}

//! Transient interaction state: which menu or submenu is open and which
//! field is being edited.
//!
//! Only one top-level menu is open at a time. Leaving a menu arms a close
//! timer that re-entering cancels; clicking an action arms a short close so
//! the action's own re-render finishes before the menu is torn down. Edits
//! commit only on blur, Enter, or an external save, and Escape restores the
//! original text.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::command::FieldRef;
use crate::mutation::append_field_text;
use crate::schedule::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmenuKind {
    Tags,
    MoveTo,
    MoveToColumn,
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub field: FieldRef,
    pub original: String,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    MenuOpen { owner: String },
    SubmenuOpen { owner: String, submenu: SubmenuKind },
    Editing(EditSession),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Commit { field: FieldRef, value: String },
    Unchanged { field: FieldRef },
    Cancel { field: FieldRef, original: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Escape,
    Enter,
    /// Ctrl/Cmd+Enter: commits multi-line fields too.
    ModifiedEnter,
}

#[derive(Debug)]
pub struct MenuController {
    state: MenuState,
    close_timer: Timer<()>,
    close_delay: Duration,
    action_close_delay: Duration,
}

impl MenuController {
    pub fn new(close_delay: Duration, action_close_delay: Duration) -> Self {
        Self {
            state: MenuState::Closed,
            close_timer: Timer::new(),
            close_delay,
            action_close_delay,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn open_owner(&self) -> Option<&str> {
        match &self.state {
            MenuState::MenuOpen { owner } | MenuState::SubmenuOpen { owner, .. } => Some(owner),
            _ => None,
        }
    }

    pub fn editing(&self) -> Option<&EditSession> {
        match &self.state {
            MenuState::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.close_timer.deadline()
    }

    /// Open `owner`'s menu, closing any other. Clicking the button of the
    /// menu that is already open closes it. An edit in progress is
    /// committed first and returned.
    pub fn open_menu(&mut self, owner: &str) -> Option<EditOutcome> {
        self.close_timer.cancel();
        if self.open_owner() == Some(owner) {
            self.state = MenuState::Closed;
            return None;
        }
        let outcome = self.finish_edit();
        self.state = MenuState::MenuOpen {
            owner: owner.to_string(),
        };
        outcome
    }

    /// Hover over a has-submenu item of the open menu. Replaces any submenu
    /// already open for that menu.
    pub fn hover_submenu(&mut self, owner: &str, submenu: SubmenuKind) -> bool {
        if self.open_owner() != Some(owner) {
            return false;
        }
        self.close_timer.cancel();
        self.state = MenuState::SubmenuOpen {
            owner: owner.to_string(),
            submenu,
        };
        true
    }

    /// The pointer left both the menu and its submenu.
    pub fn pointer_left(&mut self, now: Instant) {
        if self.open_owner().is_some() {
            self.close_timer.arm(now, self.close_delay, ());
        }
    }

    /// The pointer came back over the menu or its submenu.
    pub fn pointer_entered(&mut self) {
        self.close_timer.cancel();
    }

    /// An actionable item was clicked and its command dispatched.
    pub fn action_clicked(&mut self, now: Instant) {
        if self.open_owner().is_some() {
            self.close_timer.arm(now, self.action_close_delay, ());
        }
    }

    pub fn close(&mut self) {
        self.close_timer.cancel();
        if self.open_owner().is_some() {
            self.state = MenuState::Closed;
        }
    }

    /// Fire the close timer if due. Returns true if a menu was closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.close_timer.fire(now).is_some() && self.open_owner().is_some() {
            self.state = MenuState::Closed;
            return true;
        }
        false
    }

    /// Start editing `field`, whose current text is `current`. Closes any
    /// menu; a different edit in progress is committed and returned.
    pub fn begin_edit(&mut self, field: FieldRef, current: String) -> Option<EditOutcome> {
        if self.editing().is_some_and(|s| s.field == field) {
            return None;
        }
        self.close_timer.cancel();
        let outcome = self.finish_edit();
        self.state = MenuState::Editing(EditSession {
            field,
            original: current.clone(),
            buffer: current,
        });
        outcome
    }

    pub fn update_buffer(&mut self, text: &str) {
        if let MenuState::Editing(session) = &mut self.state {
            session.buffer = text.to_string();
        }
    }

    /// Append text to the active edit if it targets `field`.
    pub fn append_to_edit(&mut self, field: &FieldRef, text: &str) -> bool {
        match &mut self.state {
            MenuState::Editing(session) if session.field == *field => {
                session.buffer = append_field_text(&session.buffer, text, field.is_single_line());
                true
            }
            _ => false,
        }
    }

    /// Focus left the field: commit.
    pub fn blur(&mut self) -> Option<EditOutcome> {
        self.finish_edit()
    }

    pub fn key(&mut self, key: EditKey) -> Option<EditOutcome> {
        let session = self.editing()?;
        match key {
            EditKey::Escape => {
                let outcome = EditOutcome::Cancel {
                    field: session.field.clone(),
                    original: session.original.clone(),
                };
                self.state = MenuState::Closed;
                Some(outcome)
            }
            EditKey::Enter if !session.field.is_single_line() => None,
            EditKey::Enter | EditKey::ModifiedEnter => self.finish_edit(),
        }
    }

    /// Commit the active edit, if any, and return to `Closed`.
    pub fn finish_edit(&mut self) -> Option<EditOutcome> {
        let MenuState::Editing(session) = &self.state else {
            return None;
        };
        let field = session.field.clone();
        let outcome = if session.buffer == session.original {
            EditOutcome::Unchanged { field }
        } else {
            EditOutcome::Commit {
                field,
                value: session.buffer.clone(),
            }
        };
        self.state = MenuState::Closed;
        Some(outcome)
    }
}

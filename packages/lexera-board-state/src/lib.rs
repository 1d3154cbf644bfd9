//! Client-side state for an interactive kanban board editor.
//!
//! The host owns the markdown document; this crate keeps the working copy
//! of the board, applies user edits to it, and turns them into save
//! requests with a change-set against the last saved snapshot.

pub mod command;
pub mod config;
pub mod drag;
pub mod drop;
pub mod error;
pub mod identity;
pub mod include;
pub mod menu;
pub mod mutation;
pub mod position;
pub mod protocol;
pub mod reconcile;
pub mod schedule;
pub mod session;
pub mod tags;
pub mod types;

pub use command::{Command, FieldRef};
pub use error::{BoardError, ConfigError, SaveError};
pub use mutation::{BoardCache, RenderScope, RenderSink};
pub use protocol::{InboundMessage, OutboundMessage};
pub use session::{run_session, BoardSession};
pub use types::{KanbanBoard, KanbanColumn, KanbanTask};

pub mod diff;
pub mod save;

pub use diff::{reconcile, ChangeSet};
pub use save::{FailureOutcome, PendingSave, SaveState, SaveTracker};

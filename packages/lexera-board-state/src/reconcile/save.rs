/// Save bookkeeping: owns the last-saved snapshot and the in-flight save.
///
/// A save computes the change-set against the snapshot, hands the request to
/// the transport, and re-baselines the snapshot to a deep copy of the cache
/// right away. The snapshot is only ever replaced wholesale. The last board
/// the host confirmed is kept alongside it, and a failed save puts that board
/// back as the snapshot so its changes are diffed again on the next save.
///
/// Failed saves get at most one automatic retry, and only when the failure
/// kind is recoverable and the request is younger than the configured age.
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::diff::{reconcile, ChangeSet};
use crate::error::SaveError;
use crate::protocol::SaveFailureKind;
use crate::schedule::Timer;
use crate::types::KanbanBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveState {
    Saved,
    Unsaved,
    Saving,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub request_id: u64,
    pub board: KanbanBoard,
    pub changes: ChangeSet,
    /// Cache revision the board was captured at.
    pub revision: u64,
    pub created_at: Instant,
    pub retried: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    RetryScheduled { at: Instant },
    Terminal(SaveError),
    /// The result belongs to a save that is no longer pending.
    Stale(SaveError),
}

#[derive(Debug)]
pub struct SaveTracker {
    snapshot: KanbanBoard,
    confirmed: KanbanBoard,
    pending: Option<PendingSave>,
    next_request_id: u64,
    retry: Timer<u64>,
    retry_delay: Duration,
    retry_max_age: Duration,
}

impl SaveTracker {
    pub fn new(snapshot: KanbanBoard, retry_delay: Duration, retry_max_age: Duration) -> Self {
        Self {
            confirmed: snapshot.clone(),
            snapshot,
            pending: None,
            next_request_id: 1,
            retry: Timer::new(),
            retry_delay,
            retry_max_age,
        }
    }

    pub fn snapshot(&self) -> &KanbanBoard {
        &self.snapshot
    }

    pub fn pending(&self) -> Option<&PendingSave> {
        self.pending.as_ref()
    }

    /// Reset the baseline to a freshly loaded document. Any in-flight save
    /// is forgotten.
    pub fn rebaseline(&mut self, board: &KanbanBoard) {
        self.snapshot = board.clone();
        self.confirmed = board.clone();
        self.pending = None;
        self.retry.cancel();
    }

    /// Diff the cache against the snapshot, record the save as in flight,
    /// and re-baseline.
    pub fn begin(&mut self, cache: &KanbanBoard, revision: u64, now: Instant) -> PendingSave {
        let changes = reconcile(&self.snapshot, cache);
        let save = PendingSave {
            request_id: self.next_request_id,
            board: cache.clone(),
            changes,
            revision,
            created_at: now,
            retried: false,
        };
        self.next_request_id += 1;
        self.snapshot = cache.clone();
        self.retry.cancel();
        self.pending = Some(save.clone());
        save
    }

    /// The host applied the save.
    pub fn complete(&mut self, request_id: u64) -> Result<PendingSave, SaveError> {
        match self.pending.take() {
            Some(save) if save.request_id == request_id => {
                self.retry.cancel();
                self.confirmed = save.board.clone();
                Ok(save)
            }
            other => {
                self.pending = other;
                Err(SaveError::NothingPending)
            }
        }
    }

    /// The host could not apply the save. Decide between one delayed retry
    /// and a terminal error. Unless a retry is scheduled, the snapshot goes
    /// back to the last confirmed board.
    pub fn fail(
        &mut self,
        request_id: u64,
        kind: SaveFailureKind,
        message: &str,
        now: Instant,
    ) -> FailureOutcome {
        let rejected = SaveError::Rejected {
            kind,
            message: message.to_string(),
        };
        let Some(save) = self.pending.as_ref().filter(|s| s.request_id == request_id) else {
            if request_id < self.next_request_id {
                self.snapshot = self.confirmed.clone();
            }
            return FailureOutcome::Stale(SaveError::NothingPending);
        };
        let young = now.duration_since(save.created_at) < self.retry_max_age;
        if kind.is_recoverable() && !save.retried && young {
            self.retry.arm(now, self.retry_delay, request_id);
            FailureOutcome::RetryScheduled {
                at: now + self.retry_delay,
            }
        } else {
            self.pending = None;
            self.snapshot = self.confirmed.clone();
            FailureOutcome::Terminal(rejected)
        }
    }

    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry.deadline()
    }

    /// The save to resend, once the retry delay has elapsed.
    pub fn poll_retry(&mut self, now: Instant) -> Option<PendingSave> {
        let request_id = self.retry.fire(now)?;
        let save = self.pending.as_mut().filter(|s| s.request_id == request_id)?;
        save.retried = true;
        Some(save.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KanbanColumn, KanbanTask};

    fn board(title: &str) -> KanbanBoard {
        let mut col = KanbanColumn::new("col-a", "A");
        col.tasks.push(KanbanTask::new("t1", title, ""));
        KanbanBoard {
            valid: true,
            title: String::new(),
            columns: vec![col],
        }
    }

    fn tracker() -> SaveTracker {
        SaveTracker::new(board("One"), Duration::from_millis(1500), Duration::from_secs(300))
    }

    #[test]
    fn test_begin_diffs_then_rebaselines() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let save = tracker.begin(&board("Uno"), 3, t0);
        assert_eq!(save.changes.task_content_changes.len(), 1);
        assert_eq!(tracker.snapshot(), &board("Uno"));

        let again = tracker.begin(&board("Uno"), 3, t0);
        assert!(again.changes.is_empty());
        assert_ne!(again.request_id, save.request_id);
    }

    #[test]
    fn test_complete_matches_request() {
        let mut tracker = tracker();
        let save = tracker.begin(&board("Uno"), 1, Instant::now());
        assert_eq!(tracker.complete(save.request_id + 7), Err(SaveError::NothingPending));
        assert!(tracker.pending().is_some());
        assert_eq!(tracker.complete(save.request_id).unwrap().revision, 1);
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn test_recoverable_failure_retries_once() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let save = tracker.begin(&board("Uno"), 1, t0);

        let outcome = tracker.fail(save.request_id, SaveFailureKind::Busy, "locked", t0);
        let at = t0 + Duration::from_millis(1500);
        assert_eq!(outcome, FailureOutcome::RetryScheduled { at });
        assert!(tracker.poll_retry(t0 + Duration::from_millis(100)).is_none());
        let resend = tracker.poll_retry(at).unwrap();
        assert!(resend.retried);
        assert_eq!(resend.request_id, save.request_id);

        let outcome = tracker.fail(save.request_id, SaveFailureKind::Busy, "locked", at);
        assert!(matches!(outcome, FailureOutcome::Terminal(SaveError::Rejected { .. })));
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn test_unrecoverable_failure_is_terminal() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let save = tracker.begin(&board("Uno"), 1, t0);
        let outcome = tracker.fail(save.request_id, SaveFailureKind::Conflict, "changed on disk", t0);
        assert_eq!(
            outcome,
            FailureOutcome::Terminal(SaveError::Rejected {
                kind: SaveFailureKind::Conflict,
                message: "changed on disk".to_string()
            })
        );
        assert!(tracker.retry_deadline().is_none());
        assert_eq!(tracker.snapshot(), &board("One"));

        let again = tracker.begin(&board("Uno"), 1, t0);
        assert_eq!(again.changes.task_content_changes.len(), 1);
    }

    #[test]
    fn test_confirmed_save_becomes_restore_point() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let first = tracker.begin(&board("Uno"), 1, t0);
        tracker.complete(first.request_id).unwrap();
        let second = tracker.begin(&board("Dos"), 2, t0);
        tracker.fail(second.request_id, SaveFailureKind::Conflict, "changed on disk", t0);
        assert_eq!(tracker.snapshot(), &board("Uno"));
    }

    #[test]
    fn test_failure_of_superseded_save_is_stale() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let first = tracker.begin(&board("Uno"), 1, t0);
        let second = tracker.begin(&board("Dos"), 2, t0);

        let outcome = tracker.fail(first.request_id, SaveFailureKind::Busy, "locked", t0);
        assert_eq!(outcome, FailureOutcome::Stale(SaveError::NothingPending));
        assert_eq!(tracker.pending().map(|s| s.request_id), Some(second.request_id));
        assert!(tracker.retry_deadline().is_none());

        let third = tracker.begin(&board("Dos"), 2, t0);
        assert_eq!(third.changes.task_content_changes.len(), 1);
    }

    #[test]
    fn test_unknown_request_leaves_snapshot() {
        let mut tracker = tracker();
        let save = tracker.begin(&board("Uno"), 1, Instant::now());
        let outcome = tracker.fail(save.request_id + 5, SaveFailureKind::Busy, "locked", Instant::now());
        assert!(matches!(outcome, FailureOutcome::Stale(_)));
        assert_eq!(tracker.snapshot(), &board("Uno"));
    }

    #[test]
    fn test_stale_failure_is_terminal() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let save = tracker.begin(&board("Uno"), 1, t0);
        let late = t0 + Duration::from_secs(301);
        let outcome = tracker.fail(save.request_id, SaveFailureKind::Timeout, "slow", late);
        assert!(matches!(outcome, FailureOutcome::Terminal(_)));
    }

    #[test]
    fn test_rebaseline_cancels_retry() {
        let mut tracker = tracker();
        let t0 = Instant::now();
        let save = tracker.begin(&board("Uno"), 1, t0);
        tracker.fail(save.request_id, SaveFailureKind::Timeout, "slow", t0);
        tracker.rebaseline(&board("Disk"));
        assert!(tracker.retry_deadline().is_none());
        assert!(tracker.poll_retry(t0 + Duration::from_secs(10)).is_none());
        assert_eq!(tracker.snapshot(), &board("Disk"));
    }
}

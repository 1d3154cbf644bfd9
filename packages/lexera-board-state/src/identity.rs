/// Opaque identity for columns and tasks.
///
/// Ids are never derived from titles. Each one combines a process-wide
/// counter with a nanosecond timestamp, hashed via SHA-256, so an id is
/// never handed out twice for the life of the process.
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

pub const COLUMN_ID_PREFIX: &str = "col-";
pub const TASK_ID_PREFIX: &str = "task-";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn generate_id(prefix: &str) -> String {
    use sha2::{Digest, Sha256};
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}{}", prefix, hex::encode(&hash[..6]))
}

/// Generate a column id that is not already present in `taken`.
pub fn new_column_id(taken: &HashSet<String>) -> String {
    unique_id(COLUMN_ID_PREFIX, taken)
}

/// Generate a task id that is not already present in `taken`.
pub fn new_task_id(taken: &HashSet<String>) -> String {
    unique_id(TASK_ID_PREFIX, taken)
}

fn unique_id(prefix: &str, taken: &HashSet<String>) -> String {
    loop {
        let id = generate_id(prefix);
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// Whether a dragged text payload looks like one of our own ids rather than
/// external content.
pub fn looks_like_board_id(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.contains(char::is_whitespace)
        && (trimmed.starts_with(TASK_ID_PREFIX) || trimmed.starts_with(COLUMN_ID_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_prefix() {
        let taken = HashSet::new();
        let col = new_column_id(&taken);
        let task = new_task_id(&taken);
        assert!(col.starts_with("col-"));
        assert!(task.starts_with("task-"));
        assert_eq!(task.len(), "task-".len() + 12);
        assert!(task["task-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_ids_unique() {
        let mut taken = HashSet::new();
        for _ in 0..500 {
            let id = new_task_id(&taken);
            assert!(taken.insert(id));
        }
    }

    #[test]
    fn test_looks_like_board_id() {
        assert!(looks_like_board_id("task-0a1b2c3d4e5f"));
        assert!(looks_like_board_id(" col-abc \n"));
        assert!(!looks_like_board_id("/home/me/task-notes.md and more"));
        assert!(!looks_like_board_id("file:///tmp/a.png"));
    }
}

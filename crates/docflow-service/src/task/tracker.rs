//! In-memory, TTL-bounded task status map.
//!
//! Entries live in process memory only and are lost on restart. Clients
//! poll by task id; an entry is evicted once its TTL elapses or when a
//! terminal status is taken.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use docflow_entity::task::{TaskState, TaskStatus};

/// Tracks the status of background tasks.
#[derive(Debug, Clone)]
pub struct TaskTracker {
    entries: Arc<DashMap<Uuid, TaskStatus>>,
    ttl: chrono::Duration,
}

impl TaskTracker {
    /// Creates a tracker whose entries expire `ttl` after their last update.
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Register a new pending task.
    pub fn create(&self, message: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.entries
            .insert(id, TaskStatus::pending(id, Some(message.into()), Utc::now()));
        debug!(task_id = %id, "Task created");
        id
    }

    /// Record progress. Returns `false` if the task is unknown or finished.
    pub fn update(&self, id: Uuid, message: impl Into<String>) -> bool {
        self.modify(id, |status| {
            status.state = TaskState::Running;
            status.message = Some(message.into());
        })
    }

    /// Mark the task completed with a result payload.
    pub fn complete(&self, id: Uuid, result: serde_json::Value) -> bool {
        self.modify(id, |status| {
            status.state = TaskState::Completed;
            status.result = Some(result);
        })
    }

    /// Mark the task failed.
    pub fn fail(&self, id: Uuid, error: impl Into<String>) -> bool {
        self.modify(id, |status| {
            status.state = TaskState::Failed;
            status.error = Some(error.into());
        })
    }

    /// Current status; expired entries read as absent.
    pub fn get(&self, id: Uuid) -> Option<TaskStatus> {
        let now = Utc::now();
        self.entries
            .get(&id)
            .filter(|entry| !self.is_expired(entry.value(), now))
            .map(|entry| entry.value().clone())
    }

    /// Current status, removing the entry if it is terminal.
    pub fn take_terminal(&self, id: Uuid) -> Option<TaskStatus> {
        let status = self.get(id)?;
        if status.state.is_terminal() {
            self.entries.remove(&id);
        }
        Some(status)
    }

    /// Evict entries whose TTL elapsed before `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, status| !self.is_expired(status, now));
        before.saturating_sub(self.entries.len())
    }

    /// Evict expired entries.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Number of tracked entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweep periodically until the handle is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = tracker.sweep();
                if evicted > 0 {
                    info!(evicted, remaining = tracker.len(), "Swept expired tasks");
                }
            }
        })
    }

    fn modify(&self, id: Uuid, apply: impl FnOnce(&mut TaskStatus)) -> bool {
        match self.entries.get_mut(&id) {
            Some(mut entry) if !entry.state.is_terminal() => {
                apply(entry.value_mut());
                entry.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn is_expired(&self, status: &TaskStatus, now: DateTime<Utc>) -> bool {
        status.updated_at + self.ttl < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle() {
        let tracker = TaskTracker::new(chrono::Duration::minutes(10));
        let id = tracker.create("Registering document");
        assert_eq!(tracker.get(id).unwrap().state, TaskState::Pending);

        assert!(tracker.update(id, "Copying template"));
        let status = tracker.get(id).unwrap();
        assert_eq!(status.state, TaskState::Running);
        assert_eq!(status.message.as_deref(), Some("Copying template"));

        assert!(tracker.complete(id, json!({ "id": 12 })));
        assert!(!tracker.fail(id, "too late"));
        assert_eq!(tracker.get(id).unwrap().result, Some(json!({ "id": 12 })));
    }

    #[test]
    fn test_take_terminal_evicts_only_finished() {
        let tracker = TaskTracker::new(chrono::Duration::minutes(10));
        let running = tracker.create("a");
        let failed = tracker.create("b");
        tracker.fail(failed, "boom");

        assert!(tracker.take_terminal(running).is_some());
        assert!(tracker.get(running).is_some());

        let status = tracker.take_terminal(failed).unwrap();
        assert_eq!(status.error.as_deref(), Some("boom"));
        assert!(tracker.get(failed).is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_sweep_evicts_after_ttl() {
        let tracker = TaskTracker::new(chrono::Duration::seconds(30));
        let id = tracker.create("a");
        assert_eq!(tracker.sweep_at(Utc::now() + chrono::Duration::seconds(5)), 0);
        assert_eq!(tracker.sweep_at(Utc::now() + chrono::Duration::seconds(31)), 1);
        assert!(tracker.get(id).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let tracker = TaskTracker::new(chrono::Duration::zero() - chrono::Duration::seconds(1));
        let id = tracker.create("a");
        assert!(tracker.get(id).is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_periodically() {
        let tracker = TaskTracker::new(chrono::Duration::zero() - chrono::Duration::seconds(1));
        tracker.create("a");
        let handle = tracker.spawn_sweeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(tracker.is_empty());
        handle.abort();
    }
}

//! Activity log and notification records.
//!
//! Both are append-only JSONL files. The activity log feeds the inactivity
//! clause of the escalation engine; notifications are the record an external
//! delivery channel would pick up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::Storage;

/// What happened to a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    StatusChanged,
    Assigned,
    PriorityEscalated,
    RelationshipAdded,
    RelationshipRemoved,
}

/// One entry of the per-task activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub task_id: String,
    pub kind: ActivityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(kind: ActivityKind, task_id: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            task_id: task_id.into(),
            kind,
            actor: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Notification kinds recorded by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PriorityEscalated,
}

/// A notification record awaiting external delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub task_id: String,
    pub recipient: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(
        kind: NotificationKind,
        task_id: impl Into<String>,
        recipient: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            recipient: recipient.into(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only activity log
#[derive(Debug, Clone)]
pub struct ActivityLog {
    storage: Storage,
}

impl ActivityLog {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn append(&self, record: &ActivityRecord) -> Result<()> {
        self.storage.append_jsonl(&self.storage.activity_file(), record)
    }

    /// All activity for one task, oldest first
    pub fn for_task(&self, task_id: &str) -> Result<Vec<ActivityRecord>> {
        let mut records: Vec<ActivityRecord> =
            self.storage.read_jsonl(&self.storage.activity_file())?;
        records.retain(|r| r.task_id == task_id);
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    /// Most recent activity record for a task, if any
    pub fn latest_for(&self, task_id: &str) -> Result<Option<ActivityRecord>> {
        Ok(self.for_task(task_id)?.pop())
    }

    /// Latest activity timestamp per task, in one pass over the log
    pub fn latest_by_task(&self) -> Result<std::collections::HashMap<String, DateTime<Utc>>> {
        let records: Vec<ActivityRecord> =
            self.storage.read_jsonl(&self.storage.activity_file())?;
        let mut latest: std::collections::HashMap<String, DateTime<Utc>> =
            std::collections::HashMap::new();
        for record in records {
            latest
                .entry(record.task_id)
                .and_modify(|ts| {
                    if record.timestamp > *ts {
                        *ts = record.timestamp;
                    }
                })
                .or_insert(record.timestamp);
        }
        Ok(latest)
    }
}

/// Append-only notification store
#[derive(Debug, Clone)]
pub struct NotificationStore {
    storage: Storage,
}

impl NotificationStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn append(&self, record: &NotificationRecord) -> Result<()> {
        self.storage
            .append_jsonl(&self.storage.notifications_file(), record)
    }

    pub fn all(&self) -> Result<Vec<NotificationRecord>> {
        self.storage.read_jsonl(&self.storage.notifications_file())
    }

    pub fn for_recipient(&self, recipient: &str) -> Result<Vec<NotificationRecord>> {
        let mut records = self.all()?;
        records.retain(|r| r.recipient == recipient);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log() -> (TempDir, ActivityLog) {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init");
        (dir, ActivityLog::new(storage))
    }

    #[test]
    fn latest_for_returns_most_recent() {
        let (_dir, log) = log();

        let mut first = ActivityRecord::new(ActivityKind::Created, "tsk-1");
        first.timestamp = Utc::now() - chrono::Duration::days(3);
        log.append(&first).expect("append");

        let second = ActivityRecord::new(ActivityKind::StatusChanged, "tsk-1")
            .with_detail("todo -> in_progress");
        log.append(&second).expect("append");

        let other = ActivityRecord::new(ActivityKind::Created, "tsk-2");
        log.append(&other).expect("append");

        let latest = log.latest_for("tsk-1").expect("latest").expect("record");
        assert_eq!(latest.kind, ActivityKind::StatusChanged);
        assert_eq!(latest.detail.as_deref(), Some("todo -> in_progress"));

        assert!(log.latest_for("tsk-9").expect("latest").is_none());
    }

    #[test]
    fn notifications_filter_by_recipient() {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init");
        let store = NotificationStore::new(storage);

        store
            .append(&NotificationRecord::new(
                NotificationKind::PriorityEscalated,
                "tsk-1",
                "alice",
                "Priority of 'Fix login' escalated to urgent",
            ))
            .expect("append");
        store
            .append(&NotificationRecord::new(
                NotificationKind::PriorityEscalated,
                "tsk-2",
                "bob",
                "Priority of 'Ship build' escalated to high",
            ))
            .expect("append");

        let alice = store.for_recipient("alice").expect("list");
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].task_id, "tsk-1");
    }
}

//! Task records and the task registry.
//!
//! Tasks are stored as a JSON registry snapshot in `.taskgraph/tasks.json`.
//! Mutations go through a locked read-modify-write so concurrent `tg`
//! processes serialize, and reads are point-in-time snapshots.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::priority::Priority;
use crate::storage::Storage;

const TASK_ID_PREFIX: &str = "tsk";
const TASK_ID_SUFFIX_LEN: usize = 6;
const TASKS_SCHEMA_VERSION: &str = "taskgraph.tasks.v1";
const ULID_TIME_LEN: usize = 10;

/// Task status lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<TaskStatus> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(Error::InvalidArgument(format!(
                "unknown task status '{other}' (expected todo|in_progress|done|cancelled)"
            ))),
        }
    }

    /// Status derived from a progress percentage
    pub fn from_progress(progress: u8) -> TaskStatus {
        match progress {
            0 => TaskStatus::Todo,
            100 => TaskStatus::Done,
            _ => TaskStatus::InProgress,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Completion percentage, 0-100
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Task duration in whole days, from start to end date.
    ///
    /// A task missing either date contributes zero duration.
    pub fn duration_days(&self) -> i64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (end - start).num_days().max(0),
            _ => 0,
        }
    }
}

/// Fields for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
    pub project: Option<String>,
}

/// Filters for task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub project: Option<String>,
    pub limit: Option<usize>,
}

/// On-disk registry of all tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRegistry {
    pub schema_version: String,
    pub tasks: Vec<TaskRecord>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            tasks: Vec::new(),
        }
    }
}

impl TaskRegistry {
    pub fn find(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn insert(&mut self, record: TaskRecord) -> Result<()> {
        if self.find(&record.id).is_some() {
            return Err(Error::InvalidArgument(format!(
                "task already exists: {}",
                record.id
            )));
        }
        self.tasks.push(record);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Option<TaskRecord> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .map(|idx| self.tasks.remove(idx))
    }
}

/// Store for task records
#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn registry_path(&self) -> PathBuf {
        self.storage.tasks_file()
    }

    /// Create a task and return the stored record
    pub fn create(&self, new: NewTask) -> Result<TaskRecord> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
        }

        let now = Utc::now();
        self.storage
            .update_registry::<TaskRegistry, _, _>(&self.registry_path(), |registry| {
                let record = TaskRecord {
                    id: generate_task_id(registry),
                    title,
                    status: TaskStatus::Todo,
                    priority: new.priority.unwrap_or_default(),
                    progress: 0,
                    due_date: new.due_date,
                    start_date: new.start_date,
                    end_date: new.end_date,
                    assignee: new.assignee,
                    project: new.project,
                    created_at: now,
                    updated_at: now,
                };
                registry.insert(record.clone())?;
                Ok(record)
            })
    }

    /// Fetch a task by exact id
    pub fn get(&self, id: &str) -> Result<TaskRecord> {
        let registry: TaskRegistry = self.storage.read_registry(&self.registry_path())?;
        registry
            .find(id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// List tasks matching the filter, newest-updated first
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
        let registry: TaskRegistry = self.storage.read_registry(&self.registry_path())?;
        let mut tasks = registry.tasks;

        if let Some(status) = filter.status {
            tasks.retain(|t| t.status == status);
        }
        if let Some(project) = &filter.project {
            tasks.retain(|t| t.project.as_deref() == Some(project.as_str()));
        }

        tasks.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = filter.limit {
            tasks.truncate(limit);
        }

        Ok(tasks)
    }

    /// All tasks, unsorted snapshot
    pub fn all(&self) -> Result<Vec<TaskRecord>> {
        let registry: TaskRegistry = self.storage.read_registry(&self.registry_path())?;
        Ok(registry.tasks)
    }

    /// Mutate a task under the registry lock and return the updated record.
    ///
    /// Bumps `updated_at` on every call.
    pub fn update<F>(&self, id: &str, mutator: F) -> Result<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord) -> Result<()>,
    {
        let id = id.to_string();
        self.storage
            .update_registry::<TaskRegistry, _, _>(&self.registry_path(), |registry| {
                let record = registry
                    .find_mut(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                mutator(record)?;
                record.updated_at = Utc::now();
                Ok(record.clone())
            })
    }

    /// Remove a task; the caller is responsible for cascading edge cleanup
    pub fn remove(&self, id: &str) -> Result<TaskRecord> {
        let id = id.to_string();
        self.storage
            .update_registry::<TaskRegistry, _, _>(&self.registry_path(), |registry| {
                registry
                    .remove(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))
            })
    }

    /// Resolve a full id or an unambiguous suffix prefix to a task id.
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }

        let registry: TaskRegistry = self.storage.read_registry(&self.registry_path())?;
        let mut matches: Vec<String> = Vec::new();

        for task in &registry.tasks {
            let id_norm = task.id.to_ascii_lowercase();
            if id_norm == trimmed {
                return Ok(task.id.clone());
            }
            let suffix = id_norm.strip_prefix(&format!("{TASK_ID_PREFIX}-")).unwrap_or(&id_norm);
            if suffix.starts_with(&trimmed) {
                matches.push(task.id.clone());
            }
        }

        matches.sort();
        matches.dedup();
        match matches.len() {
            0 => Err(Error::TaskNotFound(input.trim().to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                matches.join(", ")
            ))),
        }
    }
}

/// Generate a fresh task id unique within the registry.
///
/// The suffix comes from the random section of a ULID, so ids stay short
/// while collisions remain unlikely; a collision regenerates.
fn generate_task_id(registry: &TaskRegistry) -> String {
    loop {
        let base = Ulid::new().to_string().to_ascii_lowercase();
        let random = &base[ULID_TIME_LEN..];
        let suffix = &random[..TASK_ID_SUFFIX_LEN];
        let candidate = format!("{TASK_ID_PREFIX}-{suffix}");
        if registry.find(&candidate).is_none() {
            return candidate;
        }
    }
}

//! Typed, directed relationships between tasks.
//!
//! Edges live in `.taskgraph/relationships.jsonl`, one record per line in
//! creation order. Creation holds the file lock across the validation gate
//! and the append, so a concurrent `tg link add` cannot slip a cycle past
//! the check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::graph::GraphSnapshot;
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::{lock_path_for, Storage};
use crate::task::TaskStore;

/// Relationship types between two tasks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Blocks,
    BlockedBy,
    DependsOn,
    RequiredFor,
    RelatedTo,
    Duplicates,
    DuplicatedBy,
    ParentChild,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Blocks => "blocks",
            RelationKind::BlockedBy => "blocked_by",
            RelationKind::DependsOn => "depends_on",
            RelationKind::RequiredFor => "required_for",
            RelationKind::RelatedTo => "related_to",
            RelationKind::Duplicates => "duplicates",
            RelationKind::DuplicatedBy => "duplicated_by",
            RelationKind::ParentChild => "parent_child",
        }
    }

    pub fn parse(value: &str) -> Result<RelationKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(RelationKind::Blocks),
            "blocked_by" => Ok(RelationKind::BlockedBy),
            "depends_on" => Ok(RelationKind::DependsOn),
            "required_for" => Ok(RelationKind::RequiredFor),
            "related_to" => Ok(RelationKind::RelatedTo),
            "duplicates" => Ok(RelationKind::Duplicates),
            "duplicated_by" => Ok(RelationKind::DuplicatedBy),
            "parent_child" => Ok(RelationKind::ParentChild),
            other => Err(Error::InvalidArgument(format!(
                "unknown relationship kind '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form annotations carried by an edge
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RelationMetadata {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.delay_days.is_none()
            && self.progress.is_none()
            && self.status.is_none()
    }
}

/// A directed, typed edge between two tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub id: String,
    pub source_task_id: String,
    pub target_task_id: String,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RelationMetadata>,
    pub created_at: DateTime<Utc>,
}

/// Request to create an edge
#[derive(Debug, Clone)]
pub struct NewRelationship {
    pub source_task_id: String,
    pub target_task_id: String,
    pub kind: RelationKind,
    pub metadata: Option<RelationMetadata>,
}

/// Edges touching one task, split by direction
#[derive(Debug, Clone, Serialize)]
pub struct TaskLinks {
    pub outgoing: Vec<RelationshipRecord>,
    pub incoming: Vec<RelationshipRecord>,
}

/// Store for relationship records
#[derive(Debug, Clone)]
pub struct RelationshipStore {
    storage: Storage,
}

impl RelationshipStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Load all edges as a point-in-time snapshot, in creation order
    pub fn load(&self) -> Result<Vec<RelationshipRecord>> {
        let mut edges: Vec<RelationshipRecord> =
            self.storage.read_jsonl(&self.storage.relationships_file())?;
        edges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(edges)
    }

    /// Build a graph snapshot from the current edge set
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(GraphSnapshot::from_edges(&self.load()?))
    }

    /// Create an edge after validating it.
    ///
    /// Rejects self-loops for every kind, missing endpoint tasks, duplicate
    /// edges, and `depends_on` edges that would close a cycle. The cycle
    /// check and the append happen under one lock.
    pub fn create(&self, tasks: &TaskStore, new: NewRelationship) -> Result<RelationshipRecord> {
        let source = new.source_task_id.trim().to_string();
        let target = new.target_task_id.trim().to_string();

        if source.is_empty() || target.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if source == target {
            return Err(Error::SelfLoop(source));
        }

        tasks.get(&source)?;
        tasks.get(&target)?;

        let path = self.storage.relationships_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let edges: Vec<RelationshipRecord> = self.storage.read_jsonl(&path)?;

        if edges.iter().any(|edge| {
            edge.source_task_id == source && edge.target_task_id == target && edge.kind == new.kind
        }) {
            return Err(Error::InvalidArgument(format!(
                "relationship already exists: {source} {} {target}",
                new.kind
            )));
        }

        if new.kind == RelationKind::DependsOn {
            let snapshot = GraphSnapshot::from_edges(&edges);
            if snapshot.would_create_cycle(&source, &target) {
                return Err(Error::DependencyCycle { source, target });
            }
        }

        let metadata = new.metadata.filter(|m| !m.is_empty());
        let record = RelationshipRecord {
            id: Uuid::new_v4().to_string(),
            source_task_id: source,
            target_task_id: target,
            kind: new.kind,
            metadata,
            created_at: Utc::now(),
        };

        self.storage.append_jsonl_unlocked(&path, &record)?;
        Ok(record)
    }

    /// Delete an edge by id, returning the removed record
    pub fn remove(&self, id: &str) -> Result<RelationshipRecord> {
        let path = self.storage.relationships_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut edges: Vec<RelationshipRecord> = self.storage.read_jsonl(&path)?;
        let idx = edges
            .iter()
            .position(|edge| edge.id == id)
            .ok_or_else(|| Error::RelationshipNotFound(id.to_string()))?;
        let removed = edges.remove(idx);

        self.rewrite_unlocked(&path, &edges)?;
        Ok(removed)
    }

    /// Delete every edge touching a task; cascaded from task deletion
    pub fn remove_for_task(&self, task_id: &str) -> Result<usize> {
        let path = self.storage.relationships_file();
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut edges: Vec<RelationshipRecord> = self.storage.read_jsonl(&path)?;
        let before = edges.len();
        edges.retain(|edge| edge.source_task_id != task_id && edge.target_task_id != task_id);
        let removed = before - edges.len();

        if removed > 0 {
            self.rewrite_unlocked(&path, &edges)?;
        }
        Ok(removed)
    }

    /// All edges touching a task, split into outgoing and incoming
    pub fn for_task(&self, task_id: &str) -> Result<TaskLinks> {
        let edges = self.load()?;
        let mut links = TaskLinks {
            outgoing: Vec::new(),
            incoming: Vec::new(),
        };
        for edge in edges {
            if edge.source_task_id == task_id {
                links.outgoing.push(edge);
            } else if edge.target_task_id == task_id {
                links.incoming.push(edge);
            }
        }
        Ok(links)
    }

    fn rewrite_unlocked(
        &self,
        path: &std::path::Path,
        edges: &[RelationshipRecord],
    ) -> Result<()> {
        let mut buffer = Vec::new();
        for edge in edges {
            let json = serde_json::to_string(edge)?;
            buffer.extend_from_slice(json.as_bytes());
            buffer.push(b'\n');
        }
        crate::lock::write_atomic(path, &buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, TaskStore, RelationshipStore) {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init");
        (
            dir,
            TaskStore::new(storage.clone()),
            RelationshipStore::new(storage),
        )
    }

    fn task(tasks: &TaskStore, title: &str) -> String {
        tasks
            .create(NewTask {
                title: title.to_string(),
                ..Default::default()
            })
            .expect("create task")
            .id
    }

    fn link(
        tasks: &TaskStore,
        rels: &RelationshipStore,
        source: &str,
        target: &str,
        kind: RelationKind,
    ) -> Result<RelationshipRecord> {
        rels.create(
            tasks,
            NewRelationship {
                source_task_id: source.to_string(),
                target_task_id: target.to_string(),
                kind,
                metadata: None,
            },
        )
    }

    #[test]
    fn self_loop_rejected_for_every_kind() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");

        for kind in [
            RelationKind::Blocks,
            RelationKind::DependsOn,
            RelationKind::RelatedTo,
            RelationKind::ParentChild,
        ] {
            let err = link(&tasks, &rels, &a, &a, kind).expect_err("self loop");
            assert!(matches!(err, Error::SelfLoop(_)));
        }
        assert!(rels.load().expect("load").is_empty());
    }

    #[test]
    fn missing_endpoint_rejected() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");

        let err = link(&tasks, &rels, &a, "tsk-nope", RelationKind::Blocks)
            .expect_err("missing target");
        assert!(matches!(err, Error::TaskNotFound(_)));

        let err = link(&tasks, &rels, "tsk-nope", &a, RelationKind::Blocks)
            .expect_err("missing source");
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn transitive_cycle_rejected() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");
        let c = task(&tasks, "c");

        link(&tasks, &rels, &a, &b, RelationKind::DependsOn).expect("a->b");
        link(&tasks, &rels, &b, &c, RelationKind::DependsOn).expect("b->c");

        let err = link(&tasks, &rels, &c, &a, RelationKind::DependsOn).expect_err("cycle");
        match err {
            Error::DependencyCycle { source, target } => {
                assert_eq!(source, c);
                assert_eq!(target, a);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The rejected edge must not have been persisted
        assert_eq!(rels.load().expect("load").len(), 2);
    }

    #[test]
    fn cycle_gate_only_applies_to_depends_on() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");

        link(&tasks, &rels, &a, &b, RelationKind::DependsOn).expect("a->b");
        // A blocks edge in the reverse direction is fine
        link(&tasks, &rels, &b, &a, RelationKind::Blocks).expect("b blocks a");
    }

    #[test]
    fn duplicate_edge_rejected() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");

        link(&tasks, &rels, &a, &b, RelationKind::Blocks).expect("first");
        let err = link(&tasks, &rels, &a, &b, RelationKind::Blocks).expect_err("duplicate");
        assert!(matches!(err, Error::InvalidArgument(_)));

        // Same endpoints with a different kind is a distinct edge
        link(&tasks, &rels, &a, &b, RelationKind::RelatedTo).expect("other kind");
    }

    #[test]
    fn remove_and_cascade() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");
        let c = task(&tasks, "c");

        let ab = link(&tasks, &rels, &a, &b, RelationKind::DependsOn).expect("a->b");
        link(&tasks, &rels, &b, &c, RelationKind::DependsOn).expect("b->c");
        link(&tasks, &rels, &c, &a, RelationKind::RelatedTo).expect("c~a");

        rels.remove(&ab.id).expect("remove");
        assert!(matches!(
            rels.remove(&ab.id),
            Err(Error::RelationshipNotFound(_))
        ));

        let removed = rels.remove_for_task(&c).expect("cascade");
        assert_eq!(removed, 2);
        assert!(rels.load().expect("load").is_empty());
    }

    #[test]
    fn for_task_splits_directions() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");
        let c = task(&tasks, "c");

        link(&tasks, &rels, &a, &b, RelationKind::DependsOn).expect("a->b");
        link(&tasks, &rels, &c, &a, RelationKind::Blocks).expect("c->a");

        let links = rels.for_task(&a).expect("links");
        assert_eq!(links.outgoing.len(), 1);
        assert_eq!(links.outgoing[0].target_task_id, b);
        assert_eq!(links.incoming.len(), 1);
        assert_eq!(links.incoming[0].source_task_id, c);
    }

    #[test]
    fn empty_metadata_is_normalized_away() {
        let (_dir, tasks, rels) = fixture();
        let a = task(&tasks, "a");
        let b = task(&tasks, "b");

        let record = rels
            .create(
                &tasks,
                NewRelationship {
                    source_task_id: a,
                    target_task_id: b,
                    kind: RelationKind::DependsOn,
                    metadata: Some(RelationMetadata::default()),
                },
            )
            .expect("create");
        assert!(record.metadata.is_none());
    }
}

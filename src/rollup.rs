//! Progress rollup over `parent_child` edges.
//!
//! A parent task's progress is the share of its children whose status is
//! `done`, rounded to a whole percentage; its status is derived from that
//! progress. Recomputation propagates upward through the parent chain.
//! Rollup is best-effort derived state: dangling references end propagation
//! silently instead of failing the caller.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::relationship::RelationshipStore;
use crate::task::{TaskRecord, TaskStatus, TaskStore};

/// One task updated during a rollup pass
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RollupChange {
    pub task_id: String,
    pub progress: u8,
    pub status: TaskStatus,
}

/// Result of a rollup pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollupReport {
    pub updated: Vec<RollupChange>,
}

/// Recompute progress for `task_id` and propagate upward.
///
/// For each task in the chain that has `parent_child` children, progress and
/// status are recomputed from the children's statuses and persisted. The
/// walk then continues with the task's own parent. A visited set guards
/// against corrupted parent chains; `parent_child` is acyclic by design but
/// a loop in the data must not hang the process.
pub fn recompute_progress(
    tasks: &TaskStore,
    relationships: &RelationshipStore,
    task_id: &str,
) -> Result<RollupReport> {
    let snapshot = relationships.snapshot()?;
    let mut report = RollupReport::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut cursor = Some(task_id.to_string());

    while let Some(id) = cursor {
        if !visited.insert(id.clone()) {
            break;
        }

        let children = snapshot.children_of(&id);
        if !children.is_empty() {
            let mut resolved: Vec<TaskRecord> = Vec::with_capacity(children.len());
            for child in children {
                match tasks.get(child) {
                    Ok(record) => resolved.push(record),
                    // Dangling child edge from a partial delete: ignore it
                    Err(Error::TaskNotFound(_)) => continue,
                    Err(err) => return Err(err),
                }
            }

            if !resolved.is_empty() {
                let total = resolved.len();
                let done = resolved
                    .iter()
                    .filter(|child| child.status == TaskStatus::Done)
                    .count();
                let progress = ((100.0 * done as f64) / total as f64).round() as u8;
                let status = TaskStatus::from_progress(progress);

                match tasks.update(&id, |task| {
                    task.progress = progress;
                    task.status = status;
                    Ok(())
                }) {
                    Ok(_) => report.updated.push(RollupChange {
                        task_id: id.clone(),
                        progress,
                        status,
                    }),
                    // The task itself vanished mid-walk: stop propagating
                    Err(Error::TaskNotFound(_)) => break,
                    Err(err) => return Err(err),
                }
            }
        }

        cursor = snapshot.parent_of(&id).map(str::to_string);
    }

    Ok(report)
}

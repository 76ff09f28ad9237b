//! Critical path calculation over the dependency graph.
//!
//! The critical path of a task is the longest duration-weighted chain of
//! `depends_on` edges starting at that task. Durations are whole days from
//! a task's start date to its end date; tasks without both dates weigh zero.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::GraphSnapshot;
use crate::task::TaskRecord;

/// The longest duration-weighted dependency chain from a root task
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CriticalPath {
    pub path: Vec<String>,
    pub duration_days: i64,
}

/// Compute the critical path rooted at `root`.
///
/// Every path through the `depends_on` closure is explored; edges are
/// followed in creation order, and only a strictly longer path replaces the
/// best one, so ties go to the first chain discovered. An on-path guard
/// keeps corrupted (cyclic) data from recursing forever. Task ids with no
/// record contribute zero duration.
///
/// A root with no dependencies and no duration yields an empty path of
/// duration zero.
pub fn critical_path(
    snapshot: &GraphSnapshot,
    tasks: &HashMap<String, TaskRecord>,
    root: &str,
) -> CriticalPath {
    let mut best = CriticalPath {
        path: Vec::new(),
        duration_days: 0,
    };
    let mut on_path = HashSet::new();
    let mut current = Vec::new();

    walk(snapshot, tasks, root, 0, &mut current, &mut on_path, &mut best);

    best
}

fn walk(
    snapshot: &GraphSnapshot,
    tasks: &HashMap<String, TaskRecord>,
    id: &str,
    carried: i64,
    current: &mut Vec<String>,
    on_path: &mut HashSet<String>,
    best: &mut CriticalPath,
) {
    let total = carried + duration_of(tasks, id);
    current.push(id.to_string());
    on_path.insert(id.to_string());

    let mut descended = false;
    for next in snapshot.dependencies_of(id) {
        if on_path.contains(next) {
            continue;
        }
        descended = true;
        walk(snapshot, tasks, next, total, current, on_path, best);
    }

    if !descended && total > best.duration_days {
        best.path = current.clone();
        best.duration_days = total;
    }

    on_path.remove(id);
    current.pop();
}

fn duration_of(tasks: &HashMap<String, TaskRecord>, id: &str) -> i64 {
    tasks.get(id).map(TaskRecord::duration_days).unwrap_or(0)
}

//! tg graph query commands.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::cli::read_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::relationship::RelationshipStore;
use crate::schedule;
use crate::task::{TaskRecord, TaskStore};

pub struct QueryOptions {
    pub id: String,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ChainReport {
    root: String,
    chain: Vec<String>,
}

pub fn run_chain(opts: QueryOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let root = tasks.resolve_id(&opts.id)?;
    let snapshot = relationships.snapshot()?;
    let chain = snapshot.dependency_chain(&root);

    let mut human = HumanOutput::new(format!(
        "tg graph chain: {} dependency(ies) reachable from {root}",
        chain.len()
    ));
    for id in &chain {
        human.push_detail(id.clone());
    }

    let report = ChainReport { root, chain };
    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "graph chain",
        &report,
        Some(&human),
    )
}

pub fn run_tree(opts: QueryOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let root = tasks.resolve_id(&opts.id)?;
    let snapshot = relationships.snapshot()?;
    let tree = snapshot.hierarchy_tree(&root);

    let mut human = HumanOutput::new(format!("tg graph tree: {root}"));
    push_tree_lines(&mut human, &tree, 0);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "graph tree",
        &tree,
        Some(&human),
    )
}

fn push_tree_lines(human: &mut HumanOutput, node: &crate::graph::TreeNode, depth: usize) {
    human.push_detail(format!("{}{}", "  ".repeat(depth), node.id));
    for child in &node.children {
        push_tree_lines(human, child, depth + 1);
    }
}

#[derive(serde::Serialize)]
struct BlockingReport {
    task: String,
    blocking_set: Vec<String>,
}

pub fn run_blocking(opts: QueryOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let task = tasks.resolve_id(&opts.id)?;
    let snapshot = relationships.snapshot()?;
    let blocking_set = snapshot.blocking_set(&task);

    let mut human = HumanOutput::new(format!(
        "tg graph blocking: {} task(s) in the blocking set of {task}",
        blocking_set.len()
    ));
    for id in &blocking_set {
        human.push_detail(id.clone());
    }

    let report = BlockingReport { task, blocking_set };
    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "graph blocking",
        &report,
        Some(&human),
    )
}

pub fn run_critical_path(opts: QueryOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let root = tasks.resolve_id(&opts.id)?;
    let snapshot = relationships.snapshot()?;
    let by_id: HashMap<String, TaskRecord> = tasks
        .all()?
        .into_iter()
        .map(|task| (task.id.clone(), task))
        .collect();

    let result = schedule::critical_path(&snapshot, &by_id, &root);

    let mut human = HumanOutput::new(format!(
        "tg graph critical-path: {} day(s) from {root}",
        result.duration_days
    ));
    for id in &result.path {
        human.push_detail(id.clone());
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "graph critical-path",
        &result,
        Some(&human),
    )
}

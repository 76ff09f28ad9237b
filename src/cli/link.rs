//! tg link command implementations.

use std::path::PathBuf;

use crate::activity::{ActivityKind, ActivityLog, ActivityRecord};
use crate::cli::{context, read_context};
use crate::error::Result;
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::relationship::{
    NewRelationship, RelationKind, RelationMetadata, RelationshipStore,
};
use crate::task::TaskStore;

pub struct AddOptions {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub description: Option<String>,
    pub delay_days: Option<i64>,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub id: String,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub task: String,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let kind = RelationKind::parse(&opts.kind)?;
    let source = tasks.resolve_id(&opts.source)?;
    let target = tasks.resolve_id(&opts.target)?;

    let metadata = RelationMetadata {
        description: opts.description,
        delay_days: opts.delay_days,
        ..Default::default()
    };

    let record = relationships.create(
        &tasks,
        NewRelationship {
            source_task_id: source.clone(),
            target_task_id: target.clone(),
            kind,
            metadata: Some(metadata),
        },
    )?;

    activity.append(
        &ActivityRecord::new(ActivityKind::RelationshipAdded, &source)
            .with_actor(ctx.actor.clone())
            .with_detail(format!("{kind} {target}")),
    )?;
    ctx.emit(
        Event::new(EventKind::RelationshipCreated, ctx.actor.clone()).with_data(
            serde_json::json!({
                "relationship_id": record.id,
                "source_task_id": source,
                "target_task_id": target,
                "kind": kind,
            }),
        )?,
    )?;

    let mut human = HumanOutput::new(format!("tg link add: {source} {kind} {target}"));
    human.push_summary("id", record.id.clone());

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "link add",
        &record,
        Some(&human),
    )
}

pub fn run_rm(opts: RmOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let relationships = RelationshipStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let removed = relationships.remove(&opts.id)?;

    activity.append(
        &ActivityRecord::new(ActivityKind::RelationshipRemoved, &removed.source_task_id)
            .with_actor(ctx.actor.clone())
            .with_detail(format!("{} {}", removed.kind, removed.target_task_id)),
    )?;
    ctx.emit(
        Event::new(EventKind::RelationshipRemoved, ctx.actor.clone()).with_data(
            serde_json::json!({
                "relationship_id": removed.id,
                "source_task_id": removed.source_task_id,
                "target_task_id": removed.target_task_id,
            }),
        )?,
    )?;

    let human = HumanOutput::new(format!(
        "tg link rm: removed {} {} {}",
        removed.source_task_id, removed.kind, removed.target_task_id
    ));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "link rm",
        &removed,
        Some(&human),
    )
}

pub fn run_list(opts: ListOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let id = tasks.resolve_id(&opts.task)?;
    tasks.get(&id)?;
    let links = relationships.for_task(&id)?;

    let mut human = HumanOutput::new(format!(
        "tg link list: {} outgoing, {} incoming",
        links.outgoing.len(),
        links.incoming.len()
    ));
    for edge in &links.outgoing {
        human.push_detail(format!("{} {} {}", edge.id, edge.kind, edge.target_task_id));
    }
    for edge in &links.incoming {
        human.push_detail(format!(
            "{} {} from {}",
            edge.id, edge.kind, edge.source_task_id
        ));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "link list",
        &links,
        Some(&human),
    )
}

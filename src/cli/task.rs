//! tg task command implementations.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::activity::{ActivityKind, ActivityLog, ActivityRecord};
use crate::cli::{context, read_context};
use crate::error::{Error, Result};
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::priority::Priority;
use crate::relationship::{RelationshipStore, TaskLinks};
use crate::rollup::{self, RollupReport};
use crate::task::{NewTask, TaskFilter, TaskRecord, TaskStatus, TaskStore};

pub struct NewOptions {
    pub title: String,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub project: Option<String>,
    pub assignee: Option<String>,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub project: Option<String>,
    pub limit: Option<usize>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct AssignOptions {
    pub id: String,
    pub assignee: String,
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

pub fn run_new(opts: NewOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let priority = opts.priority.as_deref().map(Priority::parse).transpose()?;
    let record = tasks.create(NewTask {
        title: opts.title,
        priority,
        due_date: opts.due.as_deref().map(parse_date).transpose()?,
        start_date: opts.start.as_deref().map(parse_date).transpose()?,
        end_date: opts.end.as_deref().map(parse_date).transpose()?,
        project: opts.project,
        assignee: opts.assignee,
    })?;

    activity.append(
        &ActivityRecord::new(ActivityKind::Created, &record.id).with_actor(ctx.actor.clone()),
    )?;
    ctx.emit(
        Event::new(EventKind::TaskCreated, ctx.actor.clone())
            .with_data(serde_json::json!({ "task_id": record.id, "title": record.title }))?,
    )?;

    let mut human = HumanOutput::new(format!("tg task new: created {}", record.id));
    human.push_summary("title", record.title.clone());
    human.push_summary("status", record.status.to_string());
    human.push_summary("priority", record.priority.to_string());
    if let Some(project) = &record.project {
        human.push_summary("project", project.clone());
    }
    human.push_next_step(format!("tg task show {}", record.id));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task new",
        &record,
        Some(&human),
    )
}

pub fn run_list(opts: ListOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());

    let filter = TaskFilter {
        status: opts.status.as_deref().map(TaskStatus::parse).transpose()?,
        project: opts.project,
        limit: opts.limit,
    };
    let records = tasks.list(&filter)?;

    let mut human = HumanOutput::new(format!("tg task list: {} task(s)", records.len()));
    for record in &records {
        human.push_detail(format!(
            "{} [{}/{}] {}% {}",
            record.id, record.status, record.priority, record.progress, record.title
        ));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task list",
        &records,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct TaskDetails {
    task: TaskRecord,
    links: TaskLinks,
    activity: Vec<ActivityRecord>,
}

pub fn run_show(opts: ShowOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let id = tasks.resolve_id(&opts.id)?;
    let task = tasks.get(&id)?;
    let links = relationships.for_task(&id)?;
    let log = activity.for_task(&id)?;

    let mut human = HumanOutput::new(format!("{}: {}", task.id, task.title));
    human.push_summary("status", task.status.to_string());
    human.push_summary("priority", task.priority.to_string());
    human.push_summary("progress", format!("{}%", task.progress));
    if let Some(project) = &task.project {
        human.push_summary("project", project.clone());
    }
    if let Some(assignee) = &task.assignee {
        human.push_summary("assignee", assignee.clone());
    }
    if let Some(due) = task.due_date {
        human.push_summary("due", due.to_rfc3339());
    }
    for edge in &links.outgoing {
        human.push_detail(format!("{} {} {}", edge.id, edge.kind, edge.target_task_id));
    }
    for edge in &links.incoming {
        human.push_detail(format!("{} {} from {}", edge.id, edge.kind, edge.source_task_id));
    }

    let details = TaskDetails {
        task,
        links,
        activity: log,
    };

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task show",
        &details,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct StatusReport {
    task: TaskRecord,
    rollup: RollupReport,
}

pub fn run_status(opts: StatusOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let id = tasks.resolve_id(&opts.id)?;
    let status = TaskStatus::parse(&opts.status)?;
    let before = tasks.get(&id)?;

    let updated = tasks.update(&id, |task| {
        task.status = status;
        // Terminal statuses pin progress; intermediate ones leave it alone
        match status {
            TaskStatus::Done => task.progress = 100,
            TaskStatus::Todo => task.progress = 0,
            TaskStatus::InProgress | TaskStatus::Cancelled => {}
        }
        Ok(())
    })?;

    activity.append(
        &ActivityRecord::new(ActivityKind::StatusChanged, &id)
            .with_actor(ctx.actor.clone())
            .with_detail(format!("{} -> {}", before.status, status)),
    )?;

    let rollup = rollup::recompute_progress(&tasks, &relationships, &id)?;

    ctx.emit(
        Event::new(EventKind::TaskStatusChanged, ctx.actor.clone()).with_data(
            serde_json::json!({
                "task_id": id,
                "from": before.status,
                "to": status,
            }),
        )?,
    )?;

    let mut human = HumanOutput::new(format!("tg task status: {} -> {}", id, status));
    for change in &rollup.updated {
        human.push_detail(format!(
            "rolled up {}: {}% {}",
            change.task_id, change.progress, change.status
        ));
    }

    let report = StatusReport {
        task: updated,
        rollup,
    };

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task status",
        &report,
        Some(&human),
    )
}

pub fn run_assign(opts: AssignOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let activity = ActivityLog::new(ctx.storage.clone());

    let id = tasks.resolve_id(&opts.id)?;
    let assignee = opts.assignee.trim().to_string();
    if assignee.is_empty() {
        return Err(Error::InvalidArgument("assignee cannot be empty".to_string()));
    }

    let updated = tasks.update(&id, |task| {
        task.assignee = Some(assignee.clone());
        Ok(())
    })?;

    activity.append(
        &ActivityRecord::new(ActivityKind::Assigned, &id)
            .with_actor(ctx.actor.clone())
            .with_detail(assignee.clone()),
    )?;
    ctx.emit(
        Event::new(EventKind::TaskAssigned, ctx.actor.clone())
            .with_data(serde_json::json!({ "task_id": id, "assignee": assignee }))?,
    )?;

    let human = HumanOutput::new(format!("tg task assign: {} -> {}", id, assignee));
    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task assign",
        &updated,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct RmReport {
    task: TaskRecord,
    removed_relationships: usize,
}

pub fn run_rm(opts: RmOptions) -> Result<()> {
    let ctx = context(opts.repo, opts.actor, opts.events)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let relationships = RelationshipStore::new(ctx.storage.clone());

    let id = tasks.resolve_id(&opts.id)?;
    let task = tasks.remove(&id)?;
    // Cascade: a deleted task must not leave dangling edges behind
    let removed_relationships = relationships.remove_for_task(&id)?;

    ctx.emit(
        Event::new(EventKind::TaskRemoved, ctx.actor.clone()).with_data(serde_json::json!({
            "task_id": id,
            "removed_relationships": removed_relationships,
        }))?,
    )?;

    let mut human = HumanOutput::new(format!("tg task rm: removed {}", id));
    human.push_summary("relationships removed", removed_relationships.to_string());

    let report = RmReport {
        task,
        removed_relationships,
    };

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task rm",
        &report,
        Some(&human),
    )
}

/// Parse a date as `YYYY-MM-DD` (midnight UTC) or full RFC 3339.
fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(Error::InvalidArgument(format!(
        "invalid date '{trimmed}' (expected YYYY-MM-DD or RFC 3339)"
    )))
}

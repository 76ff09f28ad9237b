//! tg rule command implementations.

use std::path::PathBuf;

use crate::cli::{context, read_context};
use crate::error::{Error, Result};
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::priority::Priority;
use crate::rules::{
    DependencyClause, DueDateClause, InactivityClause, RuleConditions, RuleStore,
};

pub struct AddOptions {
    pub project: String,
    pub due_days: Option<i64>,
    pub due_priority: Option<String>,
    pub dep_priority: Option<String>,
    pub dep_escalate: bool,
    pub inactive_days: Option<i64>,
    pub inactive_priority: Option<String>,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub project: String,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ToggleOptions {
    pub id: String,
    pub enabled: bool,
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let ctx = context(opts.repo, None, opts.events)?;
    let rules = RuleStore::new(ctx.storage.clone());

    let conditions = build_conditions(
        opts.due_days,
        opts.due_priority.as_deref(),
        opts.dep_priority.as_deref(),
        opts.dep_escalate,
        opts.inactive_days,
        opts.inactive_priority.as_deref(),
    )?;

    let record = rules.create(&opts.project, conditions)?;

    ctx.emit(
        Event::new(EventKind::RuleCreated, ctx.actor.clone()).with_data(serde_json::json!({
            "rule_id": record.id,
            "project": record.project,
        }))?,
    )?;

    let mut human = HumanOutput::new(format!("tg rule add: created {}", record.id));
    human.push_summary("project", record.project.clone());
    human.push_detail(describe_conditions(&conditions));
    human.push_next_step("tg sweep".to_string());

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "rule add",
        &record,
        Some(&human),
    )
}

pub fn run_list(opts: ListOptions) -> Result<()> {
    let ctx = read_context(opts.repo)?;
    let rules = RuleStore::new(ctx.storage.clone());

    let records = rules.for_project(&opts.project)?;

    let mut human = HumanOutput::new(format!(
        "tg rule list: {} rule(s) for {}",
        records.len(),
        opts.project
    ));
    for record in &records {
        let state = if record.enabled { "enabled" } else { "disabled" };
        match RuleConditions::from_value(&record.conditions) {
            Ok(conditions) => human.push_detail(format!(
                "{} [{state}] {}",
                record.id,
                describe_conditions(&conditions)
            )),
            Err(_) => {
                human.push_detail(format!("{} [{state}] (malformed conditions)", record.id));
                human.push_warning(format!(
                    "rule {} has malformed conditions and is skipped by sweeps",
                    record.id
                ));
            }
        }
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "rule list",
        &records,
        Some(&human),
    )
}

pub fn run_toggle(opts: ToggleOptions) -> Result<()> {
    let ctx = context(opts.repo, None, opts.events)?;
    let rules = RuleStore::new(ctx.storage.clone());

    let record = rules.set_enabled(&opts.id, opts.enabled)?;

    ctx.emit(
        Event::new(EventKind::RuleUpdated, ctx.actor.clone()).with_data(serde_json::json!({
            "rule_id": record.id,
            "enabled": record.enabled,
        }))?,
    )?;

    let verb = if opts.enabled { "enabled" } else { "disabled" };
    let human = HumanOutput::new(format!("tg rule {verb}: {}", record.id));

    let command = if opts.enabled { "rule enable" } else { "rule disable" };
    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        command,
        &record,
        Some(&human),
    )
}

fn build_conditions(
    due_days: Option<i64>,
    due_priority: Option<&str>,
    dep_priority: Option<&str>,
    dep_escalate: bool,
    inactive_days: Option<i64>,
    inactive_priority: Option<&str>,
) -> Result<RuleConditions> {
    let mut conditions = RuleConditions::default();

    match (due_days, due_priority) {
        (Some(days), Some(priority)) => {
            conditions.due_date = Some(DueDateClause {
                days,
                priority: Priority::parse(priority)?,
            });
        }
        (None, None) => {}
        _ => {
            return Err(Error::InvalidArgument(
                "--due-days and --due-priority go together".to_string(),
            ));
        }
    }

    if let Some(priority) = dep_priority {
        conditions.dependencies = Some(DependencyClause {
            priority: Priority::parse(priority)?,
            escalate: dep_escalate,
        });
    } else if dep_escalate {
        return Err(Error::InvalidArgument(
            "--dep-escalate requires --dep-priority".to_string(),
        ));
    }

    match (inactive_days, inactive_priority) {
        (Some(days), Some(priority)) => {
            conditions.inactivity = Some(InactivityClause {
                days,
                priority: Priority::parse(priority)?,
            });
        }
        (None, None) => {}
        _ => {
            return Err(Error::InvalidArgument(
                "--inactive-days and --inactive-priority go together".to_string(),
            ));
        }
    }

    Ok(conditions)
}

fn describe_conditions(conditions: &RuleConditions) -> String {
    let mut parts = Vec::new();
    if let Some(clause) = conditions.due_date {
        parts.push(format!("due within {}d -> {}", clause.days, clause.priority));
    }
    if let Some(clause) = conditions.dependencies {
        let state = if clause.escalate { "on" } else { "off" };
        parts.push(format!("dependency >= {} ({state})", clause.priority));
    }
    if let Some(clause) = conditions.inactivity {
        parts.push(format!(
            "inactive > {}d -> {}",
            clause.days, clause.priority
        ));
    }
    parts.join(", ")
}

//! Priority escalation sweep.
//!
//! One sweep evaluates every enabled rule against every non-done task of its
//! project. Clauses are evaluated in document order (due date, dependencies,
//! inactivity) across rules in creation order; when several clauses stage an
//! escalation for the same task, the last staged value wins. Every staged
//! value exceeds the task's current level, so a sweep never lowers priority.
//!
//! Failures are isolated: an unparseable rule or a failed write for one task
//! is logged and skipped while the sweep continues. The external scheduler
//! is responsible for not running two sweeps concurrently.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use crate::activity::{ActivityKind, ActivityLog, ActivityRecord, NotificationKind, NotificationRecord, NotificationStore};
use crate::config::Config;
use crate::error::Result;
use crate::priority::Priority;
use crate::relationship::RelationshipStore;
use crate::rules::{PriorityRuleRecord, RuleConditions, RuleStore};
use crate::storage::Storage;
use crate::task::{TaskRecord, TaskStatus, TaskStore};

/// One applied escalation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EscalationRecord {
    pub task_id: String,
    pub from: Priority,
    pub to: Priority,
    pub rule_id: String,
    pub notified: bool,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub tasks_examined: usize,
    pub escalations: Vec<EscalationRecord>,
    pub rules_skipped: usize,
    pub tasks_failed: usize,
}

/// Run one escalation sweep at the given instant.
///
/// `now` is injected so scheduled invocations and tests share one code path.
pub fn run_sweep(storage: &Storage, config: &Config, now: DateTime<Utc>) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    if !config.escalation.enabled {
        return Ok(report);
    }

    let tasks = TaskStore::new(storage.clone());
    let relationships = RelationshipStore::new(storage.clone());
    let rules = RuleStore::new(storage.clone());
    let activity = ActivityLog::new(storage.clone());
    let notifications = NotificationStore::new(storage.clone());

    let mut rules_by_project: HashMap<String, Vec<(PriorityRuleRecord, RuleConditions)>> =
        HashMap::new();
    for rule in rules.all()? {
        if !rule.enabled {
            continue;
        }
        match RuleConditions::from_value(&rule.conditions) {
            Ok(conditions) => {
                rules_by_project
                    .entry(rule.project.clone())
                    .or_default()
                    .push((rule, conditions));
            }
            Err(err) => {
                warn!(rule_id = %rule.id, error = %err, "skipping rule with malformed conditions");
                report.rules_skipped += 1;
            }
        }
    }
    if rules_by_project.is_empty() {
        return Ok(report);
    }

    let snapshot = relationships.snapshot()?;
    let all_tasks = tasks.all()?;
    let by_id: HashMap<String, TaskRecord> = all_tasks
        .iter()
        .map(|task| (task.id.clone(), task.clone()))
        .collect();
    let last_activity = activity.latest_by_task()?;

    for task in &all_tasks {
        if task.status == TaskStatus::Done {
            continue;
        }
        let Some(project) = task.project.as_deref() else {
            continue;
        };
        let Some(project_rules) = rules_by_project.get(project) else {
            continue;
        };
        report.tasks_examined += 1;

        let current = task.priority;
        let mut staged: Option<(Priority, String)> = None;

        for (rule, conditions) in project_rules {
            if let Some(clause) = conditions.due_date {
                if let Some(due) = task.due_date {
                    let days_left = (due - now).num_days();
                    if days_left <= clause.days && clause.priority.level() > current.level() {
                        staged = Some((clause.priority, rule.id.clone()));
                    }
                }
            }

            if let Some(clause) = conditions.dependencies {
                if clause.escalate && current.auto_escalation() {
                    for dep_id in snapshot.dependencies_of(&task.id) {
                        // A dependency deleted mid-sweep just doesn't match
                        let Some(dep) = by_id.get(dep_id) else {
                            continue;
                        };
                        if dep.priority.level() >= clause.priority.level() {
                            let bumped = current.escalated();
                            if bumped.level() > current.level() {
                                staged = Some((bumped, rule.id.clone()));
                            }
                        }
                    }
                }
            }

            if let Some(clause) = conditions.inactivity {
                let last = last_activity
                    .get(&task.id)
                    .copied()
                    .unwrap_or(task.updated_at);
                if now - last > Duration::days(clause.days)
                    && clause.priority.level() > current.level()
                {
                    staged = Some((clause.priority, rule.id.clone()));
                }
            }
        }

        if let Some((to, rule_id)) = staged {
            match apply_escalation(&tasks, &activity, &notifications, config, task, to, &rule_id) {
                Ok(applied) => report.escalations.push(applied),
                Err(err) => {
                    warn!(task_id = %task.id, error = %err, "escalation failed; continuing sweep");
                    report.tasks_failed += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Persist one escalation: priority update, activity entry, and notification
/// when the task has an assignee. The three writes belong to one task; a
/// failure aborts only this task's escalation.
fn apply_escalation(
    tasks: &TaskStore,
    activity: &ActivityLog,
    notifications: &NotificationStore,
    config: &Config,
    task: &TaskRecord,
    to: Priority,
    rule_id: &str,
) -> Result<EscalationRecord> {
    let from = task.priority;

    tasks.update(&task.id, |record| {
        record.priority = to;
        Ok(())
    })?;

    activity.append(
        &ActivityRecord::new(ActivityKind::PriorityEscalated, &task.id)
            .with_detail(format!("{from} -> {to}")),
    )?;

    let mut notified = false;
    if config.escalation.notify_assignee {
        if let Some(assignee) = &task.assignee {
            notifications.append(&NotificationRecord::new(
                NotificationKind::PriorityEscalated,
                &task.id,
                assignee,
                format!("Priority of '{}' escalated to {}", task.title, to),
            ))?;
            notified = true;
        }
    }

    Ok(EscalationRecord {
        task_id: task.id.clone(),
        from,
        to,
        rule_id: rule_id.to_string(),
        notified,
    })
}

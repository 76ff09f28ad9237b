//! tg sweep command implementation.
//!
//! One invocation runs one full escalation sweep; a cron-like scheduler is
//! expected to call this on an interval and to serialize invocations.

use std::path::PathBuf;

use chrono::Utc;

use crate::cli::context;
use crate::error::Result;
use crate::escalation;
use crate::events::{Event, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct SweepOptions {
    pub events: Option<String>,
    pub repo: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(opts: SweepOptions) -> Result<()> {
    let ctx = context(opts.repo, None, opts.events)?;

    let report = escalation::run_sweep(&ctx.storage, &ctx.config, Utc::now())?;

    for escalation in &report.escalations {
        ctx.emit(
            Event::new(EventKind::TaskEscalated, None).with_data(serde_json::json!({
                "task_id": escalation.task_id,
                "from": escalation.from,
                "to": escalation.to,
                "rule_id": escalation.rule_id,
            }))?,
        )?;
    }
    ctx.emit(Event::new(EventKind::SweepCompleted, None).with_data(serde_json::json!({
        "tasks_examined": report.tasks_examined,
        "escalations": report.escalations.len(),
        "rules_skipped": report.rules_skipped,
    }))?)?;

    let mut human = HumanOutput::new(format!(
        "tg sweep: {} escalation(s) across {} task(s)",
        report.escalations.len(),
        report.tasks_examined
    ));
    for escalation in &report.escalations {
        human.push_detail(format!(
            "{}: {} -> {}",
            escalation.task_id, escalation.from, escalation.to
        ));
    }
    if report.rules_skipped > 0 {
        human.push_warning(format!(
            "{} rule(s) skipped due to malformed conditions",
            report.rules_skipped
        ));
    }
    if report.tasks_failed > 0 {
        human.push_warning(format!(
            "{} task escalation(s) failed and were skipped",
            report.tasks_failed
        ));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "sweep",
        &report,
        Some(&human),
    )
}

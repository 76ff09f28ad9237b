//! Command-line interface for tg
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventDestination};
use crate::storage::Storage;

mod graph;
mod init;
mod link;
mod rule;
mod sweep;
mod task;

/// tg - Task Relationship Graph
///
/// A CLI that maintains typed relationships between tasks and derives cycle
/// safety, critical paths, progress rollups, and priority escalation from
/// the graph.
#[derive(Parser, Debug)]
#[command(name = "tg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the workspace (defaults to current directory)
    #[arg(long, global = true, env = "TG_REPO")]
    pub repo: Option<PathBuf>,

    /// Actor identity recorded in activity entries
    #[arg(long, global = true, env = "TG_ACTOR")]
    pub actor: Option<String>,

    /// Emit integration events to a file, or "-" for stdout
    #[arg(long, global = true, env = "TG_EVENTS")]
    pub events: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a taskgraph workspace
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Relationship management
    #[command(subcommand)]
    Link(LinkCommands),

    /// Graph queries (chains, trees, blocking sets, critical paths)
    #[command(subcommand)]
    Graph(GraphCommands),

    /// Priority escalation rules
    #[command(subcommand)]
    Rule(RuleCommands),

    /// Run one priority escalation sweep
    Sweep,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        /// Priority: low, medium, high, urgent, critical
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end: Option<String>,

        /// Owning project
        #[arg(long)]
        project: Option<String>,

        /// Assignee
        #[arg(long)]
        assignee: Option<String>,
    },

    /// List tasks
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by project
        #[arg(long)]
        project: Option<String>,

        /// Maximum tasks to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one task with its relationships and activity
    Show {
        /// Task id (or unambiguous prefix)
        id: String,
    },

    /// Set task status and roll progress up the parent chain
    Status {
        /// Task id (or unambiguous prefix)
        id: String,

        /// New status: todo, in_progress, done, cancelled
        status: String,
    },

    /// Assign a task
    Assign {
        /// Task id (or unambiguous prefix)
        id: String,

        /// Assignee
        assignee: String,
    },

    /// Remove a task and every relationship touching it
    Rm {
        /// Task id (or unambiguous prefix)
        id: String,
    },
}

/// Relationship subcommands
#[derive(Subcommand, Debug)]
pub enum LinkCommands {
    /// Create a relationship between two tasks
    Add {
        /// Source task id
        source: String,

        /// Target task id
        target: String,

        /// Kind: blocks, blocked_by, depends_on, required_for, related_to,
        /// duplicates, duplicated_by, parent_child
        #[arg(long, required = true)]
        kind: String,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Delay in days carried by the edge
        #[arg(long)]
        delay_days: Option<i64>,
    },

    /// Delete a relationship by id
    Rm {
        /// Relationship id
        id: String,
    },

    /// List relationships touching a task
    List {
        /// Task id (or unambiguous prefix)
        task: String,
    },
}

/// Graph query subcommands
#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Transitive dependency chain from a task
    Chain {
        /// Root task id (or unambiguous prefix)
        id: String,
    },

    /// Parent/child hierarchy rooted at a task
    Tree {
        /// Root task id (or unambiguous prefix)
        id: String,
    },

    /// Tasks blocking or blocked by a task (one hop)
    Blocking {
        /// Task id (or unambiguous prefix)
        id: String,
    },

    /// Longest duration-weighted dependency chain from a task
    CriticalPath {
        /// Root task id (or unambiguous prefix)
        id: String,
    },
}

/// Priority rule subcommands
#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// Add a rule to a project
    Add {
        /// Project the rule applies to
        project: String,

        /// Due-date clause: trigger within this many days of the due date
        #[arg(long)]
        due_days: Option<i64>,

        /// Due-date clause: priority to escalate to
        #[arg(long)]
        due_priority: Option<String>,

        /// Dependency clause: reference priority a dependency must meet
        #[arg(long)]
        dep_priority: Option<String>,

        /// Dependency clause: enable one-level escalation
        #[arg(long)]
        dep_escalate: bool,

        /// Inactivity clause: trigger after this many days without activity
        #[arg(long)]
        inactive_days: Option<i64>,

        /// Inactivity clause: priority to escalate to
        #[arg(long)]
        inactive_priority: Option<String>,
    },

    /// List rules for a project
    List {
        /// Project
        project: String,
    },

    /// Enable a rule
    Enable {
        /// Rule id
        id: String,
    },

    /// Disable a rule
    Disable {
        /// Rule id
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(self.repo, self.json, self.quiet),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    priority,
                    due,
                    start,
                    end,
                    project,
                    assignee,
                } => task::run_new(task::NewOptions {
                    title,
                    priority,
                    due,
                    start,
                    end,
                    project,
                    assignee,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::List {
                    status,
                    project,
                    limit,
                } => task::run_list(task::ListOptions {
                    status,
                    project,
                    limit,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Status { id, status } => task::run_status(task::StatusOptions {
                    id,
                    status,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Assign { id, assignee } => task::run_assign(task::AssignOptions {
                    id,
                    assignee,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Link(cmd) => match cmd {
                LinkCommands::Add {
                    source,
                    target,
                    kind,
                    description,
                    delay_days,
                } => link::run_add(link::AddOptions {
                    source,
                    target,
                    kind,
                    description,
                    delay_days,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                LinkCommands::Rm { id } => link::run_rm(link::RmOptions {
                    id,
                    actor: self.actor,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                LinkCommands::List { task } => link::run_list(link::ListOptions {
                    task,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Graph(cmd) => match cmd {
                GraphCommands::Chain { id } => graph::run_chain(graph::QueryOptions {
                    id,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                GraphCommands::Tree { id } => graph::run_tree(graph::QueryOptions {
                    id,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                GraphCommands::Blocking { id } => graph::run_blocking(graph::QueryOptions {
                    id,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                GraphCommands::CriticalPath { id } => {
                    graph::run_critical_path(graph::QueryOptions {
                        id,
                        repo: self.repo,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
            Commands::Rule(cmd) => match cmd {
                RuleCommands::Add {
                    project,
                    due_days,
                    due_priority,
                    dep_priority,
                    dep_escalate,
                    inactive_days,
                    inactive_priority,
                } => rule::run_add(rule::AddOptions {
                    project,
                    due_days,
                    due_priority,
                    dep_priority,
                    dep_escalate,
                    inactive_days,
                    inactive_priority,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                RuleCommands::List { project } => rule::run_list(rule::ListOptions {
                    project,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                RuleCommands::Enable { id } => rule::run_toggle(rule::ToggleOptions {
                    id,
                    enabled: true,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
                RuleCommands::Disable { id } => rule::run_toggle(rule::ToggleOptions {
                    id,
                    enabled: false,
                    events: self.events,
                    repo: self.repo,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Sweep => sweep::run(sweep::SweepOptions {
                events: self.events,
                repo: self.repo,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

/// Shared command context: opened storage, loaded config, resolved actor.
pub(crate) struct CommandContext {
    pub storage: Storage,
    pub config: Config,
    pub actor: Option<String>,
    pub events: Option<EventDestination>,
}

pub(crate) fn context(
    repo: Option<PathBuf>,
    actor: Option<String>,
    events: Option<String>,
) -> Result<CommandContext> {
    let root = match repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let storage = Storage::open(root)?;
    let config = Config::load_from_root(&storage.root().to_path_buf());

    let actor = actor.or_else(|| {
        let default = config.actor.default.trim();
        if default.is_empty() || default == "unknown" {
            None
        } else {
            Some(default.to_string())
        }
    });

    Ok(CommandContext {
        storage,
        config,
        actor,
        events: EventDestination::parse(events.as_deref()),
    })
}

/// Read-only variant of `context` for query commands.
pub(crate) fn read_context(repo: Option<PathBuf>) -> Result<CommandContext> {
    context(repo, None, None)
}

impl CommandContext {
    /// Emit an integration event when a destination is configured.
    pub fn emit(&self, event: Event) -> Result<()> {
        if let Some(destination) = &self.events {
            destination.open()?.emit(&event)?;
        }
        Ok(())
    }
}

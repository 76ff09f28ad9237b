//! taskgraph - Task Relationship Graph Engine
//!
//! This library provides the core functionality for the `tg` CLI, which
//! maintains directed, typed relationships between tasks and derives
//! aggregate properties from the resulting graph.
//!
//! # Core Concepts
//!
//! - **Relationships**: Directed, typed edges between tasks (dependencies,
//!   blocking, parent/child, duplication, relation)
//! - **Cycle Safety**: `depends_on` edges are gated by a transitive cycle
//!   check before they are persisted
//! - **Critical Path**: The longest duration-weighted dependency chain from
//!   a root task
//! - **Progress Rollup**: Parent progress and status derived from child
//!   statuses, propagated upward
//! - **Priority Escalation**: Declarative per-project rules evaluated by a
//!   scheduled sweep
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskgraph.toml`
//! - `error`: Error types and result aliases
//! - `storage`: File storage and data-directory layout
//! - `lock`: File locking and atomic writes for concurrency safety
//! - `task`: Task records and the task registry
//! - `priority`: Priority names and the static level table
//! - `relationship`: Edge records, validation gate, and persistence
//! - `graph`: Edge snapshots, cycle detection, and traversals
//! - `schedule`: Critical path calculation
//! - `rollup`: Progress rollup over parent/child edges
//! - `rules`: Priority rule records and clause parsing
//! - `escalation`: The escalation sweep
//! - `activity`: Activity log and notification records
//! - `events`: Integration event emission
//! - `output`: Human/JSON output envelopes

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod graph;
pub mod lock;
pub mod output;
pub mod priority;
pub mod relationship;
pub mod rollup;
pub mod rules;
pub mod schedule;
pub mod storage;
pub mod task;

pub use error::{Error, Result};

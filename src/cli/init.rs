//! tg init command implementation
//!
//! Creates the `.taskgraph/` data directory and a default configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    data_dir: bool,
}

pub fn run(repo: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let root = match repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let storage = Storage::new(root.clone());
    let created_data_dir = !storage.is_initialized();
    storage.init_all()?;

    let config_path = storage.config_file();
    let created_config = !config_path.exists();
    if created_config {
        Config::default().save(&config_path)?;
    }

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            config: created_config,
            data_dir: created_data_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(".taskgraph.toml");
    }
    if created_data_dir {
        created_items.push(".taskgraph/");
    }

    let header = if created_items.is_empty() {
        "tg init: nothing to do".to_string()
    } else {
        "tg init: initialized workspace".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("tg task new \"<title>\"");
    human.push_next_step("tg link add <source> <target> --kind depends_on");

    emit_success(OutputOptions { json, quiet }, "init", &report, Some(&human))?;

    Ok(())
}

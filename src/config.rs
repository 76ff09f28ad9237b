//! Configuration loading and management
//!
//! Handles parsing of `.taskgraph.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Escalation sweep configuration
    #[serde(default)]
    pub escalation: EscalationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            actor: ActorConfig::default(),
            escalation: EscalationConfig::default(),
        }
    }
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Default actor name when none specified
    #[serde(default = "default_actor")]
    pub default: String,
}

fn default_actor() -> String {
    "unknown".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: default_actor(),
        }
    }
}

/// Escalation sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Global switch for the escalation sweep
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Create a notification record when an escalated task has an assignee
    #[serde(default = "default_true")]
    pub notify_assignee: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notify_assignee: true,
        }
    }
}

impl Config {
    /// Load configuration from a `.taskgraph.toml` file
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the workspace root, or return defaults
    pub fn load_from_root(root: &PathBuf) -> Self {
        let config_path = root.join(crate::storage::CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.actor.default.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "actor.default cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

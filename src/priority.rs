//! Task priorities and the process-wide level table.
//!
//! Priorities map to numeric levels 1-5. The table is static configuration
//! constructed once at compile time; nothing in the engine mutates it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The highest priority level
pub const MAX_PRIORITY_LEVEL: u8 = 5;

/// Task priority, ordered by level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    Critical,
}

/// One entry of the static priority table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PriorityLevel {
    pub name: &'static str,
    pub level: u8,
    pub color: &'static str,
    pub auto_escalation: bool,
}

/// Fixed mapping from priority name to level, display color, and whether the
/// escalation engine may raise a task beyond it.
pub static PRIORITY_LEVELS: [PriorityLevel; 5] = [
    PriorityLevel {
        name: "low",
        level: 1,
        color: "#6b7280",
        auto_escalation: true,
    },
    PriorityLevel {
        name: "medium",
        level: 2,
        color: "#3b82f6",
        auto_escalation: true,
    },
    PriorityLevel {
        name: "high",
        level: 3,
        color: "#f59e0b",
        auto_escalation: true,
    },
    PriorityLevel {
        name: "urgent",
        level: 4,
        color: "#ef4444",
        auto_escalation: true,
    },
    PriorityLevel {
        name: "critical",
        level: 5,
        color: "#991b1b",
        auto_escalation: false,
    },
];

impl Priority {
    /// Numeric level, 1-5
    pub fn level(self) -> u8 {
        self.entry().level
    }

    /// Priority name as stored and displayed
    pub fn as_str(self) -> &'static str {
        self.entry().name
    }

    /// Display color from the level table
    pub fn color(self) -> &'static str {
        self.entry().color
    }

    /// Whether the escalation engine may raise a task above this priority
    pub fn auto_escalation(self) -> bool {
        self.entry().auto_escalation
    }

    /// Priority for a numeric level, clamped to the valid range
    pub fn from_level(level: u8) -> Priority {
        match level {
            0 | 1 => Priority::Low,
            2 => Priority::Medium,
            3 => Priority::High,
            4 => Priority::Urgent,
            _ => Priority::Critical,
        }
    }

    /// One level up, capped at the maximum
    pub fn escalated(self) -> Priority {
        Priority::from_level(self.level().saturating_add(1).min(MAX_PRIORITY_LEVEL))
    }

    /// Parse a priority name (case-insensitive)
    pub fn parse(value: &str) -> Result<Priority> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("priority cannot be empty".to_string()));
        }
        let lowered = trimmed.to_ascii_lowercase();
        match lowered.as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            "critical" => Ok(Priority::Critical),
            _ => Err(Error::InvalidArgument(format!(
                "unknown priority '{trimmed}' (expected low|medium|high|urgent|critical)"
            ))),
        }
    }

    fn entry(self) -> &'static PriorityLevel {
        let idx = match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
            Priority::Critical => 4,
        };
        &PRIORITY_LEVELS[idx]
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_monotonic() {
        let mut previous = 0;
        for entry in PRIORITY_LEVELS {
            assert!(entry.level > previous);
            previous = entry.level;
        }
        assert_eq!(previous, MAX_PRIORITY_LEVEL);
    }

    #[test]
    fn ordering_follows_levels() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Urgent < Priority::Critical);
        assert_eq!(Priority::High.level(), 3);
    }

    #[test]
    fn parse_is_case_insensitive() {
        for name in ["low", "medium", "high", "urgent", "critical"] {
            let parsed = Priority::parse(&name.to_uppercase()).expect("parse");
            assert_eq!(parsed.as_str(), name);
        }
        assert!(Priority::parse("p1").is_err());
        assert!(Priority::parse("").is_err());
    }

    #[test]
    fn escalated_caps_at_critical() {
        assert_eq!(Priority::Medium.escalated(), Priority::High);
        assert_eq!(Priority::Urgent.escalated(), Priority::Critical);
        assert_eq!(Priority::Critical.escalated(), Priority::Critical);
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let parsed: Priority = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Priority::Critical);
    }
}

//! Per-project priority escalation rules.
//!
//! Rule conditions are free-form JSON at rest and are parsed into typed
//! clauses at the storage boundary. Unknown keys are ignored; a clause of
//! the wrong shape fails the parse and the engine skips that rule for the
//! sweep instead of aborting it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::priority::Priority;
use crate::storage::Storage;

const RULES_SCHEMA_VERSION: &str = "taskgraph.rules.v1";

/// Escalate when the due date is near
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueDateClause {
    /// Trigger when days-until-due is at most this
    pub days: i64,
    /// Priority to escalate to
    pub priority: Priority,
}

/// Escalate when a dependency carries high priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyClause {
    /// Reference priority a dependency must meet or exceed
    pub priority: Priority,
    /// Whether this clause is active
    #[serde(default)]
    pub escalate: bool,
}

/// Escalate when a task has seen no activity for a while
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InactivityClause {
    /// Trigger when the latest activity is older than this many days
    pub days: i64,
    /// Priority to escalate to
    pub priority: Priority,
}

/// Parsed form of a rule's conditions object
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConditions {
    #[serde(default, rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDateClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity: Option<InactivityClause>,
}

impl RuleConditions {
    /// Parse the stored conditions value into typed clauses
    pub fn from_value(value: &serde_json::Value) -> Result<RuleConditions> {
        serde_json::from_value(value.clone()).map_err(|err| {
            Error::InvalidArgument(format!("malformed rule conditions: {err}"))
        })
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.due_date.is_none() && self.dependencies.is_none() && self.inactivity.is_none()
    }
}

/// A stored priority rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityRuleRecord {
    pub id: String,
    pub project: String,
    /// Free-form at rest; see `RuleConditions::from_value`
    pub conditions: serde_json::Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// On-disk registry of all priority rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRegistry {
    pub schema_version: String,
    pub rules: Vec<PriorityRuleRecord>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self {
            schema_version: RULES_SCHEMA_VERSION.to_string(),
            rules: Vec::new(),
        }
    }
}

/// Store for priority rules
#[derive(Debug, Clone)]
pub struct RuleStore {
    storage: Storage,
}

impl RuleStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a rule for a project
    pub fn create(&self, project: &str, conditions: RuleConditions) -> Result<PriorityRuleRecord> {
        let project = project.trim().to_string();
        if project.is_empty() {
            return Err(Error::InvalidArgument("project cannot be empty".to_string()));
        }
        if conditions.is_empty() {
            return Err(Error::InvalidArgument(
                "rule needs at least one condition clause".to_string(),
            ));
        }

        let record = PriorityRuleRecord {
            id: Uuid::new_v4().to_string(),
            project,
            conditions: conditions.to_value()?,
            enabled: true,
            created_at: Utc::now(),
        };

        let stored = record.clone();
        self.storage
            .update_registry::<RuleRegistry, _, _>(&self.storage.rules_file(), move |registry| {
                registry.rules.push(stored);
                Ok(())
            })?;

        Ok(record)
    }

    /// Rules for one project, in creation (document) order
    pub fn for_project(&self, project: &str) -> Result<Vec<PriorityRuleRecord>> {
        let mut rules = self.all()?;
        rules.retain(|rule| rule.project == project);
        Ok(rules)
    }

    /// All rules, in creation order
    pub fn all(&self) -> Result<Vec<PriorityRuleRecord>> {
        let registry: RuleRegistry = self.storage.read_registry(&self.storage.rules_file())?;
        let mut rules = registry.rules;
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rules)
    }

    /// Enable or disable a rule
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<PriorityRuleRecord> {
        let id = id.to_string();
        self.storage
            .update_registry::<RuleRegistry, _, _>(&self.storage.rules_file(), |registry| {
                let rule = registry
                    .rules
                    .iter_mut()
                    .find(|rule| rule.id == id)
                    .ok_or_else(|| Error::RuleNotFound(id.clone()))?;
                rule.enabled = enabled;
                Ok(rule.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn conditions_parse_known_clauses() {
        let value = json!({
            "dueDate": { "days": 2, "priority": "urgent" },
            "dependencies": { "priority": "high", "escalate": true },
            "inactivity": { "days": 14, "priority": "high" }
        });

        let parsed = RuleConditions::from_value(&value).expect("parse");
        assert_eq!(
            parsed.due_date,
            Some(DueDateClause {
                days: 2,
                priority: Priority::Urgent,
            })
        );
        assert_eq!(
            parsed.dependencies,
            Some(DependencyClause {
                priority: Priority::High,
                escalate: true,
            })
        );
        assert_eq!(
            parsed.inactivity,
            Some(InactivityClause {
                days: 14,
                priority: Priority::High,
            })
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let value = json!({
            "dueDate": { "days": 1, "priority": "high" },
            "somethingElse": { "weird": true }
        });

        let parsed = RuleConditions::from_value(&value).expect("parse");
        assert!(parsed.due_date.is_some());
        assert!(parsed.dependencies.is_none());
    }

    #[test]
    fn malformed_clause_shape_fails_parse() {
        let value = json!({
            "dueDate": { "days": "soon", "priority": "high" }
        });
        assert!(RuleConditions::from_value(&value).is_err());

        let value = json!({ "inactivity": { "days": 3 } });
        assert!(RuleConditions::from_value(&value).is_err());
    }

    #[test]
    fn store_round_trip_and_toggle() {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init");
        let store = RuleStore::new(storage);

        let conditions = RuleConditions {
            due_date: Some(DueDateClause {
                days: 2,
                priority: Priority::Urgent,
            }),
            ..Default::default()
        };
        let rule = store.create("alpha", conditions).expect("create");
        assert!(rule.enabled);

        let listed = store.for_project("alpha").expect("list");
        assert_eq!(listed.len(), 1);
        let parsed = RuleConditions::from_value(&listed[0].conditions).expect("parse");
        assert_eq!(parsed.due_date.unwrap().days, 2);

        let disabled = store.set_enabled(&rule.id, false).expect("disable");
        assert!(!disabled.enabled);
        assert!(matches!(
            store.set_enabled("missing", true),
            Err(Error::RuleNotFound(_))
        ));
    }

    #[test]
    fn empty_conditions_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init_all().expect("init");
        let store = RuleStore::new(storage);

        let err = store
            .create("alpha", RuleConditions::default())
            .expect_err("empty");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}

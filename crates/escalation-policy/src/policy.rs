//! Escalation Policy Implementation

use crate::PolicyError;
use notifier::Target;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// One tier of targets notified together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLevel {
    targets: Vec<Target>,
}

impl EscalationLevel {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Targets in declared notification order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Levels for a single resource, as loaded from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePolicy {
    pub resource: String,
    pub levels: Vec<EscalationLevel>,
}

impl ResourcePolicy {
    pub fn new(resource: impl Into<String>, levels: Vec<EscalationLevel>) -> Self {
        Self {
            resource: resource.into(),
            levels,
        }
    }
}

/// Immutable mapping from resource name to its ordered escalation levels
#[derive(Debug, Clone, Default)]
pub struct EscalationPolicy {
    levels: HashMap<String, Vec<EscalationLevel>>,
}

impl EscalationPolicy {
    /// Build a policy, rejecting empty and duplicate entries
    pub fn new(entries: Vec<ResourcePolicy>) -> Result<Self, PolicyError> {
        let mut levels = HashMap::with_capacity(entries.len());

        for entry in entries {
            if entry.levels.is_empty() {
                return Err(PolicyError::NoLevels(entry.resource));
            }
            if levels.contains_key(&entry.resource) {
                return Err(PolicyError::DuplicateResource(entry.resource));
            }
            levels.insert(entry.resource, entry.levels);
        }

        info!("Escalation policy loaded for {} resources", levels.len());
        Ok(Self { levels })
    }

    /// Ordered levels for a resource
    pub fn levels(&self, resource: &str) -> Result<&[EscalationLevel], PolicyError> {
        self.levels
            .get(resource)
            .map(Vec::as_slice)
            .ok_or_else(|| PolicyError::NotFound(resource.to_string()))
    }

    /// Number of levels configured for a resource
    pub fn level_count(&self, resource: &str) -> Result<usize, PolicyError> {
        self.levels(resource).map(<[EscalationLevel]>::len)
    }

    /// A single level by index
    pub fn level(&self, resource: &str, level: usize) -> Result<&EscalationLevel, PolicyError> {
        let levels = self.levels(resource)?;
        levels.get(level).ok_or_else(|| PolicyError::LevelOutOfRange {
            resource: resource.to_string(),
            level,
            count: levels.len(),
        })
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.levels.contains_key(resource)
    }

    /// Names of all resources with a policy
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> EscalationPolicy {
        EscalationPolicy::new(vec![ResourcePolicy::new(
            "service #1",
            vec![
                EscalationLevel::new(vec![Target::sms("900100200")]),
                EscalationLevel::new(vec![Target::email("user@example.com")]),
            ],
        )])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let policy = two_level();
        assert_eq!(policy.level_count("service #1").unwrap(), 2);
        assert_eq!(policy.level("service #1", 1).unwrap().len(), 1);
        assert!(policy.contains("service #1"));
        assert_eq!(policy.resources().collect::<Vec<_>>(), vec!["service #1"]);
    }

    #[test]
    fn test_unknown_resource() {
        let policy = two_level();
        assert_eq!(
            policy.levels("service #2").unwrap_err(),
            PolicyError::NotFound("service #2".to_string())
        );
        assert!(policy.level_count("service #2").is_err());
    }

    #[test]
    fn test_level_out_of_range() {
        let policy = two_level();
        assert!(matches!(
            policy.level("service #1", 2),
            Err(PolicyError::LevelOutOfRange { level: 2, count: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        let empty = EscalationPolicy::new(vec![ResourcePolicy::new("db", vec![])]);
        assert_eq!(empty.unwrap_err(), PolicyError::NoLevels("db".to_string()));

        let level = || EscalationLevel::new(vec![Target::sms("1")]);
        let dup = EscalationPolicy::new(vec![
            ResourcePolicy::new("db", vec![level()]),
            ResourcePolicy::new("db", vec![level()]),
        ]);
        assert_eq!(dup.unwrap_err(), PolicyError::DuplicateResource("db".to_string()));
    }

    #[test]
    fn test_deserialize_resource_policy() {
        let json = r#"{
            "resource": "api",
            "levels": [
                {"targets": [{"kind": "sms", "phone_number": "900100200"}]},
                {"targets": [{"kind": "email", "address": "oncall@example.com"}]}
            ]
        }"#;
        let entry: ResourcePolicy = serde_json::from_str(json).unwrap();
        let policy = EscalationPolicy::new(vec![entry]).unwrap();
        assert_eq!(policy.level_count("api").unwrap(), 2);
    }
}

//! Escalation Policies
//!
//! Maps each monitored resource to an ordered list of escalation levels,
//! each level an ordered list of notification targets.

mod policy;
mod resource;

pub use policy::{EscalationLevel, EscalationPolicy, ResourcePolicy};
pub use resource::MonitoredResource;

use thiserror::Error;

/// Policy lookup and construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("No escalation policy for resource '{0}'")]
    NotFound(String),
    #[error("Escalation policy for '{0}' has no levels")]
    NoLevels(String),
    #[error("Duplicate escalation policy for resource '{0}'")]
    DuplicateResource(String),
    #[error("Level {level} out of range for '{resource}' ({count} levels)")]
    LevelOutOfRange {
        resource: String,
        level: usize,
        count: usize,
    },
}

//! Escalation Error Types

use escalation_policy::PolicyError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the escalation engine
///
/// Every variant is returned after the engine has finished its cleanup
/// (deadline cancelled, active set updated).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    /// The resource already has a tracked alert
    #[error("Alert already active for resource '{0}'")]
    AlertAlreadyActive(String),

    /// Deadline reached an alert that was acknowledged
    #[error("Alert {0} already acknowledged")]
    AlreadyAcknowledged(Uuid),

    /// Deadline reached an alert whose resource has recovered
    #[error("Resource '{0}' is healthy")]
    ServiceHealthy(String),

    /// No level left to escalate to; needs owner escalation
    #[error("No more escalation levels for '{resource}' (stopped at level {level})")]
    EscalationExhausted { resource: String, level: usize },

    /// The resource has no escalation policy
    #[error("No escalation policy for resource '{0}'")]
    PolicyNotFound(String),

    /// The alert is not tracked by this engine
    #[error("Unknown alert: {0}")]
    UnknownAlert(String),

    /// The policy rejected a lookup that validation should have ruled out
    #[error("Escalation policy inconsistency: {0}")]
    Policy(PolicyError),
}

impl From<PolicyError> for EscalationError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::NotFound(resource) => EscalationError::PolicyNotFound(resource),
            other => EscalationError::Policy(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_policy_maps_to_policy_not_found() {
        assert_eq!(
            EscalationError::from(PolicyError::NotFound("db".to_string())),
            EscalationError::PolicyNotFound("db".to_string())
        );
    }

    #[test]
    fn test_other_policy_errors_are_kept() {
        let out_of_range = PolicyError::LevelOutOfRange {
            resource: "db".to_string(),
            level: 3,
            count: 2,
        };
        assert_eq!(
            EscalationError::from(out_of_range.clone()),
            EscalationError::Policy(out_of_range)
        );

        let no_levels = PolicyError::NoLevels("db".to_string());
        assert_eq!(
            EscalationError::from(no_levels.clone()),
            EscalationError::Policy(no_levels)
        );
    }
}

//! Alert Record

use chrono::{DateTime, Utc};
use deadline_scheduler::DeadlineHandle;
use escalation_policy::MonitoredResource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Waiting for acknowledgement at the current level
    Active,
    /// Acknowledged by a contact
    Acknowledged,
    /// Resource recovered before anyone acknowledged
    Resolved,
    /// Deadline passed on the last level; still holds the resource slot
    Exhausted,
}

impl AlertStatus {
    /// Whether the alert still occupies its resource's slot
    pub fn holds_slot(self) -> bool {
        matches!(self, AlertStatus::Active | AlertStatus::Exhausted)
    }
}

/// Notification text for a resource at a level
pub fn alert_message(resource: &str, level: usize) -> String {
    format!("{} is unhealthy (Level {})", resource, level)
}

/// Mutable part of an alert, guarded by the per-alert lock
#[derive(Debug)]
pub(crate) struct AlertState {
    pub current_level: usize,
    pub acknowledged: bool,
    pub status: AlertStatus,
    pub deadline: Option<DeadlineHandle>,
}

/// One open incident for one resource
#[derive(Debug)]
pub struct Alert {
    id: Uuid,
    resource: Arc<MonitoredResource>,
    created_at: DateTime<Utc>,
    ack_timeout: Duration,
    state: Mutex<AlertState>,
}

impl Alert {
    pub(crate) fn new(resource: Arc<MonitoredResource>, ack_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            created_at: Utc::now(),
            ack_timeout,
            state: Mutex::new(AlertState {
                current_level: 0,
                acknowledged: false,
                status: AlertStatus::Active,
                deadline: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource(&self) -> &Arc<MonitoredResource> {
        &self.resource
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Deadline re-armed at every level
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }

    pub fn current_level(&self) -> usize {
        self.lock_state().current_level
    }

    pub fn is_acknowledged(&self) -> bool {
        self.lock_state().acknowledged
    }

    pub fn status(&self) -> AlertStatus {
        self.lock_state().status
    }

    /// Notification text for the current level
    pub fn message(&self) -> String {
        alert_message(self.resource.name(), self.current_level())
    }

    /// Consistent point-in-time view
    pub fn snapshot(&self) -> AlertSnapshot {
        let state = self.lock_state();
        AlertSnapshot {
            id: self.id,
            resource: self.resource.name().to_string(),
            created_at: self.created_at,
            ack_timeout_secs: self.ack_timeout.as_secs(),
            current_level: state.current_level,
            acknowledged: state.acknowledged,
            status: state.status,
            deadline_armed: state.deadline.is_some(),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        writeln!(f, "Alert for {}", snapshot.resource)?;
        writeln!(f, "Sent at {}", snapshot.created_at)?;
        writeln!(f, "Current escalation level: {}", snapshot.current_level)?;
        writeln!(f, "Acknowledgement window: {}s", snapshot.ack_timeout_secs)?;
        write!(f, "Status: {:?}", snapshot.status)
    }
}

/// Serializable view of an alert
#[derive(Debug, Clone, Serialize)]
pub struct AlertSnapshot {
    pub id: Uuid,
    pub resource: String,
    pub created_at: DateTime<Utc>,
    pub ack_timeout_secs: u64,
    pub current_level: usize,
    pub acknowledged: bool,
    pub status: AlertStatus,
    pub deadline_armed: bool,
}

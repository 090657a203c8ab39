//! Dispatch Audit Log

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Result of notifying one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Confirmation returned by the target
    Delivered(String),
    /// Error returned by the target
    Failed(String),
}

/// One notification attempt
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub alert_id: Uuid,
    pub resource: String,
    pub level: usize,
    pub target: String,
    pub outcome: DispatchOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded log of notification attempts
pub struct AuditLog {
    records: Mutex<VecDeque<DispatchRecord>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, evicting the oldest past capacity
    pub fn record(&self, record: DispatchRecord) {
        let mut records = self.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Confirmation lines of delivered notifications, oldest first
    pub fn confirmations(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|r| match &r.outcome {
                DispatchOutcome::Delivered(confirmation) => Some(confirmation.clone()),
                DispatchOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DispatchRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

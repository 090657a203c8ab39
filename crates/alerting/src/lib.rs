//! Alert Escalation
//!
//! Tracks one open alert per monitored resource, pages the resource's
//! escalation levels in order, and escalates when an acknowledgement
//! deadline passes. Escalation stops on acknowledgement, on observed
//! recovery, or when the policy runs out of levels.

mod alert;
mod audit;
mod config;
mod engine;
mod error;

pub use alert::{alert_message, Alert, AlertSnapshot, AlertStatus};
pub use audit::{AuditLog, DispatchOutcome, DispatchRecord};
pub use config::EngineConfig;
pub use engine::EscalationEngine;
pub use error::EscalationError;

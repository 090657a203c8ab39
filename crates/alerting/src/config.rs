//! Engine Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Escalation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Acknowledgement window before escalating, in seconds (default: 900)
    pub ack_timeout_secs: u64,
    /// Maximum dispatch records retained in the audit log
    pub audit_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: 900, // 15 minutes
            audit_capacity: 10_000,
        }
    }
}

impl EngineConfig {
    /// Default acknowledgement deadline
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

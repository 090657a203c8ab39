//! Monitored Resource

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A resource being paged about
///
/// The health flag is shared between the external health observer and the
/// escalation engine, so it is atomic and the resource is usually held in an
/// `Arc`.
#[derive(Debug)]
pub struct MonitoredResource {
    name: String,
    healthy: AtomicBool,
}

impl MonitoredResource {
    /// Create a healthy resource
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    pub fn set_healthy(&self) {
        debug!("Resource {} marked healthy", self.name);
        self.healthy.store(true, Ordering::Release);
    }

    pub fn set_unhealthy(&self) {
        debug!("Resource {} marked unhealthy", self.name);
        self.healthy.store(false, Ordering::Release);
    }
}

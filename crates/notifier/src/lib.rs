//! Notification Targets
//!
//! Contact channels an escalation level pages. Each target exposes a single
//! capability, [`Notifier::notify`], returning a confirmation line for the
//! dispatch audit log. Actual transport (SMTP, SMS gateway) lives outside
//! this crate.

mod error;
mod target;

pub use error::NotifyError;
pub use target::{EmailTarget, SmsTarget, Target};

use std::fmt;

/// Capability shared by every contact channel
pub trait Notifier: fmt::Debug + Send + Sync {
    /// Short human-readable label for logs (e.g. `email:user@example.com`)
    fn label(&self) -> String;

    /// Deliver `message` and return a confirmation line
    fn notify(&self, message: &str) -> Result<String, NotifyError>;
}

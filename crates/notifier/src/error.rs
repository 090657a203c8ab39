//! Notification Error Types

use thiserror::Error;

/// Errors that can occur while notifying a target
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Target address is missing or malformed
    #[error("Invalid target address: {0}")]
    InvalidAddress(String),

    /// Delivery channel rejected the message
    #[error("Delivery rejected by {target}: {reason}")]
    Rejected { target: String, reason: String },

    /// Delivery channel is not reachable
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

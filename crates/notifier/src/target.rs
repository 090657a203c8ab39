//! Built-in Target Kinds

use crate::{Notifier, NotifyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Email contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTarget {
    pub address: String,
}

impl EmailTarget {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl Notifier for EmailTarget {
    fn label(&self) -> String {
        format!("email:{}", self.address)
    }

    fn notify(&self, message: &str) -> Result<String, NotifyError> {
        if !self.address.contains('@') {
            return Err(NotifyError::InvalidAddress(self.address.clone()));
        }
        debug!("Emailing {}", self.address);
        Ok(format!("Emailing {}: {}", self.address, message))
    }
}

/// SMS contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTarget {
    pub phone_number: String,
}

impl SmsTarget {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
        }
    }
}

impl Notifier for SmsTarget {
    fn label(&self) -> String {
        format!("sms:{}", self.phone_number)
    }

    fn notify(&self, message: &str) -> Result<String, NotifyError> {
        if self.phone_number.is_empty() {
            return Err(NotifyError::InvalidAddress(self.phone_number.clone()));
        }
        debug!("Sending SMS to {}", self.phone_number);
        Ok(format!("Sending SMS to {}: {}", self.phone_number, message))
    }
}

/// A contact channel referenced by an escalation level
///
/// `Email` and `Sms` are loadable from configuration. `Custom` wraps any
/// other [`Notifier`] implementation and can only be built in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Email(EmailTarget),
    Sms(SmsTarget),
    #[serde(skip)]
    Custom(Arc<dyn Notifier>),
}

impl Target {
    pub fn email(address: impl Into<String>) -> Self {
        Target::Email(EmailTarget::new(address))
    }

    pub fn sms(phone_number: impl Into<String>) -> Self {
        Target::Sms(SmsTarget::new(phone_number))
    }

    pub fn custom(notifier: impl Notifier + 'static) -> Self {
        Target::Custom(Arc::new(notifier))
    }

    fn inner(&self) -> &dyn Notifier {
        match self {
            Target::Email(t) => t,
            Target::Sms(t) => t,
            Target::Custom(t) => t.as_ref(),
        }
    }
}

impl Notifier for Target {
    fn label(&self) -> String {
        self.inner().label()
    }

    fn notify(&self, message: &str) -> Result<String, NotifyError> {
        self.inner().notify(message)
    }
}

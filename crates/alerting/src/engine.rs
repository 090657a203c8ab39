//! Escalation Engine Implementation
//!
//! Lock order is alert state, then active set, then scheduler slots.
//! Notifier calls run with no lock held; a level's deadline is armed only
//! after its targets have been paged.

use crate::alert::{alert_message, Alert, AlertState, AlertStatus};
use crate::audit::{AuditLog, DispatchOutcome, DispatchRecord};
use crate::{EngineConfig, EscalationError};
use chrono::Utc;
use deadline_scheduler::{DeadlineScheduler, FiredDeadlines};
use escalation_policy::{EscalationPolicy, MonitoredResource};
use metrics::counter;
use notifier::Notifier;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct EngineInner {
    policy: EscalationPolicy,
    config: EngineConfig,
    /// Tracked alerts by resource name
    active: Mutex<HashMap<String, Arc<Alert>>>,
    scheduler: DeadlineScheduler,
    audit: AuditLog,
}

/// Escalation engine
///
/// Cheap to clone; clones share the same active set and scheduler.
#[derive(Clone)]
pub struct EscalationEngine {
    inner: Arc<EngineInner>,
}

impl EscalationEngine {
    /// Create an engine and start its deadline loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(policy: EscalationPolicy, config: EngineConfig) -> Self {
        info!("Creating escalation engine with config: {:?}", config);

        let (scheduler, fired) = DeadlineScheduler::new();
        let inner = Arc::new(EngineInner {
            policy,
            audit: AuditLog::new(config.audit_capacity),
            config,
            active: Mutex::new(HashMap::new()),
            scheduler,
        });

        tokio::spawn(deadline_loop(Arc::downgrade(&inner), fired));

        Self { inner }
    }

    /// Open an alert for `resource` and page its first level
    ///
    /// `deadline` overrides the configured acknowledgement window.
    pub fn receive_alert(
        &self,
        resource: Arc<MonitoredResource>,
        deadline: Option<Duration>,
    ) -> Result<Arc<Alert>, EscalationError> {
        let name = resource.name().to_string();
        self.inner.policy.level_count(&name)?;

        let ack_timeout = deadline.unwrap_or_else(|| self.inner.config.ack_timeout());
        let alert = Arc::new(Alert::new(resource, ack_timeout));

        {
            let _state = alert.lock_state();
            {
                let mut active = self.lock_active();
                if active.contains_key(&name) {
                    warn!("Duplicate alert for {} ignored", name);
                    return Err(EscalationError::AlertAlreadyActive(name));
                }
                active.insert(name.clone(), Arc::clone(&alert));
            }

            alert.resource().set_unhealthy();
        }

        counter!("pager_alerts_received_total").increment(1);
        info!(
            "Alert {} opened for {} (ack window {:?})",
            alert.id(),
            name,
            ack_timeout
        );

        self.dispatch(&alert, 0);
        self.arm(&alert, 0);
        Ok(alert)
    }

    /// Apply an expired acknowledgement deadline to `alert`
    ///
    /// Returns the new level on escalation.
    pub fn handle_deadline_expired(&self, alert: &Arc<Alert>) -> Result<usize, EscalationError> {
        let resource = alert.resource().name().to_string();

        let level = {
            let mut state = alert.lock_state();

            if state.acknowledged {
                self.close(alert, &mut state, None);
                return Err(EscalationError::AlreadyAcknowledged(alert.id()));
            }

            if state.status == AlertStatus::Resolved || alert.resource().is_healthy() {
                if state.status.holds_slot() {
                    counter!("pager_alerts_resolved_total").increment(1);
                    info!("Alert {} resolved: {} recovered before deadline", alert.id(), resource);
                }
                self.close(alert, &mut state, Some(AlertStatus::Resolved));
                return Err(EscalationError::ServiceHealthy(resource));
            }

            if state.status == AlertStatus::Exhausted {
                return Err(EscalationError::EscalationExhausted {
                    resource,
                    level: state.current_level,
                });
            }

            let next = state.current_level + 1;
            if next >= self.inner.policy.level_count(&resource)? {
                self.disarm(&mut state);
                self.inner.scheduler.release(alert.id());
                state.status = AlertStatus::Exhausted;
                counter!("pager_alerts_exhausted_total").increment(1);
                warn!(
                    "Alert {} for {} exhausted all escalation levels, owner escalation required",
                    alert.id(),
                    resource
                );
                return Err(EscalationError::EscalationExhausted {
                    resource,
                    level: state.current_level,
                });
            }

            state.current_level = next;
            self.disarm(&mut state);
            next
        };

        counter!("pager_escalations_total").increment(1);
        info!("Alert {} for {} escalated to level {}", alert.id(), resource, level);

        self.dispatch(alert, level);
        self.arm(alert, level);
        Ok(level)
    }

    /// Acknowledge `alert`, stopping escalation and freeing its resource
    pub fn acknowledge(&self, alert: &Arc<Alert>) -> Result<(), EscalationError> {
        let mut state = alert.lock_state();

        if !state.status.holds_slot() || !self.is_tracked(alert) {
            return Err(EscalationError::UnknownAlert(alert.id().to_string()));
        }

        state.acknowledged = true;
        self.close(alert, &mut state, Some(AlertStatus::Acknowledged));

        counter!("pager_acknowledgements_total").increment(1);
        info!(
            "Alert {} for {} acknowledged at level {}",
            alert.id(),
            alert.resource().name(),
            state.current_level
        );
        Ok(())
    }

    /// Acknowledge the tracked alert with the given id
    pub fn acknowledge_id(&self, alert_id: Uuid) -> Result<Arc<Alert>, EscalationError> {
        let alert = self
            .find(alert_id)
            .ok_or_else(|| EscalationError::UnknownAlert(alert_id.to_string()))?;
        self.acknowledge(&alert)?;
        Ok(alert)
    }

    /// Report that `resource` recovered, closing its tracked alert
    pub fn resolve(&self, resource: &str) -> Result<Arc<Alert>, EscalationError> {
        let alert = self
            .active_alert(resource)
            .ok_or_else(|| EscalationError::UnknownAlert(resource.to_string()))?;

        {
            let mut state = alert.lock_state();
            if !state.status.holds_slot() || !self.is_tracked(&alert) {
                return Err(EscalationError::UnknownAlert(resource.to_string()));
            }

            alert.resource().set_healthy();
            self.close(&alert, &mut state, Some(AlertStatus::Resolved));
        }

        counter!("pager_alerts_resolved_total").increment(1);
        info!("Alert {} resolved: {} reported recovery", alert.id(), resource);
        Ok(alert)
    }

    /// Tracked alert for a resource (active or exhausted)
    pub fn active_alert(&self, resource: &str) -> Option<Arc<Alert>> {
        self.lock_active().get(resource).cloned()
    }

    /// Tracked alert by id
    pub fn find(&self, alert_id: Uuid) -> Option<Arc<Alert>> {
        self.lock_active()
            .values()
            .find(|alert| alert.id() == alert_id)
            .cloned()
    }

    /// All tracked alerts
    pub fn active_alerts(&self) -> Vec<Arc<Alert>> {
        self.lock_active().values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }

    /// Number of armed deadlines
    pub fn armed_deadlines(&self) -> usize {
        self.inner.scheduler.armed_count()
    }

    /// Delivered confirmations, in dispatch order
    pub fn dispatch_log(&self) -> Vec<String> {
        self.inner.audit.confirmations()
    }

    /// Every notification attempt, including failures
    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.inner.policy
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Notify every target of `level`, in declared order
    fn dispatch(&self, alert: &Alert, level: usize) {
        let resource = alert.resource().name();
        let targets = match self.inner.policy.level(resource, level) {
            Ok(level) => level.targets(),
            Err(e) => {
                warn!("Dispatch skipped for alert {}: {}", alert.id(), e);
                return;
            }
        };
        let message = alert_message(resource, level);

        for target in targets {
            let outcome = match target.notify(&message) {
                Ok(confirmation) => {
                    counter!("pager_notifications_total", "outcome" => "delivered").increment(1);
                    info!("{}", confirmation);
                    DispatchOutcome::Delivered(confirmation)
                }
                Err(e) => {
                    counter!("pager_notifications_total", "outcome" => "failed").increment(1);
                    warn!("Failed to notify {} for alert {}: {}", target.label(), alert.id(), e);
                    DispatchOutcome::Failed(e.to_string())
                }
            };

            self.inner.audit.record(DispatchRecord {
                alert_id: alert.id(),
                resource: resource.to_string(),
                level,
                target: target.label(),
                outcome,
                timestamp: Utc::now(),
            });
        }
    }

    /// Start the acknowledgement window for `level`
    ///
    /// Skipped when the alert was acknowledged, closed, or moved past `level`
    /// while its targets were being paged.
    fn arm(&self, alert: &Alert, level: usize) {
        let mut state = alert.lock_state();
        if state.status != AlertStatus::Active
            || state.acknowledged
            || state.current_level != level
            || !self.is_tracked(alert)
        {
            debug!("Alert {} left level {} during dispatch, deadline not armed", alert.id(), level);
            return;
        }

        let armed = match state.deadline.take() {
            Some(handle) => self.inner.scheduler.reschedule(&handle, alert.ack_timeout()),
            None => self.inner.scheduler.schedule(alert.id(), alert.ack_timeout()),
        };
        state.deadline = Some(armed);
    }

    fn disarm(&self, state: &mut AlertState) {
        if let Some(handle) = state.deadline.take() {
            self.inner.scheduler.cancel(&handle);
        }
    }

    /// Cancel the deadline, optionally set a final status, and drop the alert
    /// from the active set
    fn close(&self, alert: &Alert, state: &mut AlertState, status: Option<AlertStatus>) {
        self.disarm(state);
        if let Some(status) = status {
            state.status = status;
        }

        let mut active = self.lock_active();
        let tracked = active
            .get(alert.resource().name())
            .map_or(false, |current| current.id() == alert.id());
        if tracked {
            active.remove(alert.resource().name());
        }
        drop(active);

        self.inner.scheduler.release(alert.id());
    }

    fn is_tracked(&self, alert: &Alert) -> bool {
        self.lock_active()
            .get(alert.resource().name())
            .map_or(false, |current| current.id() == alert.id())
    }

    fn lock_active(&self) -> MutexGuard<'_, HashMap<String, Arc<Alert>>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deliver fired deadlines to the engine until it is dropped
async fn deadline_loop(engine: Weak<EngineInner>, mut fired: FiredDeadlines) {
    while let Some(handle) = fired.recv().await {
        let Some(inner) = engine.upgrade() else {
            break;
        };
        let engine = EscalationEngine { inner };

        let Some(alert) = engine.find(handle.alert_id()) else {
            debug!("Deadline for alert {} arrived after it closed", handle.alert_id());
            continue;
        };

        match engine.handle_deadline_expired(&alert) {
            Ok(level) => debug!("Deadline handled for alert {}: now level {}", alert.id(), level),
            Err(e @ EscalationError::EscalationExhausted { .. }) => {
                warn!("Escalation stopped for alert {}: {}", alert.id(), e)
            }
            Err(e) => info!("Escalation stopped for alert {}: {}", alert.id(), e),
        }
    }

    debug!("Deadline loop stopped");
}

//! Deadline Scheduler Implementation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Identity of the alert a deadline belongs to
pub type AlertId = Uuid;

/// Receiving end for deadlines that fired while still live
pub type FiredDeadlines = mpsc::UnboundedReceiver<DeadlineHandle>;

/// Handle to one arm of an alert's deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadlineHandle {
    alert_id: AlertId,
    generation: u64,
}

impl DeadlineHandle {
    pub fn alert_id(&self) -> AlertId {
        self.alert_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-alert bookkeeping
#[derive(Debug, Default)]
struct Slot {
    /// Generation of the most recent arm
    generation: u64,
    /// Pending timer task, `None` once fired or cancelled
    timer: Option<AbortHandle>,
}

type Slots = Arc<Mutex<HashMap<AlertId, Slot>>>;

/// Scheduler for acknowledgement deadlines
pub struct DeadlineScheduler {
    slots: Slots,
    fired_tx: mpsc::UnboundedSender<DeadlineHandle>,
}

impl DeadlineScheduler {
    /// Create a scheduler and the channel its fired deadlines arrive on
    pub fn new() -> (Self, FiredDeadlines) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        info!("Deadline scheduler created");
        (
            Self {
                slots: Arc::new(Mutex::new(HashMap::new())),
                fired_tx,
            },
            fired_rx,
        )
    }

    /// Arm a deadline for `alert_id` firing after `duration`
    ///
    /// Any deadline still pending for the alert is superseded. Must be called
    /// from within a tokio runtime.
    pub fn schedule(&self, alert_id: AlertId, duration: Duration) -> DeadlineHandle {
        let mut slots = lock(&self.slots);
        let slot = slots.entry(alert_id).or_default();

        if let Some(previous) = slot.timer.take() {
            previous.abort();
        }
        slot.generation += 1;

        let handle = DeadlineHandle {
            alert_id,
            generation: slot.generation,
        };
        let task = tokio::spawn(fire_after(
            Arc::clone(&self.slots),
            self.fired_tx.clone(),
            handle,
            duration,
        ));
        slot.timer = Some(task.abort_handle());

        debug!(
            "Deadline armed for alert {} (generation {}, {:?})",
            alert_id, handle.generation, duration
        );
        handle
    }

    /// Disarm the deadline behind `handle`
    ///
    /// Returns `false` if it already fired, was cancelled, or was superseded.
    pub fn cancel(&self, handle: &DeadlineHandle) -> bool {
        let mut slots = lock(&self.slots);
        match slots.get_mut(&handle.alert_id) {
            Some(slot) if slot.generation == handle.generation => match slot.timer.take() {
                Some(timer) => {
                    timer.abort();
                    debug!(
                        "Deadline cancelled for alert {} (generation {})",
                        handle.alert_id, handle.generation
                    );
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Cancel `handle` and arm a fresh generation for the same alert
    pub fn reschedule(&self, handle: &DeadlineHandle, duration: Duration) -> DeadlineHandle {
        self.cancel(handle);
        self.schedule(handle.alert_id, duration)
    }

    /// Drop all bookkeeping for an alert that left the engine
    pub fn release(&self, alert_id: AlertId) {
        if let Some(slot) = lock(&self.slots).remove(&alert_id) {
            if let Some(timer) = slot.timer {
                timer.abort();
            }
        }
    }

    /// Whether the alert has a pending deadline
    pub fn is_armed(&self, alert_id: AlertId) -> bool {
        lock(&self.slots)
            .get(&alert_id)
            .map_or(false, |slot| slot.timer.is_some())
    }

    /// Number of pending deadlines
    pub fn armed_count(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| slot.timer.is_some())
            .count()
    }

    /// Number of alerts with bookkeeping, armed or not
    pub fn tracked_count(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl Drop for DeadlineScheduler {
    fn drop(&mut self) {
        let mut slots = lock(&self.slots);
        for slot in slots.values_mut() {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
        }
    }
}

async fn fire_after(
    slots: Slots,
    fired_tx: mpsc::UnboundedSender<DeadlineHandle>,
    handle: DeadlineHandle,
    duration: Duration,
) {
    tokio::time::sleep(duration).await;

    if !claim(&slots, &handle) {
        debug!(
            "Stale deadline for alert {} (generation {}) dropped",
            handle.alert_id, handle.generation
        );
        return;
    }

    if fired_tx.send(handle).is_err() {
        debug!("Deadline receiver closed, alert {} not delivered", handle.alert_id);
    }
}

/// Take ownership of a fire if `handle` is still the live generation
fn claim(slots: &Mutex<HashMap<AlertId, Slot>>, handle: &DeadlineHandle) -> bool {
    let mut slots = lock(slots);
    match slots.get_mut(&handle.alert_id) {
        Some(slot) if slot.generation == handle.generation => slot.timer.take().is_some(),
        _ => false,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_duration() {
        let (scheduler, mut fired) = DeadlineScheduler::new();
        let id = Uuid::new_v4();

        let handle = scheduler.schedule(id, Duration::from_secs(10));
        assert_eq!(handle.generation(), 1);
        assert!(scheduler.is_armed(id));

        let delivered = timeout(Duration::from_secs(11), fired.recv()).await.unwrap();
        assert_eq!(delivered, Some(handle));
        assert!(!scheduler.is_armed(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_deadline_never_fires() {
        let (scheduler, mut fired) = DeadlineScheduler::new();
        let handle = scheduler.schedule(Uuid::new_v4(), Duration::from_secs(10));

        assert!(scheduler.cancel(&handle));
        // Idempotent
        assert!(!scheduler.cancel(&handle));

        sleep(Duration::from_secs(20)).await;
        assert!(fired.try_recv().is_err());
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes_previous_generation() {
        let (scheduler, mut fired) = DeadlineScheduler::new();
        let id = Uuid::new_v4();

        let first = scheduler.schedule(id, Duration::from_secs(10));
        let second = scheduler.reschedule(&first, Duration::from_secs(30));
        assert_eq!(second.generation(), first.generation() + 1);

        sleep(Duration::from_secs(15)).await;
        assert!(fired.try_recv().is_err());

        let delivered = timeout(Duration::from_secs(20), fired.recv()).await.unwrap();
        assert_eq!(delivered, Some(second));
    }

    #[tokio::test]
    async fn test_claim_matches_live_generation_once() {
        let (scheduler, _fired) = DeadlineScheduler::new();
        let id = Uuid::new_v4();

        let stale = scheduler.schedule(id, Duration::from_secs(60));
        let live = scheduler.schedule(id, Duration::from_secs(60));

        assert!(!claim(&scheduler.slots, &stale));
        assert!(claim(&scheduler.slots, &live));
        assert!(!claim(&scheduler.slots, &live));
        assert!(!scheduler.cancel(&live));
    }

    #[tokio::test]
    async fn test_release_forgets_alert() {
        let (scheduler, _fired) = DeadlineScheduler::new();
        let id = Uuid::new_v4();

        let handle = scheduler.schedule(id, Duration::from_secs(60));
        assert_eq!(scheduler.tracked_count(), 1);
        scheduler.release(id);

        assert_eq!(scheduler.tracked_count(), 0);
        assert!(!scheduler.is_armed(id));
        assert!(!scheduler.cancel(&handle));
    }
}

//! Acknowledgement Deadline Scheduler
//!
//! Arms one-shot deadlines per alert on tokio timers. Every (re)arm bumps a
//! per-alert generation; a timer only delivers its fire event if its
//! generation is still the live one when it wakes, so cancelled or
//! superseded deadlines never reach the engine.

mod scheduler;

pub use scheduler::{AlertId, DeadlineHandle, DeadlineScheduler, FiredDeadlines};

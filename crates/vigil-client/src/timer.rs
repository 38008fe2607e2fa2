//! Safety timer.
//!
//! A countdown armed by the user before a risky situation. Reaching zero
//! raises a danger condition through the alert pipeline; cancelling at
//! any point while armed disarms with no alert. One timer per session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use vigil_shared::constants::TIMER_TICK_MS;
use vigil_shared::{AlertReason, User};

use crate::events::{emit, ClientEvent, EventSender};
use crate::pipeline::AlertPipeline;
use crate::{ClientError, Result};

pub struct SafetyTimer {
    pipeline: Arc<AlertPipeline>,
    events: EventSender,
    tick: Duration,
    armed: Mutex<Option<JoinHandle<()>>>,
}

impl SafetyTimer {
    pub fn new(pipeline: Arc<AlertPipeline>, events: EventSender) -> Self {
        Self::with_tick(pipeline, events, Duration::from_millis(TIMER_TICK_MS))
    }

    /// Tick interval override for tests.
    pub fn with_tick(pipeline: Arc<AlertPipeline>, events: EventSender, tick: Duration) -> Self {
        Self {
            pipeline,
            events,
            tick,
            armed: Mutex::new(None),
        }
    }

    /// Arm the countdown for `seconds` ticks on behalf of `user`.
    /// Rejected while another timer is armed.
    pub fn arm(&self, user: User, seconds: u32) -> Result<()> {
        if seconds == 0 {
            return Err(ClientError::InvalidInput("duration must be positive".into()));
        }

        let mut slot = self.armed.lock().map_err(|_| ClientError::LockPoisoned)?;
        if slot.as_ref().is_some_and(|t| !t.is_finished()) {
            return Err(ClientError::TimerAlreadyArmed);
        }

        let pipeline = self.pipeline.clone();
        let events = self.events.clone();
        let tick = self.tick;
        let task = tokio::spawn(async move {
            let mut remaining = seconds;
            let mut interval = tokio::time::interval(tick);
            interval.tick().await; // first tick is immediate

            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                emit(&events, ClientEvent::TimerTick { remaining_secs: remaining });
            }

            emit(&events, ClientEvent::TimerExpired);
            info!(user = %user.address, "safety timer expired, raising alert");
            if let Err(e) = pipeline.trigger(&user, AlertReason::TimerExpired).await {
                error!(error = %e, "timer-expiry alert failed");
            }
        });

        *slot = Some(task);
        info!(seconds, "safety timer armed");
        Ok(())
    }

    /// Disarm without raising anything. Safe to call when inactive.
    pub fn cancel(&self) {
        let task = self
            .armed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
            info!("safety timer cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SafetyTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Voice monitoring wiring.
//!
//! Connects a [`DangerDetector`] session to the alert pipeline: trigger
//! classifications raise an alert for the monitored user; the
//! `stop_on_trigger` policy decides whether a successful trigger also
//! tears the session down. Stopping is idempotent and releases the
//! device resources through the detector's own handle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use vigil_sense::{DangerDetector, MonitorConfig, MonitorEvent, MonitorHandle};
use vigil_shared::User;

use crate::events::{emit, ClientEvent, EventSender};
use crate::pipeline::AlertPipeline;
use crate::Result;

/// A running monitoring session bound to the pipeline.
pub struct Monitoring {
    handle: MonitorHandle,
    task: Option<JoinHandle<()>>,
}

impl Monitoring {
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Tear monitoring down. Idempotent.
    pub fn stop(&self) {
        self.handle.stop();
    }
}

impl Drop for Monitoring {
    fn drop(&mut self) {
        self.handle.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start listening for `user`'s danger phrase.
///
/// Permission or device failures from the detector propagate; monitoring
/// simply does not start. Once running, every `Trigger` event raises an
/// alert through the pipeline; with `stop_on_trigger` set, the first
/// successful trigger also stops the session.
pub async fn start_monitoring(
    detector: Arc<dyn DangerDetector>,
    pipeline: Arc<AlertPipeline>,
    user: User,
    stop_on_trigger: bool,
    events: EventSender,
) -> Result<Monitoring> {
    let config = MonitorConfig {
        danger_phrase: user.danger_phrase.clone(),
        stop_on_trigger,
    };
    let mut session = detector.start(config).await?;
    let handle = session.handle.clone();

    info!(user = %user.address, stop_on_trigger, "voice monitoring started");

    let task_handle = handle.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = session.events.recv().await {
            match event {
                MonitorEvent::Transcript(text) => {
                    debug!(len = text.len(), "transcript fragment");
                }
                MonitorEvent::Trigger(reason) => {
                    info!(reason = %reason, "danger trigger from voice monitor");
                    if let Err(e) = pipeline.trigger(&user, reason).await {
                        error!(error = %e, "voice-triggered alert failed");
                    }
                    if stop_on_trigger {
                        task_handle.stop();
                        emit(&events, ClientEvent::MonitorStopped);
                        break;
                    }
                }
            }
        }
    });

    Ok(Monitoring {
        handle,
        task: Some(task),
    })
}

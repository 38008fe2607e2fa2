//! Typed events toward the UI layer.
//!
//! Background tasks (alert listener, safety timer, voice monitor) push
//! their state changes here; a UI shell drains the receiver and renders
//! rings, countdowns and navigation.

use tokio::sync::mpsc;
use tracing::warn;

use vigil_shared::constants::EVENT_CHANNEL_CAPACITY;
use vigil_shared::{Address, Alert};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A fresh unacknowledged alert started ringing. The UI shows the
    /// full-screen modal and loops the alarm sound until acknowledged.
    IncomingAlert { alert: Alert },
    /// The ringing alert was acknowledged; stop the alarm and open the
    /// conversation with the alerting sender.
    AlarmStopped { conversation_with: Address },
    /// The armed safety timer counted down one tick.
    TimerTick { remaining_secs: u32 },
    /// The safety timer reached zero; an alert is being raised.
    TimerExpired,
    /// Voice monitoring was torn down (stop-on-trigger or explicit stop).
    MonitorStopped,
}

pub type EventSender = mpsc::Sender<ClientEvent>;

pub fn event_channel() -> (EventSender, mpsc::Receiver<ClientEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Fire-and-forget emit. A full or closed channel is the UI's problem,
/// never the emitting task's.
pub(crate) fn emit(tx: &EventSender, event: ClientEvent) {
    if let Err(e) = tx.try_send(event) {
        warn!(error = %e, "dropping client event");
    }
}

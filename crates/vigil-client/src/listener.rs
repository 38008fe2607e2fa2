//! Incoming alert listener.
//!
//! Subscribes to the session user's alert inbox and surfaces at most one
//! ringing alert at a time. Freshness (5 minutes) and the acknowledged
//! flag are checked at evaluation time only: a ringing alert is never
//! silenced by aging, only by explicit acknowledgement. Acknowledgement
//! is session-local; the stored record is not updated.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_remote::{paths, RemoteStore};
use vigil_shared::{Address, Alert};

use crate::events::{emit, ClientEvent, EventSender};
use crate::replicate;
use crate::{ClientError, Result, SharedDb};

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerState {
    Idle,
    Ringing(Alert),
}

/// Per-session ringing state machine, driven by full inbox snapshots.
pub struct AlertListener {
    state: ListenerState,
    /// Alert ids dismissed this session. Keeps an acknowledged alert
    /// from re-ringing on the next push while its window is still open.
    acknowledged: HashSet<Uuid>,
}

impl AlertListener {
    pub fn new() -> Self {
        Self {
            state: ListenerState::Idle,
            acknowledged: HashSet::new(),
        }
    }

    pub fn state(&self) -> &ListenerState {
        &self.state
    }

    pub fn is_ringing(&self) -> bool {
        matches!(self.state, ListenerState::Ringing(_))
    }

    /// Re-evaluate against a full inbox snapshot. Returns the alert that
    /// just started ringing, if the push caused an `Idle -> Ringing`
    /// transition. A push never preempts an already-ringing alert.
    pub fn evaluate(&mut self, inbox: &[Alert], now: DateTime<Utc>) -> Option<Alert> {
        if self.is_ringing() {
            return None;
        }

        let candidate = inbox
            .iter()
            .filter(|a| a.is_fresh_at(now) && !a.acknowledged && !self.acknowledged.contains(&a.id))
            .max_by_key(|a| a.timestamp)?;

        self.state = ListenerState::Ringing(candidate.clone());
        Some(candidate.clone())
    }

    /// Explicit user acknowledgement: stop ringing, remember the id for
    /// the rest of the session, hand back the sender so the UI can open
    /// that conversation. `None` when nothing was ringing.
    pub fn acknowledge(&mut self) -> Option<Address> {
        match std::mem::replace(&mut self.state, ListenerState::Idle) {
            ListenerState::Ringing(alert) => {
                self.acknowledged.insert(alert.id);
                Some(alert.sender)
            }
            ListenerState::Idle => None,
        }
    }
}

impl Default for AlertListener {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach the listener to `recipient`'s inbox.
///
/// Every push refreshes the local alert backup and re-runs the state
/// machine; an `Idle -> Ringing` transition emits
/// [`ClientEvent::IncomingAlert`]. Dropping the handle detaches.
pub async fn spawn_alert_listener(
    db: SharedDb,
    remote: Arc<dyn RemoteStore>,
    recipient: Address,
    events: EventSender,
) -> Result<AlertInboxHandle> {
    let mut sub = remote.subscribe(&paths::alert_inbox(&recipient)).await?;
    let listener = Arc::new(Mutex::new(AlertListener::new()));

    let task_listener = listener.clone();
    let task_recipient = recipient.clone();
    let task_events = events.clone();
    let task = tokio::spawn(async move {
        while let Some(snapshot) = sub.next().await {
            let mut inbox: Vec<Alert> = replicate::decode_children(snapshot);
            inbox.retain(|a| a.receiver == task_recipient);

            match db.lock() {
                Ok(mut db) => {
                    if let Err(e) = db.replace_inbox(&task_recipient, &inbox) {
                        warn!(recipient = %task_recipient, error = %e, "inbox cache refresh failed");
                    }
                }
                Err(_) => warn!(recipient = %task_recipient, "cache lock poisoned"),
            }

            let ringing = match task_listener.lock() {
                Ok(mut l) => l.evaluate(&inbox, Utc::now()),
                Err(_) => None,
            };
            if let Some(alert) = ringing {
                info!(id = %alert.id, sender = %alert.sender, "incoming alert, ringing");
                emit(&task_events, ClientEvent::IncomingAlert { alert });
            }
        }
    });

    Ok(AlertInboxHandle {
        listener,
        events,
        task: Some(task),
    })
}

/// Owned handle over a running inbox listener.
pub struct AlertInboxHandle {
    listener: Arc<Mutex<AlertListener>>,
    events: EventSender,
    task: Option<JoinHandle<()>>,
}

impl AlertInboxHandle {
    pub fn is_ringing(&self) -> bool {
        self.listener
            .lock()
            .map(|l| l.is_ringing())
            .unwrap_or(false)
    }

    /// Acknowledge the ringing alert, stopping the alarm and steering
    /// the UI to the sender's conversation.
    pub fn acknowledge(&self) -> Result<()> {
        let sender = self
            .listener
            .lock()
            .map_err(|_| ClientError::LockPoisoned)?
            .acknowledge();

        if let Some(sender) = sender {
            emit(
                &self.events,
                ClientEvent::AlarmStopped {
                    conversation_with: sender,
                },
            );
        }
        Ok(())
    }

    /// Detach from the inbox. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AlertInboxHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_shared::AlertReason;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn alert_aged(minutes: i64, now: DateTime<Utc>) -> Alert {
        let mut a = Alert::new(addr("ana@x.com"), addr("bo@x.com"), AlertReason::Manual);
        a.timestamp = now - chrono::Duration::minutes(minutes);
        a
    }

    #[test]
    fn fresh_unacknowledged_alert_rings() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let rung = listener.evaluate(&[alert_aged(1, now)], now);
        assert!(rung.is_some());
        assert!(listener.is_ringing());
    }

    #[test]
    fn stale_alert_does_not_ring() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        assert!(listener.evaluate(&[alert_aged(10, now)], now).is_none());
        assert_eq!(*listener.state(), ListenerState::Idle);
    }

    #[test]
    fn acknowledged_flag_blocks_ringing() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let mut a = alert_aged(1, now);
        a.acknowledged = true;
        assert!(listener.evaluate(&[a], now).is_none());
    }

    #[test]
    fn most_recent_fresh_alert_wins() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let older = alert_aged(4, now);
        let newer = alert_aged(1, now);
        let rung = listener.evaluate(&[older, newer.clone()], now).unwrap();
        assert_eq!(rung.id, newer.id);
    }

    #[test]
    fn ringing_alert_is_not_preempted_by_later_pushes() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let first = alert_aged(2, now);
        listener.evaluate(&[first.clone()], now).unwrap();

        let second = alert_aged(0, now);
        assert!(listener.evaluate(&[first.clone(), second], now).is_none());
        assert_eq!(*listener.state(), ListenerState::Ringing(first));
    }

    #[test]
    fn acknowledge_returns_sender_and_goes_idle() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let alert = alert_aged(1, now);
        listener.evaluate(&[alert.clone()], now).unwrap();

        let sender = listener.acknowledge().unwrap();
        assert_eq!(sender, alert.sender);
        assert_eq!(*listener.state(), ListenerState::Idle);

        // The same record pushed again must not re-ring this session,
        // even though the stored flag is still false.
        assert!(listener.evaluate(&[alert], now).is_none());
    }

    #[test]
    fn acknowledge_when_idle_is_a_no_op() {
        let mut listener = AlertListener::new();
        assert!(listener.acknowledge().is_none());
    }

    #[test]
    fn unrelated_push_after_ack_leaves_idle() {
        let now = Utc::now();
        let mut listener = AlertListener::new();

        let alert = alert_aged(1, now);
        listener.evaluate(&[alert.clone()], now).unwrap();
        listener.acknowledge();

        // Push containing only the acknowledged (still-fresh) alert.
        assert!(listener.evaluate(&[alert], now).is_none());
        assert_eq!(*listener.state(), ListenerState::Idle);
    }
}

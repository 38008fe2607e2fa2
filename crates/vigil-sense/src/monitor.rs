//! Speech danger monitor contract.
//!
//! A detector consumes the microphone stream and emits transcript
//! fragments plus one-shot trigger classifications. `start()` returns an
//! owned [`MonitorSession`]; dropping or stopping the handle releases the
//! audio device and the recognition session on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

use vigil_shared::AlertReason;

use crate::Result;

/// What the detector listens for and what happens after a trigger.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// The user's spoken danger phrase, matched against transcripts.
    pub danger_phrase: String,
    /// Whether a successful trigger tears monitoring down. When false,
    /// the detector keeps listening and may trigger again.
    pub stop_on_trigger: bool,
}

/// Events pushed by an active detector. Transcript fragments arrive at
/// arbitrary, unbounded-frequency intervals while monitoring is active.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Transcript(String),
    Trigger(AlertReason),
}

/// A running monitoring session: the event stream plus its stop handle.
pub struct MonitorSession {
    pub events: mpsc::Receiver<MonitorEvent>,
    pub handle: MonitorHandle,
}

/// Owned stop handle for a monitoring session.
///
/// `stop()` is idempotent and must release the audio input device and
/// close the recognition network session even if the remote close fails.
#[derive(Clone)]
pub struct MonitorHandle {
    active: Arc<AtomicBool>,
    stopped: Arc<Notify>,
}

impl MonitorHandle {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(Notify::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Request teardown. Safe to call when already stopped.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("monitor stop requested");
            self.stopped.notify_waiters();
        }
    }

    /// Resolves once `stop()` has been called. Detector implementations
    /// select on this alongside their audio loop.
    pub async fn stopped(&self) {
        if !self.is_active() {
            return;
        }
        self.stopped.notified().await;
    }
}

impl Default for MonitorHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Speech recognition backend consuming the microphone stream.
#[async_trait]
pub trait DangerDetector: Send + Sync {
    async fn start(&self, config: MonitorConfig) -> Result<MonitorSession>;
}

/// Case- and whitespace-insensitive containment check of the danger
/// phrase inside a transcript fragment.
pub fn phrase_matches(transcript: &str, phrase: &str) -> bool {
    let haystack = fold(transcript);
    let needle = fold(phrase);
    !needle.is_empty() && haystack.contains(&needle)
}

fn fold(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

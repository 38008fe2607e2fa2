//! # vigil-client
//!
//! The application core of Vigil, a personal-safety companion: identity
//! and guardian directory, the alert pipeline with its location fallback
//! ladder, the incoming-alert listener, the safety timer, chat, and the
//! voice-monitoring wiring. The UI layer sits on top of the typed
//! [`ClientEvent`] channel and the service structs exposed here.

pub mod chat;
pub mod events;
pub mod listener;
pub mod location;
pub mod monitor;
pub mod pipeline;
pub mod replicate;
pub mod session;
pub mod timer;

mod error;

use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::{fmt, EnvFilter};

use vigil_store::Database;

pub use chat::{ChatService, ConversationFeed};
pub use error::ClientError;
pub use events::{event_channel, ClientEvent, EventSender};
pub use listener::{spawn_alert_listener, AlertInboxHandle, AlertListener, ListenerState};
pub use location::{LadderConfig, LocationLadder};
pub use monitor::{start_monitoring, Monitoring};
pub use pipeline::{AlertOutcome, AlertPipeline};
pub use session::SessionService;
pub use timer::SafetyTimer;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// The local cache handle shared by every service.
pub type SharedDb = Arc<Mutex<Database>>;

pub(crate) fn lock_db(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| ClientError::LockPoisoned)
}

/// Initialise the global tracing subscriber. Call once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("vigil_client=debug,vigil_remote=debug,vigil_store=info,vigil_sense=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

//! Domain model structs persisted in the local cache and the remote store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be written
//! to the remote store as a JSON record and cached locally unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::{Address, PairKey};
use crate::constants::DEFAULT_DANGER_PHRASE;
use crate::reason::AlertReason;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. The primary key is the normalized address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Generated unique id.
    pub id: Uuid,
    /// Normalized address, the record's key in both stores.
    pub address: Address,
    /// Human-readable display name.
    pub name: String,
    /// Credential secret, compared verbatim. Hardening the credential
    /// path is an external auth service's job, not this record's.
    pub secret: String,
    /// The spoken phrase that triggers an alert when heard.
    pub danger_phrase: String,
    /// Addresses that receive this user's alerts. Directed: being listed
    /// here does not make the relationship mutual. Never contains the
    /// user's own address.
    pub guardians: Vec<Address>,
}

impl User {
    /// Create a fresh account with no guardians and the default phrase.
    pub fn new(name: &str, address: Address, secret: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            name: name.trim().to_string(),
            secret: secret.to_string(),
            danger_phrase: DEFAULT_DANGER_PHRASE.to_string(),
            guardians: Vec::new(),
        }
    }

    pub fn has_guardian(&self, address: &Address) -> bool {
        self.guardians.contains(address)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message between two users. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Generated unique id, also the dedup key across stores.
    pub id: Uuid,
    pub sender: Address,
    pub receiver: Address,
    pub text: String,
    /// Assigned by the sending client at write time, not by the store.
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Message {
    pub fn new(sender: Address, receiver: Address, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            receiver,
            text: text.to_string(),
            timestamp: Utc::now(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.sender, &self.receiver)
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// One emergency alert addressed to one guardian. Fan-out produces an
/// independent record per guardian, never a shared one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: Uuid,
    pub sender: Address,
    pub receiver: Address,
    pub reason: AlertReason,
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Dismissal is a session-local UI action; the stored record keeps
    /// the flag it was created with.
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(sender: Address, receiver: Address, reason: AlertReason) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            receiver,
            reason,
            timestamp: Utc::now(),
            latitude: None,
            longitude: None,
            acknowledged: false,
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    /// Whether the alert may still start the ringing UI, measured at
    /// evaluation time.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age < chrono::Duration::seconds(crate::constants::ALERT_FRESHNESS_SECS)
    }
}

// ---------------------------------------------------------------------------
// LiveLocation
// ---------------------------------------------------------------------------

/// Latest known coordinates for a user. Singleton per address,
/// overwritten on every update; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveLocation {
    pub address: Address,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

//! Identity and guardian directory.
//!
//! Registration, login and whole-record profile updates follow the
//! cache-aside contract: the local cache and the session slot are written
//! synchronously, the remote store best-effort. Lookups for guardian
//! resolution are remote-only.

use std::sync::Arc;

use tracing::{info, warn};

use vigil_remote::{paths, RemoteStore};
use vigil_shared::{Address, User};

use crate::replicate;
use crate::{lock_db, ClientError, Result, SharedDb};

pub struct SessionService {
    db: SharedDb,
    remote: Arc<dyn RemoteStore>,
}

impl SessionService {
    pub fn new(db: SharedDb, remote: Arc<dyn RemoteStore>) -> Self {
        Self { db, remote }
    }

    /// Create an account and establish it as the current session.
    ///
    /// Rejected without any state written when the normalized address
    /// already has a local record, or when a required field is empty.
    pub async fn register(&self, name: &str, address: &str, secret: &str) -> Result<User> {
        if name.trim().is_empty() {
            return Err(ClientError::InvalidInput("name must not be empty".into()));
        }
        if secret.is_empty() {
            return Err(ClientError::InvalidInput("secret must not be empty".into()));
        }
        let address = Address::parse(address)?;

        {
            let db = lock_db(&self.db)?;
            if db.user_exists(&address)? {
                return Err(ClientError::AlreadyExists);
            }
        }

        let user = User::new(name, address.clone(), secret);

        {
            let db = lock_db(&self.db)?;
            db.upsert_user(&user)?;
            db.set_session(&address)?;
        }
        replicate::set(self.remote.as_ref(), &paths::user(&address), &user).await;

        info!(address = %address, "account registered");
        Ok(user)
    }

    /// Sign in. Local cache first (works offline), remote store as the
    /// fallback, backfilling the cache on a remote hit. A record whose
    /// secret does not match is treated exactly like an absent record.
    pub async fn login(&self, address: &str, secret: &str) -> Result<User> {
        let address = Address::parse(address)?;

        let local = {
            let db = lock_db(&self.db)?;
            db.get_user(&address)?
        };
        if let Some(user) = local {
            if user.secret == secret {
                lock_db(&self.db)?.set_session(&address)?;
                info!(address = %address, "signed in from local cache");
                return Ok(user);
            }
            return Err(ClientError::NotFound);
        }

        let remote_user = self.find_by_address(&address).await;
        match remote_user {
            Some(user) if user.secret == secret => {
                let db = lock_db(&self.db)?;
                db.upsert_user(&user)?;
                db.set_session(&address)?;
                info!(address = %address, "signed in from remote store");
                Ok(user)
            }
            _ => Err(ClientError::NotFound),
        }
    }

    /// Sign out. Idempotent; the cached records stay on the device.
    pub fn logout(&self) -> Result<()> {
        lock_db(&self.db)?.clear_session()?;
        Ok(())
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Result<Option<User>> {
        Ok(lock_db(&self.db)?.session_user()?)
    }

    /// Whole-record replace of the session user. Local cache and session
    /// slot synchronously, remote best-effort; last writer wins, no
    /// version check. Also keeps the reverse guardian index in step.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        if user.guardians.contains(&user.address) {
            return Err(ClientError::InvalidInput(
                "a user cannot be their own guardian".into(),
            ));
        }

        let previous = {
            let db = lock_db(&self.db)?;
            let previous = db.get_user(&user.address)?;
            db.upsert_user(user)?;
            db.set_session(&user.address)?;
            previous
        };

        replicate::set(self.remote.as_ref(), &paths::user(&user.address), user).await;
        self.sync_guardian_index(user, previous.as_ref()).await;
        Ok(())
    }

    /// Remote-only directory lookup. Any failure, including an
    /// unreachable store, yields `None`; callers must treat that as
    /// "unknown", not an authoritative "not found".
    pub async fn find_by_address(&self, address: &Address) -> Option<User> {
        match self.remote.get(&paths::user(address)).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(address = %address, error = %e, "malformed user record in remote store");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(address = %address, error = %e, "directory lookup failed");
                None
            }
        }
    }

    /// Everyone who has `address` in their guardian set, read from the
    /// reverse index maintained by [`SessionService::update_user`].
    pub async fn guardians_of(&self, address: &Address) -> Result<Vec<Address>> {
        let snapshot = self.remote.get(&paths::guardian_of(address)).await?;

        let Some(serde_json::Value::Object(entries)) = snapshot else {
            return Ok(Vec::new());
        };

        let mut owners = Vec::with_capacity(entries.len());
        for key in entries.keys() {
            match Address::from_normalized(key) {
                Ok(owner) => owners.push(owner),
                Err(e) => warn!(key, error = %e, "skipping malformed reverse index entry"),
            }
        }
        Ok(owners)
    }

    /// Add a guardian to the session user. Rejects the user's own
    /// address and duplicates at the edge; storage never sees them.
    pub async fn add_guardian(&self, guardian: &str) -> Result<User> {
        let guardian = Address::parse(guardian)?;
        let mut user = self.current_user()?.ok_or(ClientError::NoSession)?;

        if guardian == user.address {
            return Err(ClientError::InvalidInput(
                "a user cannot be their own guardian".into(),
            ));
        }
        if user.has_guardian(&guardian) {
            return Err(ClientError::InvalidInput(
                "this guardian is already configured".into(),
            ));
        }

        user.guardians.push(guardian);
        self.update_user(&user).await?;
        Ok(user)
    }

    /// Remove a guardian from the session user. Idempotent.
    pub async fn remove_guardian(&self, guardian: &str) -> Result<User> {
        let guardian = Address::parse(guardian)?;
        let mut user = self.current_user()?.ok_or(ClientError::NoSession)?;

        user.guardians.retain(|g| g != &guardian);
        self.update_user(&user).await?;
        Ok(user)
    }

    /// Change the spoken danger phrase of the session user.
    pub async fn set_danger_phrase(&self, phrase: &str) -> Result<User> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(ClientError::InvalidInput(
                "danger phrase must not be empty".into(),
            ));
        }

        let mut user = self.current_user()?.ok_or(ClientError::NoSession)?;
        user.danger_phrase = phrase.to_string();
        self.update_user(&user).await?;
        Ok(user)
    }

    /// Bring `guardian_of/{guardian}/{owner}` entries in line with the
    /// new guardian set. Best-effort, like every remote write.
    async fn sync_guardian_index(&self, user: &User, previous: Option<&User>) {
        let empty: Vec<Address> = Vec::new();
        let before = previous.map(|u| &u.guardians).unwrap_or(&empty);

        for added in user.guardians.iter().filter(|g| !before.contains(g)) {
            replicate::set_value(
                self.remote.as_ref(),
                &paths::guardian_of_entry(added, &user.address),
                serde_json::Value::Bool(true),
            )
            .await;
        }
        for removed in before.iter().filter(|g| !user.guardians.contains(g)) {
            replicate::remove(
                self.remote.as_ref(),
                &paths::guardian_of_entry(removed, &user.address),
            )
            .await;
        }
    }
}

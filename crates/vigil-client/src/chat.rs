//! Two-party chat on top of the dual store.
//!
//! Sends assign id and timestamp at the client, write the local cache
//! synchronously and the remote store best-effort. Subscriptions deliver
//! cached history first, then the full remote snapshot of the pair on
//! every change, re-sorted by timestamp ascending.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vigil_remote::{paths, RemoteStore};
use vigil_shared::{Address, Message, PairKey};

use crate::replicate;
use crate::{lock_db, ClientError, Result, SharedDb};

pub struct ChatService {
    db: SharedDb,
    remote: Arc<dyn RemoteStore>,
}

impl ChatService {
    pub fn new(db: SharedDb, remote: Arc<dyn RemoteStore>) -> Self {
        Self { db, remote }
    }

    /// Send a chat message. Success is decided by the local write; the
    /// remote write is best-effort. No delivery acknowledgement exists.
    pub async fn send(&self, sender: &Address, receiver: &Address, text: &str) -> Result<Message> {
        if text.trim().is_empty() {
            return Err(ClientError::InvalidInput("message must not be empty".into()));
        }

        let message = Message::new(sender.clone(), receiver.clone(), text);
        self.persist(&message).await?;
        Ok(message)
    }

    /// Persist an already-constructed message (used by the alert
    /// pipeline for companion messages carrying coordinates).
    pub async fn persist(&self, message: &Message) -> Result<()> {
        lock_db(&self.db)?.insert_message(message)?;

        let path = paths::message(&message.pair_key(), &message.id);
        replicate::set(self.remote.as_ref(), &path, message).await;

        debug!(id = %message.id, pair = %message.pair_key(), "message persisted");
        Ok(())
    }

    /// Open a live feed for the conversation between `a` and `b`.
    ///
    /// The first delivery is the cached local history if any exists;
    /// afterwards every remote change pushes the full re-sorted
    /// conversation and refreshes the cache. Dropping the feed
    /// unsubscribes.
    pub async fn subscribe(&self, a: &Address, b: &Address) -> Result<ConversationFeed> {
        let pair = PairKey::new(a, b);
        let (tx, rx) = mpsc::unbounded_channel();

        let cached = lock_db(&self.db)?.messages_for_pair(&pair)?;
        if !cached.is_empty() {
            let _ = tx.send(cached);
        }

        let task = match self.remote.subscribe(&paths::conversation(&pair)).await {
            Ok(mut sub) => {
                let db = self.db.clone();
                let pair_for_task = pair.clone();
                Some(tokio::spawn(async move {
                    while let Some(snapshot) = sub.next().await {
                        let mut messages: Vec<Message> = replicate::decode_children(snapshot);
                        messages.sort_by_key(|m| m.timestamp);

                        match db.lock() {
                            Ok(mut db) => {
                                if let Err(e) = db.replace_conversation(&pair_for_task, &messages) {
                                    warn!(pair = %pair_for_task, error = %e, "cache refresh failed");
                                }
                            }
                            Err(_) => warn!(pair = %pair_for_task, "cache lock poisoned"),
                        }

                        if tx.send(messages).is_err() {
                            break;
                        }
                    }
                }))
            }
            Err(e) => {
                // Offline: the cached history above is all the feed gets.
                warn!(pair = %pair, error = %e, "live subscription unavailable");
                None
            }
        };

        Ok(ConversationFeed { pair, rx, task })
    }

    /// Delete every message of the pair from both stores. Irreversible;
    /// confirmation is the caller's responsibility.
    pub async fn delete_conversation(&self, a: &Address, b: &Address) -> Result<()> {
        let pair = PairKey::new(a, b);

        let removed = lock_db(&self.db)?.delete_conversation(&pair)?;
        replicate::remove(self.remote.as_ref(), &paths::conversation(&pair)).await;

        info!(pair = %pair, removed, "conversation deleted");
        Ok(())
    }
}

/// Live view of one conversation, newest snapshot last.
pub struct ConversationFeed {
    pair: PairKey,
    rx: mpsc::UnboundedReceiver<Vec<Message>>,
    task: Option<JoinHandle<()>>,
}

impl ConversationFeed {
    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    /// Await the next full conversation snapshot, oldest message first.
    pub async fn next(&mut self) -> Option<Vec<Message>> {
        self.rx.recv().await
    }

    /// Detach the remote listener. Idempotent; buffered snapshots can
    /// still be drained.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for ConversationFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

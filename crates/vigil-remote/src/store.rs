//! The remote realtime store contract.
//!
//! The hosted database is a path-addressed JSON tree supporting point
//! reads/writes, append-with-generated-key, and live subscriptions that
//! push the full current value of a path on every mutation anywhere under
//! it. Vigil never reimplements the backend; it programs against this
//! trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::Result;

/// A path-addressed, subscribable JSON store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the full value at `path`, `None` if the path does not exist.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Replace the value at `path`, creating intermediate nodes.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Shallow-merge `partial` (an object) into the record at `path`.
    async fn update(&self, path: &str, partial: Value) -> Result<()>;

    /// Delete `path` and everything under it. Deleting a missing path is
    /// not an error.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Reserve a generated child key under `path` for a subsequent `set`.
    async fn push(&self, path: &str) -> Result<String>;

    /// Attach a live listener to `path`. The subscription receives the
    /// current snapshot immediately, then the full current value (or
    /// `None` for "does not exist") after every mutation under `path`.
    async fn subscribe(&self, path: &str) -> Result<Subscription>;
}

/// A live listener on one store path.
///
/// Dropping the subscription detaches the listener; [`Subscription::unsubscribe`]
/// does the same explicitly and is safe to call more than once.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Option<Value>>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Option<Value>>, active: Arc<AtomicBool>) -> Self {
        Self { rx, active }
    }

    /// Await the next snapshot push. Returns `None` once detached and the
    /// buffered pushes are drained.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::next`].
    pub fn try_next(&mut self) -> Option<Option<Value>> {
        self.rx.try_recv().ok()
    }

    /// Detach the listener. Idempotent; no further pushes are delivered
    /// after the already-buffered ones.
    pub fn unsubscribe(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

//! In-memory implementation of [`RemoteStore`].
//!
//! Backs tests and offline development. The tree is a flat map of leaf
//! paths to JSON records; subscriptions receive the full snapshot of their
//! root after every mutation under it, matching the hosted backend's
//! semantics. `set_reachable(false)` makes every operation fail with
//! [`RemoteError::Unreachable`] so offline behavior can be exercised.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::store::{RemoteStore, Subscription};
use crate::{RemoteError, Result};

#[derive(Default)]
struct Inner {
    /// Leaf path -> record. Intermediate nodes exist only implicitly.
    nodes: BTreeMap<String, Value>,
    watchers: Vec<Watcher>,
}

struct Watcher {
    root: String,
    active: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Option<Value>>,
}

/// In-memory realtime store with full-snapshot subscriptions.
#[derive(Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
    reachable: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Toggle simulated reachability. While unreachable, every operation
    /// returns [`RemoteError::Unreachable`].
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unreachable)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push the current snapshot of every watcher whose root overlaps the
    /// mutated path, dropping watchers that have detached.
    fn notify(inner: &mut Inner, mutated: &str) {
        inner.watchers.retain(|w| {
            if !w.active.load(Ordering::SeqCst) || w.tx.is_closed() {
                return false;
            }
            if overlaps(&w.root, mutated) {
                let snapshot = snapshot(&inner.nodes, &w.root);
                if w.tx.send(snapshot).is_err() {
                    return false;
                }
            }
            true
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.check_reachable()?;
        let path = validate(path)?;
        let inner = self.lock();
        Ok(snapshot(&inner.nodes, path))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.check_reachable()?;
        let path = validate(path)?;
        let mut inner = self.lock();
        remove_subtree(&mut inner.nodes, path);
        inner.nodes.insert(path.to_string(), value);
        Self::notify(&mut inner, path);
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> Result<()> {
        self.check_reachable()?;
        let path = validate(path)?;
        let mut inner = self.lock();
        let merged = match (inner.nodes.remove(path), partial) {
            (Some(Value::Object(mut existing)), Value::Object(fields)) => {
                for (k, v) in fields {
                    existing.insert(k, v);
                }
                Value::Object(existing)
            }
            (_, other) => other,
        };
        inner.nodes.insert(path.to_string(), merged);
        Self::notify(&mut inner, path);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.check_reachable()?;
        let path = validate(path)?;
        let mut inner = self.lock();
        remove_subtree(&mut inner.nodes, path);
        Self::notify(&mut inner, path);
        Ok(())
    }

    async fn push(&self, path: &str) -> Result<String> {
        self.check_reachable()?;
        validate(path)?;
        Ok(Uuid::new_v4().simple().to_string())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        self.check_reachable()?;
        let path = validate(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let mut inner = self.lock();
        // Initial snapshot on attach, before any mutation arrives.
        let _ = tx.send(snapshot(&inner.nodes, path));
        inner.watchers.push(Watcher {
            root: path.to_string(),
            active: active.clone(),
            tx,
        });
        debug!(path, watchers = inner.watchers.len(), "listener attached");

        Ok(Subscription::new(rx, active))
    }
}

fn validate(path: &str) -> Result<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|seg| seg.is_empty() || seg.contains('.')) {
        return Err(RemoteError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}

fn overlaps(root: &str, mutated: &str) -> bool {
    mutated == root
        || mutated.starts_with(&format!("{root}/"))
        || root.starts_with(&format!("{mutated}/"))
}

fn remove_subtree(nodes: &mut BTreeMap<String, Value>, path: &str) {
    let prefix = format!("{path}/");
    nodes.retain(|k, _| k != path && !k.starts_with(&prefix));
}

/// Assemble the full value at `path` from the flat leaf map, nesting any
/// descendant leaves under their relative segments.
fn snapshot(nodes: &BTreeMap<String, Value>, path: &str) -> Option<Value> {
    if let Some(v) = nodes.get(path) {
        return Some(v.clone());
    }

    let prefix = format!("{path}/");
    let mut tree = Map::new();
    for (key, value) in nodes.range(prefix.clone()..) {
        let Some(rel) = key.strip_prefix(&prefix) else {
            break;
        };
        insert_nested(&mut tree, rel, value.clone());
    }

    if tree.is_empty() {
        None
    } else {
        Some(Value::Object(tree))
    }
}

fn insert_nested(tree: &mut Map<String, Value>, rel_path: &str, value: Value) {
    match rel_path.split_once('/') {
        None => {
            tree.insert(rel_path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = tree
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_nested(map, rest, value);
            }
        }
    }
}

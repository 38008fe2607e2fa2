//! Best-effort replication to the remote store.
//!
//! Every local write that has a remote counterpart goes through these
//! helpers: failures are logged and swallowed, never retried, and never
//! surfaced to the operation that made the local write. Local persistence
//! alone decides success on the alert path.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use vigil_remote::RemoteStore;

/// Serialize and write a record; log-and-swallow on any failure.
pub async fn set<T: Serialize>(remote: &dyn RemoteStore, path: &str, record: &T) {
    match serde_json::to_value(record) {
        Ok(value) => set_value(remote, path, value).await,
        Err(e) => warn!(path, error = %e, "could not encode record for remote write"),
    }
}

pub async fn set_value(remote: &dyn RemoteStore, path: &str, value: Value) {
    if let Err(e) = remote.set(path, value).await {
        warn!(path, error = %e, "remote write failed, keeping local copy only");
    }
}

/// Best-effort delete; log-and-swallow on failure.
pub async fn remove(remote: &dyn RemoteStore, path: &str) {
    if let Err(e) = remote.remove(path).await {
        warn!(path, error = %e, "remote delete failed");
    }
}

/// Decode every child of a full-snapshot push into `T`, skipping records
/// that fail to parse. `None` (path absent) decodes to an empty list.
pub fn decode_children<T: serde::de::DeserializeOwned>(snapshot: Option<Value>) -> Vec<T> {
    let Some(Value::Object(children)) = snapshot else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(children.len());
    for (key, child) in children {
        match serde_json::from_value(child) {
            Ok(record) => records.push(record),
            Err(e) => warn!(key, error = %e, "skipping malformed record in snapshot"),
        }
    }
    records
}

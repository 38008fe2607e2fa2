//! # vigil-store
//!
//! The device-local cache: a SQLite shadow of the remote store holding the
//! current session's user record plus backups of messages and alerts.
//!
//! Consistency contract: the cache is read-optimistic and may be stale;
//! the remote store is authoritative whenever it is reachable; there is no
//! merge on conflict — the last local write wins on the device that made
//! it. The crate exposes a synchronous `Database` handle wrapping a
//! `rusqlite::Connection` with typed CRUD helpers for every domain model.

pub mod alerts;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod session;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

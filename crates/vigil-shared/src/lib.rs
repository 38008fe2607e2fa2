//! # vigil-shared
//!
//! Domain types shared by every Vigil crate: normalized addresses and
//! conversation pair keys, the persisted models (User, Message, Alert,
//! LiveLocation), alert reason codes, and the constants governing the
//! alerting pipeline.

pub mod address;
pub mod constants;
pub mod models;
pub mod reason;

mod error;

pub use address::{Address, PairKey};
pub use error::SharedError;
pub use models::{Alert, LiveLocation, Message, User};
pub use reason::AlertReason;

//! # vigil-sense
//!
//! Device-facing collaborators, each behind a trait: the geolocation
//! provider, the speech danger monitor, and the nearby-services lookup.
//! Production builds plug in platform backends; the application core and
//! the tests only ever see these contracts.

pub mod location;
pub mod monitor;
pub mod nearby;

mod error;

pub use error::SenseError;
pub use location::{Fix, FixRequest, LocationProvider};
pub use monitor::{DangerDetector, MonitorConfig, MonitorEvent, MonitorHandle, MonitorSession};
pub use nearby::{NearbyLookup, Place};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SenseError>;

//! Geolocation provider contract.
//!
//! A provider answers one-shot fix requests. The alert pipeline never
//! trusts a provider to honor its timeout; each rung of the fallback
//! ladder is additionally bounded by `tokio::time::timeout` on the caller
//! side.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_shared::constants::{
    FIX_HIGH_ACCURACY_TIMEOUT_MS, FIX_LOW_ACCURACY_MAX_AGE_MS, FIX_LOW_ACCURACY_TIMEOUT_MS,
};

use crate::Result;

/// A resolved coordinate pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub acquired_at: DateTime<Utc>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            acquired_at: Utc::now(),
        }
    }
}

/// Parameters for one fix attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the provider itself may hand back.
    pub max_age: Duration,
}

impl FixRequest {
    /// First rung: precise fix, short budget, no cached results.
    pub fn high_accuracy() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(FIX_HIGH_ACCURACY_TIMEOUT_MS),
            max_age: Duration::ZERO,
        }
    }

    /// Second rung: coarse fix, longer budget, cached results tolerated.
    pub fn low_accuracy() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_millis(FIX_LOW_ACCURACY_TIMEOUT_MS),
            max_age: Duration::from_millis(FIX_LOW_ACCURACY_MAX_AGE_MS),
        }
    }
}

/// One-shot positioning backend.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_fix(&self, request: FixRequest) -> Result<Fix>;
}

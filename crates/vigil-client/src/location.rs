//! Location acquisition fallback ladder.
//!
//! Order of attempts: high-accuracy fix with a short budget, then a
//! low-accuracy fix with a longer budget and cache-age tolerance, then
//! the last fix this session acquired, then nothing. Each rung is
//! bounded on the caller side, so the ladder can never stall an alert;
//! total failure degrades to an alert without coordinates.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use vigil_remote::{paths, RemoteStore};
use vigil_sense::{Fix, FixRequest, LocationProvider};
use vigil_shared::{Address, LiveLocation};

use crate::replicate;

/// Per-rung parameters, overridable for tests.
#[derive(Debug, Clone, Copy)]
pub struct LadderConfig {
    pub high: FixRequest,
    pub low: FixRequest,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            high: FixRequest::high_accuracy(),
            low: FixRequest::low_accuracy(),
        }
    }
}

pub struct LocationLadder {
    provider: Arc<dyn LocationProvider>,
    remote: Arc<dyn RemoteStore>,
    config: LadderConfig,
    /// Ephemeral session cache feeding the third rung.
    last_known: Mutex<Option<Fix>>,
}

impl LocationLadder {
    pub fn new(provider: Arc<dyn LocationProvider>, remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(provider, remote, LadderConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn LocationProvider>,
        remote: Arc<dyn RemoteStore>,
        config: LadderConfig,
    ) -> Self {
        Self {
            provider,
            remote,
            config,
            last_known: Mutex::new(None),
        }
    }

    /// Walk the ladder. `None` only after every rung failed.
    ///
    /// A fresh fix also refreshes the session cache and overwrites the
    /// user's live-location record best-effort.
    pub async fn acquire(&self, address: &Address) -> Option<Fix> {
        for request in [self.config.high, self.config.low] {
            match timeout(request.timeout, self.provider.current_fix(request)).await {
                Ok(Ok(fix)) => {
                    debug!(
                        high_accuracy = request.high_accuracy,
                        lat = fix.latitude,
                        lng = fix.longitude,
                        "fix acquired"
                    );
                    self.remember(fix);
                    self.publish(address, fix).await;
                    return Some(fix);
                }
                Ok(Err(e)) => {
                    debug!(high_accuracy = request.high_accuracy, error = %e, "fix attempt failed");
                }
                Err(_) => {
                    debug!(high_accuracy = request.high_accuracy, "fix attempt timed out");
                }
            }
        }

        let cached = self.last_known();
        if cached.is_some() {
            warn!("falling back to last known fix");
        } else {
            warn!("no location available, proceeding without coordinates");
        }
        cached
    }

    pub fn last_known(&self) -> Option<Fix> {
        *self.last_known.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remember(&self, fix: Fix) {
        *self.last_known.lock().unwrap_or_else(|e| e.into_inner()) = Some(fix);
    }

    /// Overwrite `locations/{address}`. Last write wins, no history.
    async fn publish(&self, address: &Address, fix: Fix) {
        let record = LiveLocation {
            address: address.clone(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp: Utc::now(),
        };
        replicate::set(self.remote.as_ref(), &paths::location(address), &record).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use vigil_remote::MemoryRemote;
    use vigil_sense::SenseError;

    struct StaticProvider(Fix);

    #[async_trait]
    impl LocationProvider for StaticProvider {
        async fn current_fix(&self, _request: FixRequest) -> vigil_sense::Result<Fix> {
            Ok(self.0)
        }
    }

    /// First rung fails, second succeeds.
    struct CoarseOnlyProvider(Fix);

    #[async_trait]
    impl LocationProvider for CoarseOnlyProvider {
        async fn current_fix(&self, request: FixRequest) -> vigil_sense::Result<Fix> {
            if request.high_accuracy {
                Err(SenseError::Timeout)
            } else {
                Ok(self.0)
            }
        }
    }

    struct NeverResolves;

    #[async_trait]
    impl LocationProvider for NeverResolves {
        async fn current_fix(&self, _request: FixRequest) -> vigil_sense::Result<Fix> {
            futures::future::pending().await
        }
    }

    fn fast_config() -> LadderConfig {
        let mut config = LadderConfig::default();
        config.high.timeout = Duration::from_millis(20);
        config.low.timeout = Duration::from_millis(20);
        config
    }

    fn addr() -> Address {
        Address::parse("ana@mail.com").unwrap()
    }

    #[tokio::test]
    async fn first_rung_success_publishes_live_location() {
        let remote = Arc::new(MemoryRemote::new());
        let ladder = LocationLadder::new(Arc::new(StaticProvider(Fix::new(48.85, 2.35))), remote.clone());

        let fix = ladder.acquire(&addr()).await.unwrap();
        assert_eq!(fix.latitude, 48.85);

        use vigil_remote::RemoteStore;
        let published = remote.get(&paths::location(&addr())).await.unwrap().unwrap();
        assert_eq!(published["latitude"], 48.85);
    }

    #[tokio::test]
    async fn falls_through_to_low_accuracy() {
        let remote = Arc::new(MemoryRemote::new());
        let ladder = LocationLadder::with_config(
            Arc::new(CoarseOnlyProvider(Fix::new(1.0, 2.0))),
            remote,
            fast_config(),
        );

        let fix = ladder.acquire(&addr()).await.unwrap();
        assert_eq!(fix.longitude, 2.0);
    }

    #[tokio::test]
    async fn hung_provider_cannot_block_the_ladder() {
        let remote = Arc::new(MemoryRemote::new());
        let ladder = LocationLadder::with_config(Arc::new(NeverResolves), remote, fast_config());

        let started = std::time::Instant::now();
        let fix = ladder.acquire(&addr()).await;
        assert!(fix.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /// Succeeds on the first call, then errors forever.
    struct OneShotProvider {
        fix: Fix,
        used: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl LocationProvider for OneShotProvider {
        async fn current_fix(&self, _request: FixRequest) -> vigil_sense::Result<Fix> {
            if self.used.swap(true, std::sync::atomic::Ordering::SeqCst) {
                Err(SenseError::DeviceUnavailable("gps gone".into()))
            } else {
                Ok(self.fix)
            }
        }
    }

    #[tokio::test]
    async fn last_known_fix_feeds_the_third_rung() {
        let remote = Arc::new(MemoryRemote::new());
        let provider = Arc::new(OneShotProvider {
            fix: Fix::new(9.0, 9.0),
            used: std::sync::atomic::AtomicBool::new(false),
        });
        let ladder = LocationLadder::with_config(provider, remote, fast_config());

        ladder.acquire(&addr()).await.unwrap();

        // Both live rungs now fail; the session cache keeps the alert
        // from going out without coordinates.
        let fallback = ladder.acquire(&addr()).await.unwrap();
        assert_eq!(fallback.latitude, 9.0);
    }
}

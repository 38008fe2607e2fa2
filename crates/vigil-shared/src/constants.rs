/// Application name
pub const APP_NAME: &str = "Vigil";

/// Danger phrase assigned to every new account until the user changes it.
pub const DEFAULT_DANGER_PHRASE: &str = "help me now";

/// How long after creation an unacknowledged alert may still start ringing.
pub const ALERT_FRESHNESS_SECS: i64 = 5 * 60;

/// High-accuracy geolocation rung: timeout in milliseconds.
pub const FIX_HIGH_ACCURACY_TIMEOUT_MS: u64 = 5_000;

/// Low-accuracy geolocation rung: timeout in milliseconds.
pub const FIX_LOW_ACCURACY_TIMEOUT_MS: u64 = 10_000;

/// Low-accuracy rung: maximum age of a cached fix the provider may return.
pub const FIX_LOW_ACCURACY_MAX_AGE_MS: u64 = 60_000;

/// Safety timer tick interval in milliseconds.
pub const TIMER_TICK_MS: u64 = 1_000;

/// Capacity of the bounded channels between background tasks and the app.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

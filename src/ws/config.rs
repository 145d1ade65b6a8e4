#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::backoff::Constant;
use bon::Builder;

const DEFAULT_DIAL_RETRY_INTERVAL_DURATION: Duration = Duration::from_secs(2);
const DEFAULT_REDIAL_DELAY_DURATION: Duration = Duration::from_secs(7);
const DEFAULT_CLOSE_RECONNECT_DELAY_DURATION: Duration = Duration::from_secs(10);
const DEFAULT_CLOSE_RECONNECT_FAILURE_DELAY_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_READ_ERROR_DELAY_DURATION: Duration = Duration::from_secs(20);
const DEFAULT_READ_ERROR_THRESHOLD: u32 = 10;
const DEFAULT_FORCED_RECONNECT_FAILURE_DELAY_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_CRASH_COOLDOWN_DURATION: Duration = Duration::from_secs(60);

/// `User-Agent` sent with the upgrade request. The subscription endpoint rejects clients that
/// do not identify themselves.
#[must_use]
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Overrides the profile's subscription endpoint, e.g. with the URL returned by
    /// `viewer { websocketSubscriptionUrl }`
    #[builder(into)]
    pub endpoint: Option<String>,
    /// `User-Agent` header for the upgrade request
    #[builder(into, default = default_user_agent())]
    pub user_agent: String,
    /// Reconnection strategy configuration
    #[builder(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            user_agent: default_user_agent(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Timings for dialing and for recovering from each class of read failure.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct ReconnectConfig {
    /// Wait between two failed dial attempts
    #[builder(default = DEFAULT_DIAL_RETRY_INTERVAL_DURATION)]
    pub dial_retry_interval: Duration,
    /// Maximum number of dial attempts before giving up.
    /// `None` means infinite retries.
    pub max_dial_attempts: Option<u32>,
    /// Wait before restarting when the initial dial gave up
    #[builder(default = DEFAULT_REDIAL_DELAY_DURATION)]
    pub redial_delay: Duration,
    /// Wait after a recognized close before reconnecting
    #[builder(default = DEFAULT_CLOSE_RECONNECT_DELAY_DURATION)]
    pub close_reconnect_delay: Duration,
    /// Extra wait when that reconnect fails
    #[builder(default = DEFAULT_CLOSE_RECONNECT_FAILURE_DELAY_DURATION)]
    pub close_reconnect_failure_delay: Duration,
    /// Wait after an unknown read error
    #[builder(default = DEFAULT_READ_ERROR_DELAY_DURATION)]
    pub read_error_delay: Duration,
    /// Consecutive unknown read errors tolerated before a forced reconnect
    #[builder(default = DEFAULT_READ_ERROR_THRESHOLD)]
    pub read_error_threshold: u32,
    /// Extra wait when a forced reconnect fails
    #[builder(default = DEFAULT_FORCED_RECONNECT_FAILURE_DELAY_DURATION)]
    pub forced_reconnect_failure_delay: Duration,
    /// Cooldown after the message router crashed
    #[builder(default = DEFAULT_CRASH_COOLDOWN_DURATION)]
    pub crash_cooldown: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            dial_retry_interval: DEFAULT_DIAL_RETRY_INTERVAL_DURATION,
            max_dial_attempts: None, // Infinite reconnection by default
            redial_delay: DEFAULT_REDIAL_DELAY_DURATION,
            close_reconnect_delay: DEFAULT_CLOSE_RECONNECT_DELAY_DURATION,
            close_reconnect_failure_delay: DEFAULT_CLOSE_RECONNECT_FAILURE_DELAY_DURATION,
            read_error_delay: DEFAULT_READ_ERROR_DELAY_DURATION,
            read_error_threshold: DEFAULT_READ_ERROR_THRESHOLD,
            forced_reconnect_failure_delay: DEFAULT_FORCED_RECONNECT_FAILURE_DELAY_DURATION,
            crash_cooldown: DEFAULT_CRASH_COOLDOWN_DURATION,
        }
    }
}

impl From<&ReconnectConfig> for Constant {
    fn from(config: &ReconnectConfig) -> Self {
        Constant::new(config.dial_retry_interval)
    }
}

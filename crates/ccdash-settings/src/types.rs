//! Dashboard server settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Network, reaper, and push-channel settings for one server instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    /// Bind address. Loopback unless explicitly overridden.
    pub host: String,
    /// Listen port (`0` picks an ephemeral port).
    pub port: u16,
    /// Sessions untouched for longer than this are evicted.
    pub idle_timeout_ms: u64,
    /// Period of the idle reaper.
    pub reaper_interval_ms: u64,
    /// SSE keep-alive comment interval in seconds (`0` disables keep-alive).
    pub keep_alive_secs: u64,
    /// Per-subscriber outbound frame buffer.
    pub subscriber_buffer: usize,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8377,
            idle_timeout_ms: 300_000,
            reaper_interval_ms: 30_000,
            keep_alive_secs: 15,
            subscriber_buffer: 64,
            log_level: "info".to_string(),
        }
    }
}

impl DashboardSettings {
    /// Idle eviction threshold.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Reaper tick period.
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    /// Keep-alive period, if enabled.
    pub fn keep_alive(&self) -> Option<Duration> {
        (self.keep_alive_secs > 0).then(|| Duration::from_secs(self.keep_alive_secs))
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("host must not be empty".into()));
        }
        if self.idle_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "idleTimeoutMs must be positive".into(),
            ));
        }
        if self.reaper_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "reaperIntervalMs must be positive".into(),
            ));
        }
        if self.subscriber_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "subscriberBuffer must be positive".into(),
            ));
        }
        Ok(())
    }
}

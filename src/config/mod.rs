//! Configuration management for the vCenter inventory poller

pub mod target;

use crate::error::{Result, VcError};
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};

pub use target::VCenterTarget;

/// Cache timing configuration.
///
/// Successful polls and failed polls are cached with different lifetimes:
/// the failure window must stay shorter than the success window so a
/// broken target is retried well before a healthy snapshot would expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTimeouts {
    /// How long a successful inventory snapshot stays servable
    #[serde(with = "humantime_serde")]
    pub success_ttl: Duration,

    /// How long a failure marker suppresses new poll attempts
    #[serde(with = "humantime_serde")]
    pub failure_ttl: Duration,
}

impl Default for CacheTimeouts {
    fn default() -> Self {
        Self {
            success_ttl: Duration::from_secs(3600),
            failure_ttl: Duration::from_secs(300),
        }
    }
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Result cache lifetimes
    pub cache: CacheTimeouts,

    /// Transport-level timeout for individual vCenter API calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            cache: CacheTimeouts::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PollerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ttl) = env::var("VCENTER_CACHE_TIMEOUT") {
            config.cache.success_ttl = Duration::from_secs(
                ttl.parse()
                    .map_err(|e| VcError::config(format!("Invalid VCENTER_CACHE_TIMEOUT: {e}")))?,
            );
        }

        if let Ok(ttl) = env::var("VCENTER_CACHE_FAILURE_TIMEOUT") {
            config.cache.failure_ttl = Duration::from_secs(ttl.parse().map_err(|e| {
                VcError::config(format!("Invalid VCENTER_CACHE_FAILURE_TIMEOUT: {e}"))
            })?);
        }

        if let Ok(timeout) = env::var("VCENTER_TIMEOUT") {
            config.request_timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|e| VcError::config(format!("Invalid VCENTER_TIMEOUT: {e}")))?,
            );
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache.success_ttl.is_zero() {
            return Err(VcError::config("Cache timeout must be greater than zero"));
        }

        if self.cache.failure_ttl.is_zero() {
            return Err(VcError::config(
                "Cache failure timeout must be greater than zero",
            ));
        }

        // A failure marker outliving a healthy snapshot would turn one bad
        // poll into an hour-long outage
        if self.cache.failure_ttl >= self.cache.success_ttl {
            return Err(VcError::config(
                "Cache failure timeout must be shorter than the cache timeout",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(VcError::config("Request timeout must be greater than zero"));
        }

        Ok(())
    }
}

//! Read path for inventory consumers
//!
//! The service answers every request from the cache and never talks to
//! vCenter itself. A cache miss hands a refresh task to the runner and
//! reports "nothing yet"; the consumer is expected to come back later.
//! Two concurrent consumers can both observe a miss and both submit; the
//! duplicate refresh is benign and the cache settles on the last write.

use crate::cache::{lookup_poll, CacheLookup, CacheStore};
use crate::config::target::VCenterTarget;
use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::inventory::InventorySnapshot;
use crate::tasks::{RefreshTask, TaskRunner};
use std::sync::Arc;
use tracing::{debug, info};

/// Cache-backed inventory access with background refresh
pub struct InventoryService {
    cache: Arc<dyn CacheStore>,
    runner: Arc<dyn TaskRunner>,
}

impl InventoryService {
    /// Create a service over a cache and task runner
    pub fn new(cache: Arc<dyn CacheStore>, runner: Arc<dyn TaskRunner>) -> Self {
        Self { cache, runner }
    }

    /// Get the current inventory snapshot for a target, if one is servable.
    ///
    /// Returns `Ok(None)` when no target is configured, when a recent
    /// poll failed (backoff window still open), or when a refresh was
    /// just dispatched and no data exists yet. The returned `Err` only
    /// ever reports cache store trouble.
    pub async fn request_inventory(
        &self,
        target: Option<&VCenterTarget>,
    ) -> Result<Option<InventorySnapshot>> {
        let Some(target) = target else {
            return Ok(None);
        };

        let key = fingerprint(target);
        debug!(server = %target.server, "Checking for VMs");

        match lookup_poll(self.cache.as_ref(), &key).await? {
            CacheLookup::Fresh(snapshot) => {
                debug!(
                    server = %target.server,
                    age_secs = snapshot.age().num_seconds(),
                    vms = snapshot.vms.len(),
                    "Found cached VMs"
                );
                Ok(Some(snapshot))
            }
            CacheLookup::Failed => {
                debug!(
                    server = %target.server,
                    "Recent poll failed; waiting out the backoff window"
                );
                Ok(None)
            }
            CacheLookup::Miss => {
                info!(server = %target.server, "Initiating background task to retrieve VMs");
                self.runner.submit(RefreshTask {
                    target: target.clone(),
                    force: false,
                });
                Ok(None)
            }
        }
    }
}

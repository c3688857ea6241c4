//! Full-poll inventory collection
//!
//! The collector owns the expensive path: connect, enumerate every VM,
//! read its hardware, resolve VLANs, and record the outcome in the result
//! cache. One VM failing to read never aborts the poll; one poll failing
//! as a whole records a failure marker that suppresses retries for the
//! configured backoff window.

use crate::cache::{lookup_poll, CacheLookup, CacheStore, CachedPoll};
use crate::client::{MoRef, VimConnector, VimSession, VirtualDisk};
use crate::config::target::VCenterTarget;
use crate::config::CacheTimeouts;
use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::inventory::vlan::{resolve_vlan, PollCaches};
use crate::inventory::{InventorySnapshot, NicInfo, VmStats};
use crate::logging::PerfLogger;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Polls become slow-operation warnings past this point
const SLOW_POLL_THRESHOLD_MS: u64 = 60_000;

/// Executes full inventory polls and records their outcomes
pub struct InventoryCollector {
    connector: Arc<dyn VimConnector>,
    cache: Arc<dyn CacheStore>,
    timeouts: CacheTimeouts,
}

impl InventoryCollector {
    /// Create a collector over a connector and result cache
    pub fn new(
        connector: Arc<dyn VimConnector>,
        cache: Arc<dyn CacheStore>,
        timeouts: CacheTimeouts,
    ) -> Self {
        Self {
            connector,
            cache,
            timeouts,
        }
    }

    /// Refresh the inventory of one target.
    ///
    /// Unless `force` is set, a live cache entry short-circuits the poll:
    /// a fresh snapshot is returned as-is and a live failure marker keeps
    /// the target untouched. The returned `Err` only ever reports cache
    /// store trouble; poll failures are recorded as failure markers and
    /// surface as `Ok(None)`.
    pub async fn refresh(
        &self,
        target: &VCenterTarget,
        force: bool,
    ) -> Result<Option<InventorySnapshot>> {
        let key = fingerprint(target);

        if !force {
            match lookup_poll(self.cache.as_ref(), &key).await? {
                CacheLookup::Fresh(snapshot) => {
                    debug!(server = %target.server, "Skipping vCenter update; server already in cache");
                    return Ok(Some(snapshot));
                }
                CacheLookup::Failed => {
                    debug!(server = %target.server, "Skipping vCenter update; server failed recently");
                    return Ok(None);
                }
                CacheLookup::Miss => {}
            }
        }

        info!(server = %target.server, "Fetching virtual machines");
        let started_at = Utc::now();
        let poll_timer = std::time::Instant::now();

        match self.poll_target(target, started_at).await {
            Ok(snapshot) => {
                self.cache
                    .set(
                        &key,
                        CachedPoll::Snapshot(snapshot.clone()),
                        self.timeouts.success_ttl,
                    )
                    .await?;

                let elapsed_ms = poll_timer.elapsed().as_millis() as u64;
                PerfLogger::log_if_slow("inventory_poll", elapsed_ms, SLOW_POLL_THRESHOLD_MS);
                info!(
                    server = %target.server,
                    vms = snapshot.vms.len(),
                    duration_ms = elapsed_ms,
                    "Inventory refresh complete"
                );

                Ok(Some(snapshot))
            }
            Err(e) => {
                error!(
                    server = %target.server,
                    error = %e,
                    backoff = ?self.timeouts.failure_ttl,
                    "Error while fetching virtual machines; disabling checks"
                );
                self.cache
                    .set(&key, CachedPoll::Failed, self.timeouts.failure_ttl)
                    .await?;

                Ok(None)
            }
        }
    }

    /// Connect, collect, and always close the session
    async fn poll_target(
        &self,
        target: &VCenterTarget,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<InventorySnapshot> {
        let mut session = self.connector.connect(target).await?;

        let outcome = self
            .collect_snapshot(session.as_ref(), target, started_at)
            .await;

        // The session is closed whether collection succeeded or not; a
        // failed logout is not worth failing an otherwise good poll over
        if let Err(e) = session.disconnect().await {
            warn!(server = %target.server, error = %e, "Failed to close vCenter session cleanly");
        }

        outcome
    }

    /// Walk every VM visible to the session
    async fn collect_snapshot(
        &self,
        session: &dyn VimSession,
        target: &VCenterTarget,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<InventorySnapshot> {
        let vm_refs = session.list_virtual_machines().await?;
        debug!(server = %target.server, count = vm_refs.len(), "Enumerated virtual machines");

        let mut vms = HashMap::new();
        let mut caches = PollCaches::new();

        for vm_ref in &vm_refs {
            match read_vm_stats(session, vm_ref, &mut caches).await {
                Ok((name, stats)) => {
                    debug!(
                        server = %target.server,
                        vm = %name,
                        nics = stats.nics.len(),
                        "Found virtual machine"
                    );
                    // Later read wins on duplicate display names
                    vms.insert(name, stats);
                }
                Err(e) => {
                    warn!(
                        server = %target.server,
                        vm = %vm_ref,
                        error = %e,
                        "Error while fetching virtual machine; skipping"
                    );
                }
            }
        }

        Ok(InventorySnapshot {
            timestamp: started_at,
            vms,
        })
    }
}

/// Read one VM's stats, resolving VLANs through the per-poll memos
async fn read_vm_stats(
    session: &dyn VimSession,
    vm_ref: &MoRef,
    caches: &mut PollCaches,
) -> Result<(String, VmStats)> {
    let config = session.read_vm(vm_ref).await?;

    let mut nics = Vec::with_capacity(config.nics.len());
    for nic in &config.nics {
        let vlan_id = resolve_vlan(session, &nic.backing, config.host.as_ref(), caches).await?;
        nics.push(NicInfo {
            label: nic.label.clone(),
            mac_address: nic.mac_address.clone(),
            vlan_id,
        });
    }

    let stats = VmStats {
        powered_on: config.power_state.map(|state| state.is_powered_on()),
        vcpus: config.num_cpu,
        memory_mb: config.memory_mb,
        disk_gb: disk_capacity_gb(&config.disks),
        nics,
    };

    Ok((config.name, stats))
}

/// Sum disk capacities and round to whole gigabytes.
///
/// Ties round away from zero, so 2.5 GB reports as 3.
fn disk_capacity_gb(disks: &[VirtualDisk]) -> Option<u64> {
    if disks.is_empty() {
        return None;
    }

    let total_kb: i64 = disks.iter().map(|disk| disk.capacity_kb).sum();
    Some((total_kb as f64 / 1_048_576.0).round() as u64)
}

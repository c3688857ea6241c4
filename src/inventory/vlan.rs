//! VLAN resolution for virtual NICs
//!
//! A NIC's VLAN lives in different places depending on its backing: for
//! distributed ports it hangs off the distributed portgroup's default
//! port config, for standard networks it sits in the portgroup table of
//! the host running the VM. Both paths are resolved here, with per-poll
//! memoization so a thousand NICs on the same switch cost one lookup.

use crate::client::{DistributedSwitch, HostPortGroup, MoRef, NicBacking, VimSession};
use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Lookup memos scoped to a single poll.
///
/// Entries are never invalidated; the caches die with the poll. Negative
/// distributed-switch lookups are memoized too, so a stale switch UUID
/// referenced by many NICs is queried once, not per NIC.
#[derive(Default)]
pub struct PollCaches {
    /// Distributed switches by UUID, `None` for switches that could not
    /// be resolved
    dvs: HashMap<String, Option<DistributedSwitch>>,
    /// Standard-switch portgroups by host identifier
    host_portgroups: HashMap<String, Vec<HostPortGroup>>,
}

impl PollCaches {
    /// Create empty memos for a new poll
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve the VLAN id of one NIC.
///
/// Distributed-switch lookup failures degrade to an unresolved VLAN for
/// this NIC (and, via the memo, for every later NIC on the same switch).
/// Host portgroup fetch failures propagate, since without the table the
/// whole VM's standard-backed NICs cannot be resolved.
pub async fn resolve_vlan(
    session: &dyn VimSession,
    backing: &NicBacking,
    host: Option<&MoRef>,
    caches: &mut PollCaches,
) -> Result<Option<String>> {
    match backing {
        NicBacking::DistributedPort {
            switch_uuid,
            portgroup_key,
        } => {
            let switch = match caches.dvs.get(switch_uuid) {
                Some(memoized) => memoized.clone(),
                None => {
                    let looked_up = match session.query_dvs_by_uuid(switch_uuid).await {
                        Ok(switch) => switch,
                        Err(e) => {
                            warn!(
                                switch_uuid = %switch_uuid,
                                error = %e,
                                "Distributed switch lookup failed; VLAN left unresolved"
                            );
                            None
                        }
                    };
                    caches.dvs.insert(switch_uuid.clone(), looked_up.clone());
                    looked_up
                }
            };

            let Some(switch) = switch else {
                return Ok(None);
            };

            let portgroup = session.lookup_dv_portgroup(&switch, portgroup_key).await?;
            Ok(portgroup
                .and_then(|pg| pg.vlan_id)
                .map(|vlan| vlan.to_string()))
        }
        NicBacking::Standard { network_name } => {
            // A VM that is not placed on any host (e.g. a template mid-
            // migration) has no portgroup table to search
            let Some(host) = host else {
                debug!(network = %network_name, "NIC on hostless VM; VLAN left unresolved");
                return Ok(None);
            };

            if !caches.host_portgroups.contains_key(&host.value) {
                let portgroups = session.host_portgroups(host).await?;
                caches
                    .host_portgroups
                    .insert(host.value.clone(), portgroups);
            }

            let portgroups = &caches.host_portgroups[&host.value];
            Ok(portgroups
                .iter()
                .find(|pg| pg.key.contains(network_name.as_str()))
                .map(|pg| pg.vlan_id.to_string()))
        }
        NicBacking::Other => Ok(None),
    }
}

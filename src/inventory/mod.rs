//! Inventory snapshots and the polling machinery that produces them

pub mod collector;
pub mod dispatcher;
pub mod vlan;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use collector::InventoryCollector;
pub use dispatcher::InventoryService;
pub use vlan::PollCaches;

/// Inventory facts for one virtual machine.
///
/// Optional fields stay unset when the remote object did not report a
/// value; consumers must not read an absent value as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmStats {
    /// Whether the guest was running at poll time
    pub powered_on: Option<bool>,
    /// Number of virtual CPUs
    pub vcpus: Option<u32>,
    /// Configured memory in megabytes
    pub memory_mb: Option<u64>,
    /// Total provisioned disk capacity in gigabytes, rounded to the
    /// nearest whole unit; unset for VMs without disks
    pub disk_gb: Option<u64>,
    /// Network adapters with resolved VLANs where possible
    pub nics: Vec<NicInfo>,
}

/// One network adapter of a virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicInfo {
    /// Device label, e.g. "Network adapter 1"
    pub label: String,
    /// MAC address assigned to the adapter
    pub mac_address: String,
    /// Resolved VLAN id, unset when the backing could not be resolved
    pub vlan_id: Option<String>,
}

/// One complete poll of a vCenter target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// When the poll producing this snapshot started
    pub timestamp: DateTime<Utc>,
    /// All reachable virtual machines, keyed by display name.
    ///
    /// vCenter does not force display names to be unique; when two VMs
    /// share one, the VM read later in the poll overwrites the earlier
    /// entry.
    pub vms: HashMap<String, VmStats>,
}

impl InventorySnapshot {
    /// Age of the snapshot relative to now
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.timestamp
    }
}

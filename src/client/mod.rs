//! vCenter client abstractions and the managed-object model
//!
//! The poller talks to vCenter through the [`VimSession`] trait, which
//! exposes exactly the reads one inventory poll needs. The production
//! implementation in [`vim_client`] speaks the vSphere VI/JSON protocol;
//! tests substitute scripted sessions.

pub mod vim_client;

use crate::config::target::VCenterTarget;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a managed object on the vCenter side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoRef {
    /// Managed object type, e.g. "VirtualMachine" or "HostSystem"
    #[serde(rename = "type")]
    pub type_name: String,
    /// Server-assigned identifier, e.g. "vm-1042"
    pub value: String,
}

impl MoRef {
    /// Create a reference from type and identifier
    pub fn new(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for MoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.value)
    }
}

/// Virtual machine power state as reported by vCenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    #[serde(rename = "poweredOn")]
    PoweredOn,
    #[serde(rename = "poweredOff")]
    PoweredOff,
    #[serde(rename = "suspended")]
    Suspended,
}

impl PowerState {
    /// Whether the guest is currently running
    pub fn is_powered_on(self) -> bool {
        matches!(self, PowerState::PoweredOn)
    }
}

/// A virtual disk attached to a VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDisk {
    /// Device label, e.g. "Hard disk 1"
    pub label: String,
    /// Provisioned capacity in kilobytes
    pub capacity_kb: i64,
}

/// Network backing of a virtual NIC, decided once at parse time.
///
/// vCenter models NIC backings as a family of polymorphic data objects;
/// the poller collapses them into the two shapes it can resolve a VLAN
/// for, plus a catch-all for everything else (opaque networks, SR-IOV,
/// direct host devices).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NicBacking {
    /// Port on a distributed virtual switch
    DistributedPort {
        /// UUID of the distributed switch the port lives on
        switch_uuid: String,
        /// Key of the distributed portgroup
        portgroup_key: String,
    },
    /// Standard-switch network, addressed by name
    Standard {
        /// Name of the backing network
        network_name: String,
    },
    /// Backing types the poller does not resolve
    Other,
}

/// A virtual ethernet card attached to a VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualEthernetCard {
    /// Device label, e.g. "Network adapter 1"
    pub label: String,
    /// MAC address assigned to the card
    pub mac_address: String,
    /// Network backing of the card
    pub backing: NicBacking,
}

/// The slice of a VM's configuration an inventory poll reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmConfig {
    /// VM display name
    pub name: String,
    /// Power state, if reported
    pub power_state: Option<PowerState>,
    /// Number of virtual CPUs, if reported
    pub num_cpu: Option<u32>,
    /// Configured memory in megabytes, if reported
    pub memory_mb: Option<u64>,
    /// Attached virtual disks
    pub disks: Vec<VirtualDisk>,
    /// Attached virtual NICs
    pub nics: Vec<VirtualEthernetCard>,
    /// Host the VM currently runs on, if placed
    pub host: Option<MoRef>,
}

/// A distributed virtual switch resolved by UUID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedSwitch {
    /// Switch UUID as carried in NIC backings
    pub uuid: String,
    /// Managed object reference of the switch
    pub moref: MoRef,
}

/// A distributed portgroup on a distributed switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DvPortgroup {
    /// Portgroup key as carried in NIC backings
    pub key: String,
    /// VLAN id from the portgroup's default port config, when it is a
    /// plain id (trunk and PVLAN configs carry none)
    pub vlan_id: Option<i32>,
}

/// A portgroup configured on a host's standard switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostPortGroup {
    /// Host-side portgroup key
    pub key: String,
    /// VLAN id from the portgroup spec
    pub vlan_id: i32,
}

/// One authenticated vCenter session.
///
/// A session is good for exactly one poll: the collector connects, reads,
/// and disconnects. Implementations must release server-side resources
/// they allocate (container views in particular) before returning from
/// each call, including on error paths.
#[async_trait]
pub trait VimSession: Send + Sync {
    /// Enumerate all virtual machines below the root folder
    async fn list_virtual_machines(&self) -> Result<Vec<MoRef>>;

    /// Read the inventory-relevant configuration of one VM
    async fn read_vm(&self, vm: &MoRef) -> Result<VmConfig>;

    /// Resolve a distributed switch by UUID, `None` when no switch with
    /// that UUID exists
    async fn query_dvs_by_uuid(&self, uuid: &str) -> Result<Option<DistributedSwitch>>;

    /// Look up a portgroup by key on a distributed switch, `None` when
    /// the key is unknown to the switch
    async fn lookup_dv_portgroup(
        &self,
        switch: &DistributedSwitch,
        portgroup_key: &str,
    ) -> Result<Option<DvPortgroup>>;

    /// List the standard-switch portgroups configured on a host
    async fn host_portgroups(&self, host: &MoRef) -> Result<Vec<HostPortGroup>>;

    /// Terminate the session on the server
    async fn disconnect(&mut self) -> Result<()>;
}

/// Factory producing authenticated sessions for a target
#[async_trait]
pub trait VimConnector: Send + Sync {
    /// Connect and authenticate against the target
    async fn connect(&self, target: &VCenterTarget) -> Result<Box<dyn VimSession>>;
}

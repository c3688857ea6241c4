//! Scripted trait implementations and reusable test data
//!
//! These fakes run the polling machinery without any HTTP: sessions are
//! pre-loaded with VMs, switches, and portgroup tables, and record how
//! often each read was made so tests can assert on lookup behavior.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use vcenter_inventory::cache::{CacheStore, CachedPoll};
use vcenter_inventory::client::{
    DistributedSwitch, DvPortgroup, HostPortGroup, MoRef, NicBacking, PowerState, VimConnector,
    VimSession, VirtualDisk, VirtualEthernetCard, VmConfig,
};
use vcenter_inventory::config::CacheTimeouts;
use vcenter_inventory::error::{Result, VcError};
use vcenter_inventory::fingerprint::Fingerprint;
use vcenter_inventory::tasks::{RefreshTask, TaskRunner};
use vcenter_inventory::VCenterTarget;

/// Standard target used across tests
pub fn test_target() -> VCenterTarget {
    VCenterTarget::new("vcenter.example.com", "svc-netbox", "hunter2")
}

/// Default cache lifetimes matching production defaults
pub fn test_timeouts() -> CacheTimeouts {
    CacheTimeouts {
        success_ttl: Duration::from_secs(3600),
        failure_ttl: Duration::from_secs(300),
    }
}

/// A powered-on VM with two vCPUs, 4 GiB of memory and one 40 GiB disk
pub fn basic_vm(name: &str) -> VmConfig {
    VmConfig {
        name: name.to_string(),
        power_state: Some(PowerState::PoweredOn),
        num_cpu: Some(2),
        memory_mb: Some(4096),
        disks: vec![VirtualDisk {
            label: "Hard disk 1".to_string(),
            capacity_kb: 41_943_040,
        }],
        nics: Vec::new(),
        host: None,
    }
}

/// A NIC backed by a distributed switch port
pub fn distributed_nic(label: &str, switch_uuid: &str, portgroup_key: &str) -> VirtualEthernetCard {
    VirtualEthernetCard {
        label: label.to_string(),
        mac_address: "00:50:56:aa:bb:cc".to_string(),
        backing: NicBacking::DistributedPort {
            switch_uuid: switch_uuid.to_string(),
            portgroup_key: portgroup_key.to_string(),
        },
    }
}

/// A NIC backed by a named standard-switch network
pub fn standard_nic(label: &str, network_name: &str) -> VirtualEthernetCard {
    VirtualEthernetCard {
        label: label.to_string(),
        mac_address: "00:50:56:dd:ee:ff".to_string(),
        backing: NicBacking::Standard {
            network_name: network_name.to_string(),
        },
    }
}

/// A host-side standard portgroup entry
pub fn host_pg(key: &str, vlan_id: i32) -> HostPortGroup {
    HostPortGroup {
        key: key.to_string(),
        vlan_id,
    }
}

/// Per-method call counters recorded by [`MockVimSession`]
#[derive(Debug, Default, Clone)]
pub struct SessionCalls {
    pub list_virtual_machines: usize,
    pub read_vm: usize,
    pub query_dvs_by_uuid: usize,
    pub lookup_dv_portgroup: usize,
    pub host_portgroups: usize,
    pub disconnect: usize,
}

/// One VM as a scripted session serves it: either a config or an error
pub struct ScriptedVm {
    pub moref: MoRef,
    pub outcome: std::result::Result<VmConfig, String>,
}

/// Scripted in-memory vCenter session.
///
/// Configure the public fields, then hand the session to a
/// [`MockVimConnector`]. Clone `calls` first to keep a handle on the
/// counters after the session moves into the collector.
#[derive(Default)]
pub struct MockVimSession {
    /// VMs returned by listing, in order
    pub vms: Vec<ScriptedVm>,
    /// Distributed switches by UUID
    pub switches: HashMap<String, DistributedSwitch>,
    /// Distributed portgroups keyed by "switch_uuid/portgroup_key"
    pub dv_portgroups: HashMap<String, DvPortgroup>,
    /// Standard portgroup tables keyed by host identifier
    pub host_networks: HashMap<String, Vec<HostPortGroup>>,
    /// Fail the listing call itself
    pub fail_listing: bool,
    /// Switch UUIDs whose lookup errors instead of answering
    pub failing_switches: Vec<String>,
    /// Host identifiers whose portgroup fetch errors
    pub failing_hosts: Vec<String>,
    /// Shared call counters
    pub calls: Arc<RwLock<SessionCalls>>,
}

impl MockVimSession {
    /// Add a VM that reads successfully
    pub fn with_vm(mut self, moref_value: &str, config: VmConfig) -> Self {
        self.vms.push(ScriptedVm {
            moref: MoRef::new("VirtualMachine", moref_value),
            outcome: Ok(config),
        });
        self
    }

    /// Add a VM whose read fails
    pub fn with_broken_vm(mut self, moref_value: &str, error: &str) -> Self {
        self.vms.push(ScriptedVm {
            moref: MoRef::new("VirtualMachine", moref_value),
            outcome: Err(error.to_string()),
        });
        self
    }

    /// Register a distributed switch
    pub fn with_switch(mut self, uuid: &str, moref_value: &str) -> Self {
        self.switches.insert(
            uuid.to_string(),
            DistributedSwitch {
                uuid: uuid.to_string(),
                moref: MoRef::new("VmwareDistributedVirtualSwitch", moref_value),
            },
        );
        self
    }

    /// Register a distributed portgroup on a switch
    pub fn with_dv_portgroup(mut self, switch_uuid: &str, key: &str, vlan_id: Option<i32>) -> Self {
        self.dv_portgroups.insert(
            format!("{switch_uuid}/{key}"),
            DvPortgroup {
                key: key.to_string(),
                vlan_id,
            },
        );
        self
    }

    /// Register a host's standard portgroup table
    pub fn with_host_networks(mut self, host_id: &str, portgroups: Vec<HostPortGroup>) -> Self {
        self.host_networks.insert(host_id.to_string(), portgroups);
        self
    }
}

#[async_trait]
impl VimSession for MockVimSession {
    async fn list_virtual_machines(&self) -> Result<Vec<MoRef>> {
        self.calls.write().await.list_virtual_machines += 1;

        if self.fail_listing {
            return Err(VcError::fault("scripted listing failure"));
        }

        Ok(self.vms.iter().map(|vm| vm.moref.clone()).collect())
    }

    async fn read_vm(&self, vm: &MoRef) -> Result<VmConfig> {
        self.calls.write().await.read_vm += 1;

        let scripted = self
            .vms
            .iter()
            .find(|scripted| &scripted.moref == vm)
            .ok_or_else(|| VcError::not_found(format!("no scripted VM {vm}")))?;

        match &scripted.outcome {
            Ok(config) => Ok(config.clone()),
            Err(message) => Err(VcError::inventory(message.clone())),
        }
    }

    async fn query_dvs_by_uuid(&self, uuid: &str) -> Result<Option<DistributedSwitch>> {
        self.calls.write().await.query_dvs_by_uuid += 1;

        if self.failing_switches.iter().any(|failing| failing == uuid) {
            return Err(VcError::fault("scripted switch lookup failure"));
        }

        Ok(self.switches.get(uuid).cloned())
    }

    async fn lookup_dv_portgroup(
        &self,
        switch: &DistributedSwitch,
        portgroup_key: &str,
    ) -> Result<Option<DvPortgroup>> {
        self.calls.write().await.lookup_dv_portgroup += 1;

        Ok(self
            .dv_portgroups
            .get(&format!("{}/{}", switch.uuid, portgroup_key))
            .cloned())
    }

    async fn host_portgroups(&self, host: &MoRef) -> Result<Vec<HostPortGroup>> {
        self.calls.write().await.host_portgroups += 1;

        if self.failing_hosts.iter().any(|failing| failing == &host.value) {
            return Err(VcError::fault("scripted host network failure"));
        }

        Ok(self.host_networks.get(&host.value).cloned().unwrap_or_default())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.calls.write().await.disconnect += 1;
        Ok(())
    }
}

/// Connector serving a queue of scripted sessions, one per poll
#[derive(Default)]
pub struct MockVimConnector {
    sessions: RwLock<Vec<MockVimSession>>,
    pub connect_calls: Arc<RwLock<usize>>,
    pub fail_connect: bool,
}

impl MockVimConnector {
    /// Connector whose every connect attempt fails
    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Queue a session for the next connect
    pub fn with_session(mut self, session: MockVimSession) -> Self {
        self.sessions.get_mut().push(session);
        self
    }

    /// Queue a session from an async context
    pub async fn push_session(&self, session: MockVimSession) {
        self.sessions.write().await.push(session);
    }

    /// How many times connect was attempted
    pub async fn connects(&self) -> usize {
        *self.connect_calls.read().await
    }
}

#[async_trait]
impl VimConnector for MockVimConnector {
    async fn connect(&self, _target: &VCenterTarget) -> Result<Box<dyn VimSession>> {
        *self.connect_calls.write().await += 1;

        if self.fail_connect {
            return Err(VcError::connection("scripted connect failure"));
        }

        let mut sessions = self.sessions.write().await;
        if sessions.is_empty() {
            return Err(VcError::connection("no scripted session queued"));
        }

        Ok(Box::new(sessions.remove(0)))
    }
}

/// Task runner that records submissions instead of executing them
#[derive(Default)]
pub struct RecordingRunner {
    submitted: std::sync::Mutex<Vec<RefreshTask>>,
}

impl RecordingRunner {
    /// Snapshot of submitted tasks
    pub fn submitted(&self) -> Vec<RefreshTask> {
        self.submitted.lock().unwrap().clone()
    }

    /// Number of submissions so far
    pub fn len(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    /// Whether nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TaskRunner for RecordingRunner {
    fn submit(&self, task: RefreshTask) {
        self.submitted.lock().unwrap().push(task);
    }
}

/// Cache store whose every operation fails
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &Fingerprint) -> Result<Option<CachedPoll>> {
        Err(VcError::cache("store offline"))
    }

    async fn set(&self, _key: &Fingerprint, _value: CachedPoll, _ttl: Duration) -> Result<()> {
        Err(VcError::cache("store offline"))
    }
}

//! HTTP session implementation for the vSphere VI/JSON API
//!
//! vCenter 8 exposes the classic vim25 SOAP surface as a JSON protocol
//! under `/sdk/vim25/{release}/{type}/{moId}/{method}`. Each managed
//! object method is a POST with a JSON parameter object; faults come back
//! as JSON data objects carrying a `_typeName` discriminator. This module
//! implements the handful of calls an inventory poll needs on top of that
//! protocol.

use crate::client::{
    DistributedSwitch, DvPortgroup, HostPortGroup, MoRef, NicBacking, PowerState,
    VimConnector, VimSession, VirtualDisk, VirtualEthernetCard, VmConfig,
};
use crate::config::target::VCenterTarget;
use crate::error::{Result, VcError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// vim25 release the client pins its URLs to
const VIM_VERSION: &str = "8.0.2.0";

/// Session header used by the VI/JSON protocol
const SESSION_HEADER: &str = "vmware-api-session-id";

/// Service content advertised by the ServiceInstance singleton
#[derive(Debug, Clone, Deserialize)]
struct ServiceContent {
    #[serde(rename = "rootFolder")]
    root_folder: MoRef,
    #[serde(rename = "viewManager")]
    view_manager: MoRef,
    #[serde(rename = "propertyCollector")]
    property_collector: MoRef,
    #[serde(rename = "sessionManager")]
    session_manager: MoRef,
    /// Absent on hosts without distributed switching support
    #[serde(rename = "dvSwitchManager")]
    dvs_manager: Option<MoRef>,
    about: Option<AboutInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct AboutInfo {
    #[serde(rename = "fullName")]
    full_name: String,
}

/// Batch of properties returned by the property collector
#[derive(Debug, Deserialize)]
struct RetrieveResult {
    token: Option<String>,
    #[serde(default)]
    objects: Vec<ObjectContent>,
}

#[derive(Debug, Deserialize)]
struct ObjectContent {
    #[serde(rename = "propSet", default)]
    prop_set: Vec<DynamicProperty>,
}

#[derive(Debug, Deserialize)]
struct DynamicProperty {
    name: String,
    val: Value,
}

/// Connector producing VI/JSON sessions
pub struct VimHttpConnector {
    /// Transport-level timeout applied to each API call
    request_timeout: Duration,
}

impl VimHttpConnector {
    /// Create a connector with the given per-request timeout
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Build the server's root URL, defaulting to https when the target
    /// gives a bare hostname
    fn base_url(target: &VCenterTarget) -> Result<Url> {
        let url_str = if target.server.starts_with("http://") || target.server.starts_with("https://")
        {
            target.server.clone()
        } else {
            format!("https://{}", target.server)
        };

        url_str
            .parse()
            .map_err(|e| VcError::connection(format!("Invalid vCenter server address: {e}")))
    }
}

#[async_trait]
impl VimConnector for VimHttpConnector {
    async fn connect(&self, target: &VCenterTarget) -> Result<Box<dyn VimSession>> {
        let base_url = Self::base_url(target)?;

        // Build HTTP client with appropriate settings
        let mut client_builder = ClientBuilder::new()
            .timeout(self.request_timeout)
            .user_agent(format!("vcenter-inventory/{}", env!("CARGO_PKG_VERSION")));

        // Handle SSL verification
        if !target.validate_certificate {
            warn!("SSL verification disabled - this is insecure for production use");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| VcError::connection(format!("Failed to build HTTP client: {e}")))?;

        info!("Connecting to vCenter at {base_url}");

        let service_instance = MoRef::new("ServiceInstance", "ServiceInstance");
        let content_value = invoke(
            &client,
            &base_url,
            None,
            &service_instance,
            "RetrieveServiceContent",
            Value::Null,
        )
        .await?;
        let content: ServiceContent = serde_json::from_value(content_value)?;

        let session_key = login(&client, &base_url, &content, target).await?;

        if let Some(about) = &content.about {
            info!("✅ Connected to {} ({})", target.server, about.full_name);
        } else {
            info!("✅ Connected to {}", target.server);
        }

        Ok(Box::new(VimHttpSession {
            client,
            base_url,
            content,
            session_key: Some(session_key),
            server: target.server.clone(),
        }))
    }
}

/// Authenticate and return the session key from the response header
async fn login(
    client: &Client,
    base_url: &Url,
    content: &ServiceContent,
    target: &VCenterTarget,
) -> Result<String> {
    let url = method_url(base_url, &content.session_manager, "Login")?;
    let body = json!({
        "userName": target.username,
        "password": target.password,
    });

    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(map_transport_error)?;

    if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN {
        return Err(VcError::authentication(format!(
            "Login rejected for user {} on {}",
            target.username, target.server
        )));
    }

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(classify_fault(status, &text));
    }

    let session_key = response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            VcError::authentication("Login response carried no session header")
        })?;

    Ok(session_key)
}

/// One authenticated VI/JSON session against a vCenter server
pub struct VimHttpSession {
    /// HTTP client instance
    client: Client,

    /// Server root URL
    base_url: Url,

    /// Service content retrieved during the handshake
    content: ServiceContent,

    /// Session key, cleared on disconnect
    session_key: Option<String>,

    /// Server name for log context
    server: String,
}

impl VimHttpSession {
    /// Invoke a managed object method within this session
    async fn call(&self, obj: &MoRef, method: &str, body: Value) -> Result<Value> {
        let session_key = self
            .session_key
            .as_deref()
            .ok_or_else(|| VcError::connection("Session already disconnected"))?;

        invoke(
            &self.client,
            &self.base_url,
            Some(session_key),
            obj,
            method,
            body,
        )
        .await
    }

    /// Retrieve selected properties of one managed object.
    ///
    /// Follows the property collector's continuation token, so large
    /// container views come back complete.
    async fn fetch_properties(
        &self,
        obj: &MoRef,
        paths: &[&str],
    ) -> Result<HashMap<String, Value>> {
        let body = json!({
            "specSet": [{
                "propSet": [{
                    "type": obj.type_name,
                    "all": false,
                    "pathSet": paths,
                }],
                "objectSet": [{
                    "obj": obj,
                    "skip": false,
                }],
            }],
            "options": {},
        });

        let mut properties = HashMap::new();
        let mut result: RetrieveResult = match self
            .call(&self.content.property_collector, "RetrievePropertiesEx", body)
            .await?
        {
            Value::Null => return Ok(properties),
            value => serde_json::from_value(value)?,
        };

        loop {
            for object in result.objects {
                for prop in object.prop_set {
                    properties.insert(prop.name, prop.val);
                }
            }

            let Some(token) = result.token else { break };
            let continued = self
                .call(
                    &self.content.property_collector,
                    "ContinueRetrievePropertiesEx",
                    json!({ "token": token }),
                )
                .await?;
            result = serde_json::from_value(continued)?;
        }

        Ok(properties)
    }

    /// Retrieve a single property, `Null` when the server did not report it
    async fn fetch_property(&self, obj: &MoRef, path: &str) -> Result<Value> {
        let mut properties = self.fetch_properties(obj, &[path]).await?;
        Ok(properties.remove(path).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl VimSession for VimHttpSession {
    async fn list_virtual_machines(&self) -> Result<Vec<MoRef>> {
        // A container view materializes the folder hierarchy as a flat
        // list; it must be destroyed even when reading it fails
        let view_value = self
            .call(
                &self.content.view_manager,
                "CreateContainerView",
                json!({
                    "container": self.content.root_folder,
                    "type": ["VirtualMachine"],
                    "recursive": true,
                }),
            )
            .await?;
        let view: MoRef = serde_json::from_value(view_value)?;

        let contents = self.fetch_property(&view, "view").await;

        if let Err(e) = self.call(&view, "DestroyView", Value::Null).await {
            warn!(server = %self.server, error = %e, "Failed to destroy container view");
        }

        match contents? {
            Value::Null => Ok(Vec::new()),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    async fn read_vm(&self, vm: &MoRef) -> Result<VmConfig> {
        let mut properties = self
            .fetch_properties(
                vm,
                &["name", "runtime.powerState", "runtime.host", "config.hardware"],
            )
            .await?;

        let name = properties
            .remove("name")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| VcError::inventory(format!("{vm} reported no name")))?;

        let power_state = properties
            .remove("runtime.powerState")
            .and_then(|v| match serde_json::from_value::<PowerState>(v.clone()) {
                Ok(state) => Some(state),
                Err(_) => {
                    debug!(vm = %vm, value = %v, "Unrecognized power state");
                    None
                }
            });

        let host = properties
            .remove("runtime.host")
            .and_then(|v| serde_json::from_value(v).ok());

        let mut num_cpu = None;
        let mut memory_mb = None;
        let mut disks = Vec::new();
        let mut nics = Vec::new();

        if let Some(hardware) = properties.remove("config.hardware") {
            num_cpu = hardware
                .get("numCPU")
                .and_then(Value::as_u64)
                .map(|n| n as u32);
            memory_mb = hardware.get("memoryMB").and_then(Value::as_u64);

            if let Some(devices) = hardware.get("device").and_then(Value::as_array) {
                (disks, nics) = parse_devices(devices);
            }
        }

        Ok(VmConfig {
            name,
            power_state,
            num_cpu,
            memory_mb,
            disks,
            nics,
            host,
        })
    }

    async fn query_dvs_by_uuid(&self, uuid: &str) -> Result<Option<DistributedSwitch>> {
        // Endpoints without distributed switching have no switch manager
        let Some(dvs_manager) = &self.content.dvs_manager else {
            return Ok(None);
        };

        let result = self
            .call(dvs_manager, "QueryDvsByUuid", json!({ "uuid": uuid }))
            .await;

        let moref: Option<MoRef> = match result {
            Ok(Value::Null) => None,
            Ok(value) => Some(serde_json::from_value(value)?),
            Err(VcError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(moref.map(|moref| DistributedSwitch {
            uuid: uuid.to_string(),
            moref,
        }))
    }

    async fn lookup_dv_portgroup(
        &self,
        switch: &DistributedSwitch,
        portgroup_key: &str,
    ) -> Result<Option<DvPortgroup>> {
        let result = self
            .call(
                &switch.moref,
                "LookupDvPortGroup",
                json!({ "portgroupKey": portgroup_key }),
            )
            .await;

        let moref: Option<MoRef> = match result {
            Ok(Value::Null) => None,
            Ok(value) => Some(serde_json::from_value(value)?),
            Err(VcError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let Some(moref) = moref else { return Ok(None) };

        let port_config = self
            .fetch_property(&moref, "config.defaultPortConfig")
            .await?;

        Ok(Some(DvPortgroup {
            key: portgroup_key.to_string(),
            vlan_id: parse_vlan_spec(&port_config),
        }))
    }

    async fn host_portgroups(&self, host: &MoRef) -> Result<Vec<HostPortGroup>> {
        let value = self.fetch_property(host, "config.network.portgroup").await?;

        let Some(entries) = value.as_array() else {
            return Ok(Vec::new());
        };

        let mut portgroups = Vec::new();
        for entry in entries {
            let key = entry.get("key").and_then(Value::as_str);
            let vlan_id = entry
                .get("spec")
                .and_then(|spec| spec.get("vlanId"))
                .and_then(Value::as_i64);

            match (key, vlan_id) {
                (Some(key), Some(vlan_id)) => portgroups.push(HostPortGroup {
                    key: key.to_string(),
                    vlan_id: vlan_id as i32,
                }),
                _ => debug!(host = %host, "Skipping malformed host portgroup entry"),
            }
        }

        Ok(portgroups)
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Logout is idempotent from the caller's perspective
        if self.session_key.is_none() {
            return Ok(());
        }

        let result = self
            .call(&self.content.session_manager, "Logout", Value::Null)
            .await;
        self.session_key = None;

        match result {
            Ok(_) => {
                info!(server = %self.server, "Disconnected from vCenter");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Build the URL of a managed object method
fn method_url(base_url: &Url, obj: &MoRef, method: &str) -> Result<Url> {
    let path = format!(
        "sdk/vim25/{VIM_VERSION}/{}/{}/{}",
        obj.type_name, obj.value, method
    );

    base_url
        .join(&path)
        .map_err(|e| VcError::connection(format!("Invalid URL path {path}: {e}")))
}

/// Execute one VI/JSON method call
async fn invoke(
    client: &Client,
    base_url: &Url,
    session_key: Option<&str>,
    obj: &MoRef,
    method: &str,
    body: Value,
) -> Result<Value> {
    let url = method_url(base_url, obj, method)?;
    debug!("Invoking {method} on {obj}");

    let mut request = client.post(url);
    if let Some(key) = session_key {
        request = request.header(SESSION_HEADER, key);
    }
    if !body.is_null() {
        request = request.json(&body);
    }

    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();

    if status.is_success() {
        let text = response.text().await.map_err(map_transport_error)?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    let text = response.text().await.unwrap_or_default();
    Err(classify_fault(status, &text))
}

/// Map reqwest transport failures onto the error taxonomy
fn map_transport_error(e: reqwest::Error) -> VcError {
    if e.is_timeout() {
        VcError::timeout(format!("HTTP request failed: {e}"))
    } else if e.is_connect() {
        VcError::connection(format!("HTTP request failed: {e}"))
    } else {
        VcError::Http(e)
    }
}

/// Turn a non-success response into a typed error.
///
/// Fault bodies are JSON data objects whose `_typeName` names the vim
/// fault class, e.g. "InvalidLogin" or "ManagedObjectNotFound".
fn classify_fault(status: StatusCode, body: &str) -> VcError {
    let fault_name = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("_typeName")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    if let Some(name) = fault_name {
        if name.contains("InvalidLogin") || name.contains("NoPermission") {
            return VcError::authentication(format!("vCenter rejected the request: {name}"));
        }
        if name.contains("NotFound") {
            return VcError::not_found(name);
        }
        if name.contains("NotAuthenticated") {
            return VcError::authentication(name);
        }
        return VcError::fault(name);
    }

    match status.as_u16() {
        401 | 403 => VcError::authentication(format!("HTTP error {status}")),
        404 => VcError::not_found(format!("HTTP error {status}")),
        500..=599 => VcError::fault(format!("HTTP error {status}: {body}")),
        _ => VcError::connection(format!("HTTP error {status}: {body}")),
    }
}

/// Split a hardware device list into disks and ethernet cards.
///
/// Devices are polymorphic on the wire; a `macAddress` field marks every
/// ethernet card variant, `_typeName == "VirtualDisk"` marks disks, and
/// anything else (controllers, CD drives, serial ports) is ignored.
fn parse_devices(devices: &[Value]) -> (Vec<VirtualDisk>, Vec<VirtualEthernetCard>) {
    let mut disks = Vec::new();
    let mut nics = Vec::new();

    for device in devices {
        let type_name = device.get("_typeName").and_then(Value::as_str).unwrap_or("");
        let label = device
            .get("deviceInfo")
            .and_then(|info| info.get("label"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        if type_name == "VirtualDisk" {
            if let Some(capacity_kb) = device.get("capacityInKB").and_then(Value::as_i64) {
                disks.push(VirtualDisk { label, capacity_kb });
            }
            continue;
        }

        if let Some(mac_address) = device.get("macAddress").and_then(Value::as_str) {
            nics.push(VirtualEthernetCard {
                label,
                mac_address: mac_address.to_string(),
                backing: parse_nic_backing(device.get("backing")),
            });
        }
    }

    (disks, nics)
}

/// Decide the backing shape of an ethernet card
fn parse_nic_backing(backing: Option<&Value>) -> NicBacking {
    let Some(backing) = backing else {
        return NicBacking::Other;
    };

    match backing.get("_typeName").and_then(Value::as_str) {
        Some("VirtualEthernetCardDistributedVirtualPortBackingInfo") => {
            let port = backing.get("port");
            let switch_uuid = port
                .and_then(|p| p.get("switchUuid"))
                .and_then(Value::as_str);
            let portgroup_key = port
                .and_then(|p| p.get("portgroupKey"))
                .and_then(Value::as_str);

            match (switch_uuid, portgroup_key) {
                (Some(switch_uuid), Some(portgroup_key)) => NicBacking::DistributedPort {
                    switch_uuid: switch_uuid.to_string(),
                    portgroup_key: portgroup_key.to_string(),
                },
                _ => NicBacking::Other,
            }
        }
        Some("VirtualEthernetCardNetworkBackingInfo") => {
            match backing.get("deviceName").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => NicBacking::Standard {
                    network_name: name.to_string(),
                },
                _ => NicBacking::Other,
            }
        }
        _ => NicBacking::Other,
    }
}

/// Extract a plain VLAN id from a portgroup's default port config
fn parse_vlan_spec(port_config: &Value) -> Option<i32> {
    let vlan = port_config.get("vlan")?;

    // Trunk and PVLAN specs carry ranges or secondary ids, not a single
    // usable VLAN id
    if vlan.get("_typeName").and_then(Value::as_str)
        != Some("VmwareDistributedVirtualSwitchVlanIdSpec")
    {
        return None;
    }

    vlan.get("vlanId").and_then(Value::as_i64).map(|id| id as i32)
}

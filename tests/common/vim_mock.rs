//! WireMock-based vCenter VI/JSON mocking infrastructure
//!
//! Simulates the `/sdk/vim25/{release}/{type}/{moId}/{method}` endpoint
//! family closely enough to exercise the HTTP session end to end:
//! service content discovery, login with the session header, property
//! collector reads, and fault bodies.

use serde_json::json;
use vcenter_inventory::VCenterTarget;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// vim25 release segment the client pins its URLs to
pub const VIM_RELEASE: &str = "8.0.2.0";

/// Session key handed out by the mock login endpoint
pub const MOCK_SESSION_KEY: &str = "mock-session-0001";

/// Absolute path of a managed object method
pub fn vim_path(type_name: &str, moid: &str, vim_method: &str) -> String {
    format!("/sdk/vim25/{VIM_RELEASE}/{type_name}/{moid}/{vim_method}")
}

/// Service content body advertised by the mock
pub fn service_content_body() -> serde_json::Value {
    json!({
        "rootFolder": {"type": "Folder", "value": "group-d1"},
        "viewManager": {"type": "ViewManager", "value": "ViewManager"},
        "propertyCollector": {"type": "PropertyCollector", "value": "propertyCollector"},
        "sessionManager": {"type": "SessionManager", "value": "SessionManager"},
        "dvSwitchManager": {
            "type": "VmwareDistributedVirtualSwitchManager",
            "value": "DVSManager"
        },
        "about": {"fullName": "VMware vCenter Server 8.0.2 build-22617221"}
    })
}

/// Mount the ServiceInstance handshake endpoint
pub async fn mount_service_content(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(vim_path(
            "ServiceInstance",
            "ServiceInstance",
            "RetrieveServiceContent",
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_content_body()))
        .mount(server)
        .await;
}

/// Mount a login endpoint that accepts any credentials
pub async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(vim_path("SessionManager", "SessionManager", "Login")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("vmware-api-session-id", MOCK_SESSION_KEY)
                .set_body_json(json!({
                    "key": MOCK_SESSION_KEY,
                    "userName": "svc-netbox",
                    "fullName": "NetBox service account"
                })),
        )
        .mount(server)
        .await;
}

/// Mount a login endpoint that rejects all credentials
pub async fn mount_login_rejected(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(vim_path("SessionManager", "SessionManager", "Login")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "_typeName": "InvalidLogin",
            "faultMessage": []
        })))
        .mount(server)
        .await;
}

/// Mount the logout endpoint
pub async fn mount_logout(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(vim_path("SessionManager", "SessionManager", "Logout")))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Mock vCenter server with a working handshake pre-mounted
pub struct MockVCenterServer {
    pub server: MockServer,
}

impl MockVCenterServer {
    /// Start with service content, login, and logout mocked
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        mount_service_content(&server).await;
        mount_login_ok(&server).await;
        mount_logout(&server).await;

        Self { server }
    }

    /// Target pointing at the mock, certificate checks off
    pub fn target(&self) -> VCenterTarget {
        let mut target = VCenterTarget::new(self.server.uri(), "svc-netbox", "hunter2");
        target.validate_certificate = false;
        target
    }

    /// Base URI of the mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mount an additional mock
    pub async fn add_mock(&self, mock: Mock) {
        mock.mount(&self.server).await;
    }

    /// Mount the container view endpoints for a fixed set of VM ids.
    ///
    /// Mounts CreateContainerView, the property collector read of the
    /// view (matched on its "ContainerView" prop spec), and DestroyView
    /// with an expectation of exactly one call.
    pub async fn mock_vm_listing(&self, vm_ids: &[&str]) {
        let morefs: Vec<_> = vm_ids
            .iter()
            .map(|id| json!({"type": "VirtualMachine", "value": id}))
            .collect();

        Mock::given(method("POST"))
            .and(path(vim_path("ViewManager", "ViewManager", "CreateContainerView")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "ContainerView",
                "value": "view-100"
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(vim_path(
                "PropertyCollector",
                "propertyCollector",
                "RetrievePropertiesEx",
            )))
            .and(body_string_contains("ContainerView"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "objects": [{
                    "obj": {"type": "ContainerView", "value": "view-100"},
                    "propSet": [{"name": "view", "val": morefs}]
                }]
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(vim_path("ContainerView", "view-100", "DestroyView")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

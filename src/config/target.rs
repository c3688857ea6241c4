//! Poll target descriptor for a vCenter endpoint

use crate::error::{Result, VcError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Connection coordinates and credentials for one vCenter server.
///
/// The target is a plain value object: it carries no connection state and
/// can be cloned freely into background tasks. Cache identity is derived
/// from the server and credential fields (see [`crate::fingerprint`]),
/// while `validate_certificate` only affects transport behavior.
#[derive(Clone, Serialize, Deserialize)]
pub struct VCenterTarget {
    /// Server hostname or IP, optionally with an explicit scheme
    pub server: String,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,

    /// Verify the server's TLS certificate
    #[serde(default = "default_validate_certificate")]
    pub validate_certificate: bool,
}

fn default_validate_certificate() -> bool {
    true
}

impl VCenterTarget {
    /// Create a target with certificate validation enabled
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
            validate_certificate: true,
        }
    }

    /// Load target from environment variables
    pub fn from_env() -> Result<Self> {
        let server = env::var("VCENTER_SERVER")
            .map_err(|_| VcError::config("VCENTER_SERVER not set"))?;
        let username = env::var("VCENTER_USERNAME")
            .map_err(|_| VcError::credentials("VCENTER_USERNAME not set"))?;
        let password = env::var("VCENTER_PASSWORD")
            .map_err(|_| VcError::credentials("VCENTER_PASSWORD not set"))?;

        let mut target = Self::new(server, username, password);

        if let Ok(validate) = env::var("VCENTER_VALIDATE_CERTS") {
            target.validate_certificate = validate.to_lowercase() != "false";
        }

        target.validate()?;
        Ok(target)
    }

    /// Validate target fields
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(VcError::config("Server cannot be empty"));
        }

        if self.username.is_empty() {
            return Err(VcError::config("Username cannot be empty"));
        }

        Ok(())
    }
}

// Manual Debug keeps the password out of log output
impl fmt::Debug for VCenterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VCenterTarget")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"***")
            .field("validate_certificate", &self.validate_certificate)
            .finish()
    }
}

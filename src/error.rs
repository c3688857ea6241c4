//! Error types for the vCenter inventory poller

use thiserror::Error;

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, VcError>;

/// Comprehensive error types for vCenter polling operations
#[derive(Error, Debug)]
pub enum VcError {
    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential errors
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Faults reported by the vCenter API
    #[error("vCenter fault: {0}")]
    Fault(String),

    /// Inventory collection errors
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Result cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Not found errors (managed objects, portgroups, etc.)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl VcError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credentials error
    pub fn credentials<S: Into<String>>(msg: S) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a fault error
    pub fn fault<S: Into<String>>(msg: S) -> Self {
        Self::Fault(msg.into())
    }

    /// Create an inventory error
    pub fn inventory<S: Into<String>>(msg: S) -> Self {
        Self::Inventory(msg.into())
    }

    /// Create a cache error
    pub fn cache<S: Into<String>>(msg: S) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VcError::Connection(_) | VcError::Timeout(_) | VcError::Http(_)
        )
    }

    /// Check if error indicates authentication issue
    pub fn is_auth_error(&self) -> bool {
        matches!(self, VcError::Authentication(_) | VcError::Credentials(_))
    }
}

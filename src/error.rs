//! Error types for vcmd
//!
//! Provides structured error types for configuration loading, provider
//! sessions, inventory traversal, and manifest generation.

use thiserror::Error;

/// Unified error type for the generator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to load credentials file {path}: {reason}")]
    CredentialsFile { path: String, reason: String },

    #[error("Manifest directory is not empty: {path}")]
    ManifestDirNotEmpty { path: String },

    #[error("More than one asset is named {file_name}")]
    DuplicateManifest { file_name: String },

    // =========================================================================
    // Session / Auth Errors
    // =========================================================================
    #[error("Session error for {target}: {reason}")]
    SessionAuth { target: String, reason: String },

    #[error("Credentials for {target} not found")]
    CredentialsNotFound { target: String },

    #[error("DNS resolution failed for {host}: {reason}")]
    DnsResolution { host: String, reason: String },

    // =========================================================================
    // Inventory Errors
    // =========================================================================
    #[error("Tag category not found: {category}")]
    TagCategoryNotFound { category: String },

    #[error("Object not found: {kind}/{id}")]
    ObjectNotFound { kind: String, id: String },

    #[error("Property retrieval failed for {object}: {reason}")]
    PropertyRetrieval { object: String, reason: String },

    #[error("Operation {operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Unable to get cluster summary for {cluster}")]
    ClusterSummaryUnavailable { cluster: String },

    // =========================================================================
    // Provider API Errors
    // =========================================================================
    #[error("SoftLayer API error ({status}): {reason}")]
    SoftLayerApi { status: u16, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Data Shape Errors
    // =========================================================================
    #[error("Unsupported port configuration on {port_group}: {reason}")]
    UnsupportedPortConfig { port_group: String, reason: String },

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Invalid IPv6 prefix {prefix}: {reason}")]
    InvalidIpv6Prefix { prefix: String, reason: String },

    // =========================================================================
    // Serialization / IO Errors
    // =========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action the aggregator takes when an error surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Drop the offending object (e.g. one port group) and keep going
    SkipObject,
    /// Drop the current endpoint's contribution, continue with the next one
    SkipEndpoint,
    /// Abort the whole run
    Abort,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            Error::UnsupportedPortConfig { .. } | Error::InvalidCidr(_) => ErrorAction::SkipObject,

            Error::TagCategoryNotFound { .. }
            | Error::ObjectNotFound { .. }
            | Error::PropertyRetrieval { .. }
            | Error::Timeout { .. }
            | Error::ClusterSummaryUnavailable { .. } => ErrorAction::SkipEndpoint,

            Error::Configuration(_)
            | Error::CredentialsFile { .. }
            | Error::ManifestDirNotEmpty { .. }
            | Error::DuplicateManifest { .. }
            | Error::SessionAuth { .. }
            | Error::CredentialsNotFound { .. }
            | Error::DnsResolution { .. }
            | Error::InvalidIpv6Prefix { .. } => ErrorAction::Abort,

            _ => ErrorAction::Abort,
        }
    }

    /// Check if processing can continue past this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.action(), ErrorAction::Abort)
    }
}

/// Result type alias for vcmd
pub type Result<T> = std::result::Result<T, Error>;

//! Generator Configuration
//!
//! Value surface consumed by the topology engine, plus loading of the two
//! credential documents (vCenter and IBM Cloud).

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default IPv6 base prefix (three hextets, the VLAN number becomes the fourth)
pub const DEFAULT_IPV6_PREFIX: &str = "fd65:a1a8:60ad";

/// Default port group naming substring for CI-managed networks
pub const DEFAULT_PORT_GROUP_FILTER: &str = "ci-vlan-";

/// Default region tag category
pub const DEFAULT_REGION_CATEGORY: &str = "region";

/// Default zone tag category
pub const DEFAULT_ZONE_CATEGORY: &str = "zone";

/// vCenter advanced setting holding the canonical hostname
pub const VPXD_HOSTNAME_URL_KEY: &str = "config.vpxd.hostnameUrl";

/// Per-call deadline for vSphere inventory calls
pub const DEFAULT_VSPHERE_CALL_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Reachability Mode
// =============================================================================

/// How datastore reachability is decided for a cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityMode {
    /// Reachable only when every host of the cluster reports the datastore
    #[default]
    Strict,
    /// Every datastore attached to the cluster is treated as reachable
    Attached,
}

impl std::fmt::Display for ReachabilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReachabilityMode::Strict => write!(f, "strict"),
            ReachabilityMode::Attached => write!(f, "attached"),
        }
    }
}

// =============================================================================
// Generator Configuration
// =============================================================================

/// Names of the two tag categories describing failure domains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCategoryNames {
    pub region: String,
    pub zone: String,
}

impl Default for TagCategoryNames {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION_CATEGORY.to_string(),
            zone: DEFAULT_ZONE_CATEGORY.to_string(),
        }
    }
}

/// Configuration for one generation pass
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// IPv6 base prefix used to derive companion subnets
    pub ipv6_prefix: String,
    /// Port group name substring selecting CI-managed networks
    pub port_group_filter: String,
    /// Region / zone tag categories
    pub tag_categories: TagCategoryNames,
    /// Datastore reachability strategy
    pub reachability: ReachabilityMode,
    /// Deadline applied to every vSphere call
    pub vsphere_call_timeout: Duration,
}

impl GeneratorConfig {
    /// Check the configuration before any provider call is made
    pub fn validate(&self) -> Result<()> {
        validate_ipv6_prefix(&self.ipv6_prefix)?;
        if self.vsphere_call_timeout.is_zero() {
            return Err(Error::Configuration(
                "vSphere call timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check that an IPv6 base prefix is exactly three hextets (`fd65:a1a8:60ad`).
///
/// The VLAN number is appended as the fourth hextet and the companion subnet
/// is a /64, so a longer base would leave the VLAN outside the prefix.
pub fn validate_ipv6_prefix(prefix: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidIpv6Prefix {
        prefix: prefix.to_string(),
        reason,
    };

    let hextets: Vec<&str> = prefix.split(':').collect();
    if hextets.len() != 3 {
        return Err(invalid(format!("expected 3 hextets, found {}", hextets.len())));
    }
    if let Some(bad) = hextets
        .iter()
        .find(|h| h.is_empty() || h.len() > 4 || !h.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return Err(invalid(format!("malformed hextet {:?}", bad)));
    }

    format!("{}::", prefix)
        .parse::<Ipv6Addr>()
        .map(|_| ())
        .map_err(|e| invalid(e.to_string()))
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ipv6_prefix: DEFAULT_IPV6_PREFIX.to_string(),
            port_group_filter: DEFAULT_PORT_GROUP_FILTER.to_string(),
            tag_categories: TagCategoryNames::default(),
            reachability: ReachabilityMode::default(),
            vsphere_call_timeout: DEFAULT_VSPHERE_CALL_TIMEOUT,
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// vCenter username and password
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VCenterCredential {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

impl std::fmt::Debug for VCenterCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VCenterCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// IBM Cloud (SoftLayer) username and API key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftLayerCredential {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "ApiToken", alias = "apiKey")]
    pub api_token: String,
}

impl std::fmt::Debug for SoftLayerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftLayerCredential")
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Load the vCenter credential document, keyed by server name
pub fn load_vcenter_credentials(path: impl AsRef<Path>) -> Result<BTreeMap<String, VCenterCredential>> {
    load_credentials(path.as_ref())
}

/// Load the IBM Cloud credential document, keyed by account identifier
pub fn load_softlayer_credentials(
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, SoftLayerCredential>> {
    load_credentials(path.as_ref())
}

fn load_credentials<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>> {
    let credentials_error = |reason: String| Error::CredentialsFile {
        path: path.display().to_string(),
        reason,
    };

    let contents = std::fs::read(path).map_err(|e| credentials_error(e.to_string()))?;
    serde_json::from_slice(&contents).map_err(|e| credentials_error(e.to_string()))
}

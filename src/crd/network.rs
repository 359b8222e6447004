//! Network CRD
//!
//! One VLAN present in both the vSphere port group set and the IBM Cloud
//! VLAN list of the vCenter's pod, with its IPv4 subnet and derived IPv6
//! companion subnet.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Network CRD
// =============================================================================

/// Network describes a CI port group backed by an IBM Cloud VLAN
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vsphere-capacity-manager.splat-team.io",
    version = "v1",
    kind = "Network",
    derive = "PartialEq",
    plural = "networks",
    namespaced,
    printcolumn = r#"{"name": "VLAN", "type": "string", "jsonPath": ".spec.vlanId"}"#,
    printcolumn = r#"{"name": "Pod", "type": "string", "jsonPath": ".spec.podName"}"#,
    printcolumn = r#"{"name": "CIDR", "type": "string", "jsonPath": ".spec.machineNetworkCidr"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Non-pathed port group name
    pub port_group_name: String,

    /// Inventory path of the port group
    pub port_group_full_path: String,

    /// VLAN number, decimal
    pub vlan_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,

    #[serde(default)]
    pub datacenter_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_type: Option<String>,

    /// `<network identifier>/<prefix length>`
    #[serde(default)]
    pub machine_network_cidr: String,

    /// At most 20 addresses of the subnet
    #[serde(default)]
    pub ip_addresses: Vec<String>,

    #[serde(rename = "cidrIPv6", default)]
    pub cidr_ipv6: u8,

    #[serde(rename = "gatewayipv6", default)]
    pub gateway_ipv6: String,

    #[serde(rename = "ipv6prefix", default)]
    pub ipv6_prefix: String,

    #[serde(rename = "startIPv6Address", default)]
    pub start_ipv6_address: String,
}

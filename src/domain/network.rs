//! SoftLayer Network Records
//!
//! Typed views of the IBM Cloud (SoftLayer) account VLAN and subnet
//! collections. Every field is optional because the provider only returns
//! what the object mask asks for.

use super::inventory::VlanNumber;
use crate::error::{Error, Result};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A SoftLayer location (datacenter)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
}

/// Router hardware fronting a VLAN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hardware {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub datacenter: Option<Location>,
}

/// One IP address record of a subnet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetIpAddress {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub is_network: Option<bool>,
    #[serde(default)]
    pub is_broadcast: Option<bool>,
    #[serde(default)]
    pub is_gateway: Option<bool>,
}

/// Minimal VLAN reference carried by subnet list entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanReference {
    #[serde(default)]
    pub vlan_number: Option<VlanNumber>,
}

/// SoftLayer_Network_Subnet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSubnet {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ip_address_count: Option<u32>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub cidr: Option<u8>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub network_identifier: Option<String>,
    #[serde(default)]
    pub subnet_type: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<SubnetIpAddress>,
    #[serde(default)]
    pub network_vlan: Option<VlanReference>,
}

impl NetworkSubnet {
    /// Build the subnet's network from its identifier and prefix length
    pub fn network(&self) -> Result<IpNetwork> {
        let (identifier, cidr) = match (&self.network_identifier, self.cidr) {
            (Some(identifier), Some(cidr)) => (identifier, cidr),
            _ => {
                return Err(Error::InvalidCidr(format!(
                    "subnet {:?} has no network identifier or prefix length",
                    self.id
                )))
            }
        };

        let address: IpAddr = identifier
            .parse()
            .map_err(|e| Error::InvalidCidr(format!("{}/{}: {}", identifier, cidr, e)))?;

        IpNetwork::new(address, cidr)
            .map_err(|e| Error::InvalidCidr(format!("{}/{}: {}", identifier, cidr, e)))
    }

    /// `<networkIdentifier>/<cidr>` as reported by the provider
    pub fn machine_network_cidr(&self) -> String {
        format!(
            "{}/{}",
            self.network_identifier.as_deref().unwrap_or_default(),
            self.cidr.unwrap_or_default()
        )
    }
}

/// SoftLayer_Network_Vlan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkVlan {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vlan_number: Option<VlanNumber>,
    #[serde(default)]
    pub fully_qualified_name: Option<String>,
    #[serde(default)]
    pub pod_name: Option<String>,
    #[serde(default)]
    pub datacenter: Option<Location>,
    #[serde(default)]
    pub primary_router: Option<Hardware>,
    #[serde(default)]
    pub subnets: Vec<NetworkSubnet>,
}

impl NetworkVlan {
    /// Datacenter name, falling back to the primary router's datacenter
    pub fn datacenter_name(&self) -> Option<&str> {
        self.datacenter
            .as_ref()
            .and_then(|dc| dc.name.as_deref())
            .or_else(|| {
                self.primary_router
                    .as_ref()
                    .and_then(|router| router.datacenter.as_ref())
                    .and_then(|dc| dc.name.as_deref())
            })
    }

    pub fn primary_router_hostname(&self) -> Option<&str> {
        self.primary_router
            .as_ref()
            .and_then(|router| router.hostname.as_deref())
    }

    /// Whether this VLAN belongs to the given datacenter and pod
    pub fn is_in(&self, datacenter: &str, pod: &str) -> bool {
        self.datacenter_name() == Some(datacenter) && self.pod_name.as_deref() == Some(pod)
    }
}

//! vSphere Inventory Records
//!
//! Typed views of the managed objects the topology engine walks:
//! datacenters, clusters, hosts, datastores, port groups and tags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// VLAN identifier shared by both providers' inventories
pub type VlanNumber = u32;

// =============================================================================
// Managed Object References
// =============================================================================

/// Managed object types the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManagedObjectKind {
    Datacenter,
    ClusterComputeResource,
    HostSystem,
    Datastore,
    DistributedVirtualPortgroup,
    Network,
    Folder,
    VirtualMachine,
}

impl std::fmt::Display for ManagedObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagedObjectKind::Datacenter => write!(f, "Datacenter"),
            ManagedObjectKind::ClusterComputeResource => write!(f, "ClusterComputeResource"),
            ManagedObjectKind::HostSystem => write!(f, "HostSystem"),
            ManagedObjectKind::Datastore => write!(f, "Datastore"),
            ManagedObjectKind::DistributedVirtualPortgroup => {
                write!(f, "DistributedVirtualPortgroup")
            }
            ManagedObjectKind::Network => write!(f, "Network"),
            ManagedObjectKind::Folder => write!(f, "Folder"),
            ManagedObjectKind::VirtualMachine => write!(f, "VirtualMachine"),
        }
    }
}

/// Reference to a managed object (type + moref value, e.g. `domain-c8`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    #[serde(rename = "type")]
    pub kind: ManagedObjectKind,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(kind: ManagedObjectKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn is(&self, kind: ManagedObjectKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// A managed object resolved to its name and inventory path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryObject {
    pub reference: ManagedObjectRef,
    pub name: String,
    /// Full inventory path, e.g. `/dc1/host/cluster1`
    pub inventory_path: String,
}

// =============================================================================
// Cluster Records
// =============================================================================

/// The subset of cluster properties needed for failure-domain resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterProperties {
    pub hosts: Vec<ManagedObjectRef>,
    pub datastores: Vec<ManagedObjectRef>,
    pub networks: Vec<ManagedObjectRef>,
}

/// Compute capacity reported by a cluster summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub num_cpu_cores: u32,
    pub total_memory: u64,
}

// =============================================================================
// Port Groups
// =============================================================================

/// Inclusive VLAN range carried by a trunk specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRange {
    pub start: i32,
    pub end: i32,
}

/// VLAN specification of a distributed port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VlanSpec {
    /// Single access VLAN
    VlanId { id: i32 },
    /// Trunked VLAN ranges
    Trunk { ranges: Vec<VlanRange> },
    /// Private VLAN
    Pvlan { id: i32 },
}

/// Default port configuration of a port group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PortConfig {
    /// VMware distributed switch port setting
    VmwareDvs {
        #[serde(default)]
        vlan: Option<VlanSpec>,
    },
    /// Any other port setting type
    Other { kind: String },
}

/// A distributed virtual port group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGroup {
    pub reference: ManagedObjectRef,
    pub name: String,
    pub inventory_path: String,
    pub port_config: PortConfig,
}

impl PortGroup {
    /// Access VLAN configured on this port group.
    ///
    /// Only a VMware DVS port setting with a single VLAN id yields a value;
    /// trunk, private VLAN and foreign port settings are reported as
    /// [`Error::UnsupportedPortConfig`].
    pub fn vlan_id(&self) -> Result<VlanNumber> {
        let unsupported = |reason: String| Error::UnsupportedPortConfig {
            port_group: self.name.clone(),
            reason,
        };

        match &self.port_config {
            PortConfig::VmwareDvs {
                vlan: Some(VlanSpec::VlanId { id }),
            } => VlanNumber::try_from(*id)
                .map_err(|_| unsupported(format!("negative VLAN id {}", id))),
            PortConfig::VmwareDvs {
                vlan: Some(VlanSpec::Trunk { .. }),
            } => Err(unsupported("trunk VLAN specification".into())),
            PortConfig::VmwareDvs {
                vlan: Some(VlanSpec::Pvlan { .. }),
            } => Err(unsupported("private VLAN specification".into())),
            PortConfig::VmwareDvs { vlan: None } => {
                Err(unsupported("no VLAN specification".into()))
            }
            PortConfig::Other { kind } => Err(unsupported(format!("port setting type {}", kind))),
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// A tag category (e.g. region, zone)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCategory {
    pub id: String,
    pub name: String,
}

/// A tag within a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

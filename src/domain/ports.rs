//! Domain Ports - Provider boundaries for the topology engine
//!
//! These traits define the boundaries between the correlation logic and the
//! two provider APIs. Adapters implement these traits to provide concrete
//! functionality; the engine only ever sees typed inventory records.

use super::inventory::{
    ClusterProperties, ClusterSummary, InventoryObject, ManagedObjectRef, PortGroup, Tag,
    TagCategory,
};
use super::network::{NetworkSubnet, NetworkVlan};
use crate::config::{SoftLayerCredential, VCenterCredential};
use crate::error::Result;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

// =============================================================================
// Virtualization Provider (vSphere)
// =============================================================================

/// An authenticated vSphere session
#[async_trait]
pub trait VirtualizationInventory: Send + Sync {
    /// Server this session is bound to
    fn server(&self) -> &str;

    /// Check whether the session is still usable
    async fn is_active(&self) -> Result<bool>;

    /// List every datacenter
    async fn datacenters(&self) -> Result<Vec<InventoryObject>>;

    /// List the clusters below a datacenter
    async fn clusters(&self, datacenter: &InventoryObject) -> Result<Vec<InventoryObject>>;

    /// Find a cluster by inventory path
    async fn cluster_by_path(&self, path: &str) -> Result<InventoryObject>;

    /// Resolve a reference to its name and inventory path
    async fn describe(&self, reference: &ManagedObjectRef) -> Result<InventoryObject>;

    /// Retrieve a cluster's host, datastore and network references
    async fn cluster_properties(&self, cluster: &ManagedObjectRef) -> Result<ClusterProperties>;

    /// Retrieve a cluster's compute summary
    async fn cluster_summary(&self, cluster: &ManagedObjectRef) -> Result<ClusterSummary>;

    /// Datastores visible from a host
    async fn host_datastores(&self, host: &ManagedObjectRef) -> Result<Vec<ManagedObjectRef>>;

    /// Distributed port groups below a datacenter's network folder
    async fn distributed_port_groups(&self, datacenter: &InventoryObject) -> Result<Vec<PortGroup>>;

    /// Look up a tag category by name
    async fn tag_category(&self, name: &str) -> Result<Option<TagCategory>>;

    /// List the tags of a category
    async fn tags_for_category(&self, category: &TagCategory) -> Result<Vec<Tag>>;

    /// List the objects a tag is attached to
    async fn attached_objects(&self, tag: &Tag) -> Result<Vec<ManagedObjectRef>>;

    /// Query an advanced setting
    async fn option_value(&self, key: &str) -> Result<Option<String>>;
}

/// Creates vSphere sessions
#[async_trait]
pub trait VirtualizationConnector: Send + Sync {
    async fn connect(
        &self,
        server: &str,
        credential: &VCenterCredential,
    ) -> Result<VirtualizationInventoryRef>;
}

// =============================================================================
// Network Provider (IBM Cloud / SoftLayer)
// =============================================================================

/// An authenticated SoftLayer account session
#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// Fetch the current user; used as a session validity probe
    async fn current_user(&self) -> Result<String>;

    /// Full account VLAN list under an object mask
    async fn network_vlans(&self, object_mask: &str) -> Result<Vec<NetworkVlan>>;

    /// Full account subnet list under an object mask
    async fn subnets(&self, object_mask: &str) -> Result<Vec<NetworkSubnet>>;
}

/// Creates SoftLayer account sessions
#[async_trait]
pub trait NetworkConnector: Send + Sync {
    async fn connect(
        &self,
        account: &str,
        credential: &SoftLayerCredential,
    ) -> Result<NetworkInventoryRef>;
}

// =============================================================================
// Name Resolution
// =============================================================================

/// Resolves endpoint hostnames to addresses
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type VirtualizationInventoryRef = Arc<dyn VirtualizationInventory>;
pub type VirtualizationConnectorRef = Arc<dyn VirtualizationConnector>;
pub type NetworkInventoryRef = Arc<dyn NetworkInventory>;
pub type NetworkConnectorRef = Arc<dyn NetworkConnector>;
pub type HostResolverRef = Arc<dyn HostResolver>;

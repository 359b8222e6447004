//! vSphere Inventory Snapshot Adapter
//!
//! Serves the vSphere inventory from a captured snapshot document (YAML or
//! JSON, one file per vCenter named `<server>.yaml` / `<server>.json`).
//! Inventory paths follow the vCenter folder layout:
//!
//! ```text
//! /<datacenter>
//! /<datacenter>/host/<cluster>
//! /<datacenter>/host/<cluster>/<host>
//! /<datacenter>/datastore/<datastore>
//! /<datacenter>/network/<network>
//! ```

use crate::config::VCenterCredential;
use crate::domain::inventory::{
    ClusterProperties, ClusterSummary, InventoryObject, ManagedObjectKind, ManagedObjectRef,
    PortConfig, PortGroup, Tag, TagCategory,
};
use crate::domain::ports::{VirtualizationConnector, VirtualizationInventory, VirtualizationInventoryRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Snapshot Document
// =============================================================================

/// Captured inventory of one vCenter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    /// Advanced settings (e.g. `config.vpxd.hostnameUrl`)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub datacenters: Vec<DatacenterSnapshot>,
    #[serde(default)]
    pub tag_categories: Vec<TagCategorySnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<ClusterSnapshot>,
    #[serde(default)]
    pub hosts: Vec<HostSnapshot>,
    #[serde(default)]
    pub datastores: Vec<NamedObjectSnapshot>,
    #[serde(default)]
    pub networks: Vec<NamedObjectSnapshot>,
    #[serde(default)]
    pub port_groups: Vec<PortGroupSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub num_cpu_cores: Option<u32>,
    #[serde(default)]
    pub total_memory: Option<u64>,
    /// Host ids
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Datastore ids attached to the cluster
    #[serde(default)]
    pub datastores: Vec<String>,
    /// Network / port group ids attached to the cluster
    #[serde(default)]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub id: String,
    pub name: String,
    /// Datastore ids visible from this host
    #[serde(default)]
    pub datastores: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedObjectSnapshot {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGroupSnapshot {
    pub id: String,
    pub name: String,
    pub port_config: PortConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagCategorySnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attached: Vec<ManagedObjectRef>,
}

// =============================================================================
// Snapshot Inventory
// =============================================================================

/// vSphere inventory served from an [`InventorySnapshot`]
pub struct SnapshotInventory {
    server: String,
    snapshot: InventorySnapshot,
    /// Every addressable object by reference
    objects: HashMap<ManagedObjectRef, InventoryObject>,
    /// Cluster path to cluster reference
    cluster_paths: HashMap<String, ManagedObjectRef>,
}

impl SnapshotInventory {
    /// Index a snapshot for one server
    pub fn new(server: impl Into<String>, snapshot: InventorySnapshot) -> Self {
        let mut objects = HashMap::new();
        let mut cluster_paths = HashMap::new();

        let mut index = |kind: ManagedObjectKind, id: &str, name: &str, path: String| {
            let reference = ManagedObjectRef::new(kind, id);
            objects.insert(
                reference.clone(),
                InventoryObject {
                    reference,
                    name: name.to_string(),
                    inventory_path: path,
                },
            );
        };

        for dc in &snapshot.datacenters {
            let dc_path = format!("/{}", dc.name);
            index(ManagedObjectKind::Datacenter, &dc.id, &dc.name, dc_path.clone());

            let mut host_paths: HashMap<&str, String> = dc
                .hosts
                .iter()
                .map(|h| (h.id.as_str(), format!("{}/host/{}", dc_path, h.name)))
                .collect();

            for cluster in &dc.clusters {
                let cluster_path = format!("{}/host/{}", dc_path, cluster.name);
                cluster_paths.insert(
                    cluster_path.clone(),
                    ManagedObjectRef::new(ManagedObjectKind::ClusterComputeResource, &cluster.id),
                );
                for host_id in &cluster.hosts {
                    if let Some(host) = dc.hosts.iter().find(|h| &h.id == host_id) {
                        host_paths.insert(host.id.as_str(), format!("{}/{}", cluster_path, host.name));
                    }
                }
                index(
                    ManagedObjectKind::ClusterComputeResource,
                    &cluster.id,
                    &cluster.name,
                    cluster_path,
                );
            }

            for host in &dc.hosts {
                let path = host_paths
                    .remove(host.id.as_str())
                    .unwrap_or_else(|| format!("{}/host/{}", dc_path, host.name));
                index(ManagedObjectKind::HostSystem, &host.id, &host.name, path);
            }

            for ds in &dc.datastores {
                let path = format!("{}/datastore/{}", dc_path, ds.name);
                index(ManagedObjectKind::Datastore, &ds.id, &ds.name, path);
            }

            for network in &dc.networks {
                let path = format!("{}/network/{}", dc_path, network.name);
                index(ManagedObjectKind::Network, &network.id, &network.name, path);
            }

            for pg in &dc.port_groups {
                let path = format!("{}/network/{}", dc_path, pg.name);
                index(ManagedObjectKind::DistributedVirtualPortgroup, &pg.id, &pg.name, path);
            }
        }

        Self {
            server: server.into(),
            snapshot,
            objects,
            cluster_paths,
        }
    }

    fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Error {
        Error::ObjectNotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    fn datacenter(&self, reference: &ManagedObjectRef) -> Result<&DatacenterSnapshot> {
        self.snapshot
            .datacenters
            .iter()
            .find(|dc| dc.id == reference.value)
            .ok_or_else(|| Self::not_found("Datacenter", &reference.value))
    }

    fn cluster(&self, reference: &ManagedObjectRef) -> Result<&ClusterSnapshot> {
        self.snapshot
            .datacenters
            .iter()
            .flat_map(|dc| dc.clusters.iter())
            .find(|c| c.id == reference.value)
            .ok_or_else(|| Self::not_found("ClusterComputeResource", &reference.value))
    }

    /// Resolve a network id to its reference (port group or standard network)
    fn network_ref(&self, id: &str) -> ManagedObjectRef {
        let pg = ManagedObjectRef::new(ManagedObjectKind::DistributedVirtualPortgroup, id);
        if self.objects.contains_key(&pg) {
            pg
        } else {
            ManagedObjectRef::new(ManagedObjectKind::Network, id)
        }
    }
}

#[async_trait]
impl VirtualizationInventory for SnapshotInventory {
    fn server(&self) -> &str {
        &self.server
    }

    async fn is_active(&self) -> Result<bool> {
        Ok(true)
    }

    async fn datacenters(&self) -> Result<Vec<InventoryObject>> {
        self.snapshot
            .datacenters
            .iter()
            .map(|dc| {
                let reference = ManagedObjectRef::new(ManagedObjectKind::Datacenter, &dc.id);
                self.objects
                    .get(&reference)
                    .cloned()
                    .ok_or_else(|| Self::not_found("Datacenter", &dc.id))
            })
            .collect()
    }

    async fn clusters(&self, datacenter: &InventoryObject) -> Result<Vec<InventoryObject>> {
        let dc = self.datacenter(&datacenter.reference)?;
        dc.clusters
            .iter()
            .map(|c| {
                let reference = ManagedObjectRef::new(ManagedObjectKind::ClusterComputeResource, &c.id);
                self.objects
                    .get(&reference)
                    .cloned()
                    .ok_or_else(|| Self::not_found("ClusterComputeResource", &c.id))
            })
            .collect()
    }

    async fn cluster_by_path(&self, path: &str) -> Result<InventoryObject> {
        self.cluster_paths
            .get(path)
            .and_then(|reference| self.objects.get(reference))
            .cloned()
            .ok_or_else(|| Self::not_found("ClusterComputeResource", path))
    }

    async fn describe(&self, reference: &ManagedObjectRef) -> Result<InventoryObject> {
        self.objects
            .get(reference)
            .cloned()
            .ok_or_else(|| Self::not_found(reference.kind.to_string(), &reference.value))
    }

    async fn cluster_properties(&self, cluster: &ManagedObjectRef) -> Result<ClusterProperties> {
        let snapshot = self.cluster(cluster)?;
        Ok(ClusterProperties {
            hosts: snapshot
                .hosts
                .iter()
                .map(|id| ManagedObjectRef::new(ManagedObjectKind::HostSystem, id))
                .collect(),
            datastores: snapshot
                .datastores
                .iter()
                .map(|id| ManagedObjectRef::new(ManagedObjectKind::Datastore, id))
                .collect(),
            networks: snapshot.networks.iter().map(|id| self.network_ref(id)).collect(),
        })
    }

    async fn cluster_summary(&self, cluster: &ManagedObjectRef) -> Result<ClusterSummary> {
        let snapshot = self.cluster(cluster)?;
        match (snapshot.num_cpu_cores, snapshot.total_memory) {
            (Some(num_cpu_cores), Some(total_memory)) => Ok(ClusterSummary {
                num_cpu_cores,
                total_memory,
            }),
            _ => Err(Error::ClusterSummaryUnavailable {
                cluster: snapshot.name.clone(),
            }),
        }
    }

    async fn host_datastores(&self, host: &ManagedObjectRef) -> Result<Vec<ManagedObjectRef>> {
        self.snapshot
            .datacenters
            .iter()
            .flat_map(|dc| dc.hosts.iter())
            .find(|h| h.id == host.value)
            .map(|h| {
                h.datastores
                    .iter()
                    .map(|id| ManagedObjectRef::new(ManagedObjectKind::Datastore, id))
                    .collect()
            })
            .ok_or_else(|| Error::PropertyRetrieval {
                object: host.to_string(),
                reason: "host not present in inventory".into(),
            })
    }

    async fn distributed_port_groups(&self, datacenter: &InventoryObject) -> Result<Vec<PortGroup>> {
        let dc = self.datacenter(&datacenter.reference)?;
        Ok(dc
            .port_groups
            .iter()
            .map(|pg| PortGroup {
                reference: ManagedObjectRef::new(ManagedObjectKind::DistributedVirtualPortgroup, &pg.id),
                name: pg.name.clone(),
                inventory_path: format!("{}/network/{}", datacenter.inventory_path, pg.name),
                port_config: pg.port_config.clone(),
            })
            .collect())
    }

    async fn tag_category(&self, name: &str) -> Result<Option<TagCategory>> {
        Ok(self
            .snapshot
            .tag_categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| TagCategory {
                id: c.id.clone(),
                name: c.name.clone(),
            }))
    }

    async fn tags_for_category(&self, category: &TagCategory) -> Result<Vec<Tag>> {
        let snapshot = self
            .snapshot
            .tag_categories
            .iter()
            .find(|c| c.id == category.id)
            .ok_or_else(|| Error::TagCategoryNotFound {
                category: category.name.clone(),
            })?;

        Ok(snapshot
            .tags
            .iter()
            .map(|t| Tag {
                id: t.id.clone(),
                name: t.name.clone(),
                category_id: snapshot.id.clone(),
            })
            .collect())
    }

    async fn attached_objects(&self, tag: &Tag) -> Result<Vec<ManagedObjectRef>> {
        self.snapshot
            .tag_categories
            .iter()
            .flat_map(|c| c.tags.iter())
            .find(|t| t.id == tag.id)
            .map(|t| t.attached.clone())
            .ok_or_else(|| Self::not_found("Tag", &tag.id))
    }

    async fn option_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.snapshot.options.get(key).cloned())
    }
}

// =============================================================================
// Snapshot Connector
// =============================================================================

enum SnapshotSource {
    Directory(PathBuf),
    Memory(BTreeMap<String, InventorySnapshot>),
}

/// Connector that opens snapshot-backed sessions
pub struct SnapshotConnector {
    source: SnapshotSource,
    connects: AtomicUsize,
}

impl SnapshotConnector {
    /// Read snapshots from `<dir>/<server>.yaml` (or `.yml` / `.json`)
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: SnapshotSource::Directory(dir.into()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Serve snapshots held in memory, keyed by server
    pub fn in_memory(snapshots: BTreeMap<String, InventorySnapshot>) -> Self {
        Self {
            source: SnapshotSource::Memory(snapshots),
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of sessions opened so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }

    fn load(&self, server: &str) -> Result<InventorySnapshot> {
        match &self.source {
            SnapshotSource::Memory(snapshots) => {
                snapshots
                    .get(server)
                    .cloned()
                    .ok_or_else(|| Error::SessionAuth {
                        target: server.to_string(),
                        reason: "no inventory snapshot for server".into(),
                    })
            }
            SnapshotSource::Directory(dir) => {
                for extension in ["yaml", "yml", "json"] {
                    let path = dir.join(format!("{}.{}", server, extension));
                    if !path.exists() {
                        continue;
                    }
                    debug!("Loading inventory snapshot {}", path.display());
                    let contents = std::fs::read(&path)?;
                    let snapshot: InventorySnapshot = if extension == "json" {
                        serde_json::from_slice(&contents)?
                    } else {
                        serde_yaml::from_slice(&contents)?
                    };
                    return Ok(snapshot);
                }
                Err(Error::SessionAuth {
                    target: server.to_string(),
                    reason: format!("no inventory snapshot in {}", dir.display()),
                })
            }
        }
    }
}

#[async_trait]
impl VirtualizationConnector for SnapshotConnector {
    async fn connect(
        &self,
        server: &str,
        credential: &VCenterCredential,
    ) -> Result<VirtualizationInventoryRef> {
        if credential.username.is_empty() {
            return Err(Error::SessionAuth {
                target: server.to_string(),
                reason: "empty username".into(),
            });
        }

        let snapshot = self.load(server)?;
        self.connects.fetch_add(1, Ordering::Relaxed);
        info!(
            "Opened inventory snapshot for {} ({} datacenters)",
            server,
            snapshot.datacenters.len()
        );
        Ok(Arc::new(SnapshotInventory::new(server, snapshot)))
    }
}

//! Shared test fixtures: an in-memory vCenter inventory and a counting
//! in-memory SoftLayer account.

use crate::config::{SoftLayerCredential, VCenterCredential};
use crate::domain::inventory::{
    ClusterProperties, ClusterSummary, InventoryObject, ManagedObjectKind, ManagedObjectRef,
    PortConfig, PortGroup, Tag, TagCategory, VlanRange, VlanSpec,
};
use crate::domain::network::{
    Hardware, Location, NetworkSubnet, NetworkVlan, SubnetIpAddress, VlanReference,
};
use crate::domain::ports::{
    HostResolver, NetworkConnector, NetworkInventory, NetworkInventoryRef, VirtualizationConnector,
    VirtualizationConnectorRef, VirtualizationInventory, VirtualizationInventoryRef,
};
use crate::error::{Error, Result};
use crate::platform::snapshot::{
    ClusterSnapshot, DatacenterSnapshot, HostSnapshot, InventorySnapshot, NamedObjectSnapshot,
    PortGroupSnapshot, TagCategorySnapshot, TagSnapshot,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const GIB: u64 = 1024 * 1024 * 1024;

// =============================================================================
// vSphere
// =============================================================================

fn named(id: &str, name: &str) -> NamedObjectSnapshot {
    NamedObjectSnapshot {
        id: id.into(),
        name: name.into(),
    }
}

fn access_port_group(id: &str, name: &str, vlan: i32) -> PortGroupSnapshot {
    PortGroupSnapshot {
        id: id.into(),
        name: name.into(),
        port_config: PortConfig::VmwareDvs {
            vlan: Some(VlanSpec::VlanId { id: vlan }),
        },
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Two datacenters, each with a cluster named `cluster1`.
///
/// - dc1/cluster1: hosts esx1 + esx2, `vsanDatastore` seen by both,
///   `local-esx1` seen by esx1 only; zone `us-east-1a`
/// - dc1/cluster2: no zone tag
/// - dc2/cluster1: one host; zone `us-east-1b`
/// - port groups ci-vlan-100, ci-vlan-200, a trunk ci-vlan-300 and other-pg (400)
pub fn sample_snapshot() -> InventorySnapshot {
    let dc1 = DatacenterSnapshot {
        id: "datacenter-1".into(),
        name: "dc1".into(),
        clusters: vec![
            ClusterSnapshot {
                id: "domain-c1".into(),
                name: "cluster1".into(),
                num_cpu_cores: Some(64),
                total_memory: Some(512 * GIB),
                hosts: ids(&["host-1", "host-2"]),
                datastores: ids(&["datastore-shared", "datastore-local"]),
                networks: ids(&["dvportgroup-100", "dvportgroup-200", "dvportgroup-400", "network-1"]),
            },
            ClusterSnapshot {
                id: "domain-c2".into(),
                name: "cluster2".into(),
                num_cpu_cores: Some(16),
                total_memory: Some(128 * GIB),
                hosts: ids(&["host-3"]),
                datastores: ids(&["datastore-shared"]),
                networks: ids(&["dvportgroup-100"]),
            },
        ],
        hosts: vec![
            HostSnapshot {
                id: "host-1".into(),
                name: "esx1.example.com".into(),
                datastores: ids(&["datastore-shared", "datastore-local"]),
            },
            HostSnapshot {
                id: "host-2".into(),
                name: "esx2.example.com".into(),
                datastores: ids(&["datastore-shared"]),
            },
            HostSnapshot {
                id: "host-3".into(),
                name: "esx3.example.com".into(),
                datastores: ids(&["datastore-shared"]),
            },
        ],
        datastores: vec![
            named("datastore-shared", "vsanDatastore"),
            named("datastore-local", "local-esx1"),
        ],
        networks: vec![named("network-1", "VM Network")],
        port_groups: vec![
            access_port_group("dvportgroup-100", "ci-vlan-100", 100),
            access_port_group("dvportgroup-200", "ci-vlan-200", 200),
            PortGroupSnapshot {
                id: "dvportgroup-300".into(),
                name: "ci-vlan-300".into(),
                port_config: PortConfig::VmwareDvs {
                    vlan: Some(VlanSpec::Trunk {
                        ranges: vec![VlanRange { start: 0, end: 4094 }],
                    }),
                },
            },
            access_port_group("dvportgroup-400", "other-pg", 400),
        ],
    };

    let dc2 = DatacenterSnapshot {
        id: "datacenter-2".into(),
        name: "dc2".into(),
        clusters: vec![ClusterSnapshot {
            id: "domain-c21".into(),
            name: "cluster1".into(),
            num_cpu_cores: Some(32),
            total_memory: Some(256 * GIB),
            hosts: ids(&["host-21"]),
            datastores: ids(&["datastore-21"]),
            networks: ids(&["dvportgroup-150"]),
        }],
        hosts: vec![HostSnapshot {
            id: "host-21".into(),
            name: "esx21.example.com".into(),
            datastores: ids(&["datastore-21"]),
        }],
        datastores: vec![named("datastore-21", "dc2-datastore")],
        networks: Vec::new(),
        port_groups: vec![access_port_group("dvportgroup-150", "ci-vlan-150", 150)],
    };

    InventorySnapshot {
        options: BTreeMap::from([(
            "config.vpxd.hostnameUrl".to_string(),
            "vc1.example.com".to_string(),
        )]),
        datacenters: vec![dc1, dc2],
        tag_categories: vec![
            TagCategorySnapshot {
                id: "urn:category:region".into(),
                name: "region".into(),
                tags: vec![TagSnapshot {
                    id: "urn:tag:us-east".into(),
                    name: "us-east".into(),
                    attached: vec![
                        ManagedObjectRef::new(ManagedObjectKind::Datacenter, "datacenter-1"),
                        ManagedObjectRef::new(ManagedObjectKind::Datacenter, "datacenter-2"),
                    ],
                }],
            },
            TagCategorySnapshot {
                id: "urn:category:zone".into(),
                name: "zone".into(),
                tags: vec![
                    TagSnapshot {
                        id: "urn:tag:us-east-1a".into(),
                        name: "us-east-1a".into(),
                        attached: vec![
                            ManagedObjectRef::new(ManagedObjectKind::ClusterComputeResource, "domain-c1"),
                            ManagedObjectRef::new(ManagedObjectKind::HostSystem, "host-3"),
                        ],
                    },
                    TagSnapshot {
                        id: "urn:tag:us-east-1b".into(),
                        name: "us-east-1b".into(),
                        attached: vec![ManagedObjectRef::new(
                            ManagedObjectKind::ClusterComputeResource,
                            "domain-c21",
                        )],
                    },
                ],
            },
        ],
    }
}

/// Connector whose sessions fail every advanced-setting query and otherwise
/// delegate to the wrapped connector's sessions
pub struct FailingOptionsConnector {
    inner: VirtualizationConnectorRef,
}

impl FailingOptionsConnector {
    pub fn new(inner: VirtualizationConnectorRef) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl VirtualizationConnector for FailingOptionsConnector {
    async fn connect(
        &self,
        server: &str,
        credential: &VCenterCredential,
    ) -> Result<VirtualizationInventoryRef> {
        let inner = self.inner.connect(server, credential).await?;
        Ok(Arc::new(FailingOptionsInventory { inner }))
    }
}

struct FailingOptionsInventory {
    inner: VirtualizationInventoryRef,
}

#[async_trait]
impl VirtualizationInventory for FailingOptionsInventory {
    fn server(&self) -> &str {
        self.inner.server()
    }

    async fn is_active(&self) -> Result<bool> {
        self.inner.is_active().await
    }

    async fn datacenters(&self) -> Result<Vec<InventoryObject>> {
        self.inner.datacenters().await
    }

    async fn clusters(&self, datacenter: &InventoryObject) -> Result<Vec<InventoryObject>> {
        self.inner.clusters(datacenter).await
    }

    async fn cluster_by_path(&self, path: &str) -> Result<InventoryObject> {
        self.inner.cluster_by_path(path).await
    }

    async fn describe(&self, reference: &ManagedObjectRef) -> Result<InventoryObject> {
        self.inner.describe(reference).await
    }

    async fn cluster_properties(&self, cluster: &ManagedObjectRef) -> Result<ClusterProperties> {
        self.inner.cluster_properties(cluster).await
    }

    async fn cluster_summary(&self, cluster: &ManagedObjectRef) -> Result<ClusterSummary> {
        self.inner.cluster_summary(cluster).await
    }

    async fn host_datastores(&self, host: &ManagedObjectRef) -> Result<Vec<ManagedObjectRef>> {
        self.inner.host_datastores(host).await
    }

    async fn distributed_port_groups(&self, datacenter: &InventoryObject) -> Result<Vec<PortGroup>> {
        self.inner.distributed_port_groups(datacenter).await
    }

    async fn tag_category(&self, name: &str) -> Result<Option<TagCategory>> {
        self.inner.tag_category(name).await
    }

    async fn tags_for_category(&self, category: &TagCategory) -> Result<Vec<Tag>> {
        self.inner.tags_for_category(category).await
    }

    async fn attached_objects(&self, tag: &Tag) -> Result<Vec<ManagedObjectRef>> {
        self.inner.attached_objects(tag).await
    }

    async fn option_value(&self, key: &str) -> Result<Option<String>> {
        Err(Error::PropertyRetrieval {
            object: key.to_string(),
            reason: "permission denied".into(),
        })
    }
}

// =============================================================================
// SoftLayer
// =============================================================================

fn addresses(prefix: &str, count: u32) -> Vec<SubnetIpAddress> {
    (0..count)
        .map(|i| SubnetIpAddress {
            ip_address: Some(format!("{}.{}", prefix, i)),
            is_network: Some(i == 0),
            is_broadcast: Some(false),
            is_gateway: Some(i == 1),
        })
        .collect()
}

/// A VLAN with a single IPv4 subnet `<prefix>.0/<cidr>` carrying `count` addresses
pub fn vlan(number: u32, datacenter: &str, pod: &str, prefix: &str, cidr: u8, count: u32) -> NetworkVlan {
    NetworkVlan {
        id: Some(i64::from(number) * 10),
        name: Some(format!("vlan{}", number)),
        vlan_number: Some(number),
        fully_qualified_name: Some(format!("{}.bcr01a.{}", pod, number)),
        pod_name: Some(pod.into()),
        datacenter: Some(Location {
            name: Some(datacenter.into()),
            ..Default::default()
        }),
        primary_router: Some(Hardware {
            hostname: Some(format!("bcr01a.{}", datacenter)),
            datacenter: None,
        }),
        subnets: vec![NetworkSubnet {
            id: Some(i64::from(number)),
            ip_address_count: Some(count),
            gateway: Some(format!("{}.1", prefix)),
            cidr: Some(cidr),
            netmask: Some("255.255.255.0".into()),
            network_identifier: Some(format!("{}.0", prefix)),
            subnet_type: Some("ADDITIONAL_PRIMARY".into()),
            ip_addresses: addresses(prefix, count),
            network_vlan: Some(VlanReference {
                vlan_number: Some(number),
            }),
        }],
    }
}

/// VLANs 100, 200 and 999 in dal10.pod01, plus VLAN 100 in wdc04.pod03.
/// The vCenter address 10.0.0.5 lives in VLAN 100's subnet.
pub fn sample_vlans() -> Vec<NetworkVlan> {
    vec![
        vlan(100, "dal10", "dal10.pod01", "10.0.0", 24, 35),
        vlan(200, "dal10", "dal10.pod01", "10.0.2", 24, 10),
        vlan(999, "dal10", "dal10.pod01", "10.0.9", 24, 4),
        vlan(100, "wdc04", "wdc04.pod03", "10.40.0", 24, 8),
    ]
}

/// In-memory SoftLayer account counting list calls
pub struct FakeNetworkInventory {
    vlans: Vec<NetworkVlan>,
    valid: AtomicBool,
    fail_vlans: AtomicBool,
    vlan_calls: AtomicUsize,
    subnet_calls: AtomicUsize,
}

impl FakeNetworkInventory {
    pub fn new(vlans: Vec<NetworkVlan>) -> Self {
        Self {
            vlans,
            valid: AtomicBool::new(true),
            fail_vlans: AtomicBool::new(false),
            vlan_calls: AtomicUsize::new(0),
            subnet_calls: AtomicUsize::new(0),
        }
    }

    pub fn vlan_calls(&self) -> usize {
        self.vlan_calls.load(Ordering::SeqCst)
    }

    pub fn subnet_calls(&self) -> usize {
        self.subnet_calls.load(Ordering::SeqCst)
    }

    /// Make the session probe fail (stale session)
    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    /// Make the VLAN list call fail
    pub fn set_fail_vlans(&self, fail: bool) {
        self.fail_vlans.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkInventory for FakeNetworkInventory {
    async fn current_user(&self) -> Result<String> {
        if self.valid.load(Ordering::SeqCst) {
            Ok("apikey".into())
        } else {
            Err(Error::SoftLayerApi {
                status: 401,
                reason: "session expired".into(),
            })
        }
    }

    async fn network_vlans(&self, _object_mask: &str) -> Result<Vec<NetworkVlan>> {
        self.vlan_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_vlans.load(Ordering::SeqCst) {
            return Err(Error::SoftLayerApi {
                status: 500,
                reason: "internal error".into(),
            });
        }
        Ok(self.vlans.clone())
    }

    async fn subnets(&self, _object_mask: &str) -> Result<Vec<NetworkSubnet>> {
        self.subnet_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .vlans
            .iter()
            .flat_map(|vlan| vlan.subnets.iter().cloned())
            .collect())
    }
}

/// Connector handing out one shared [`FakeNetworkInventory`]
pub struct FakeNetworkConnector {
    pub inventory: Arc<FakeNetworkInventory>,
    connects: AtomicUsize,
}

impl FakeNetworkConnector {
    pub fn new(vlans: Vec<NetworkVlan>) -> Self {
        Self {
            inventory: Arc::new(FakeNetworkInventory::new(vlans)),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkConnector for FakeNetworkConnector {
    async fn connect(
        &self,
        _account: &str,
        _credential: &SoftLayerCredential,
    ) -> Result<NetworkInventoryRef> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.inventory.clone())
    }
}

// =============================================================================
// DNS
// =============================================================================

/// Resolver answering from a fixed table
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn with(mut self, host: &str, addresses: &[&str]) -> Self {
        let parsed = addresses
            .iter()
            .map(|a| a.parse().expect("valid address literal"))
            .collect();
        self.entries.insert(host.to_string(), parsed);
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.entries
            .get(host)
            .cloned()
            .ok_or_else(|| Error::DnsResolution {
                host: host.to_string(),
                reason: "no such host".into(),
            })
    }
}

//! Tag-Based Failure-Domain Resolver
//!
//! Walks the region / zone tag taxonomy of a vCenter:
//!
//! ```text
//! region tag ──attached──▶ Datacenter ──children──▶ Cluster ◀──attached── zone tag
//! ```
//!
//! Every (datacenter, cluster) pair where the datacenter carries a region tag
//! and the cluster carries a zone tag yields one [`FailureDomainSpec`]. Results
//! are keyed by `<server>/<datacenter path>/<cluster path>` so same-named
//! clusters in different datacenters stay distinct, and are returned sorted by
//! that key.

use crate::config::GeneratorConfig;
use crate::crd::failure_domain::{sanitize_name, FailureDomainSpec, Topology};
use crate::domain::inventory::{InventoryObject, ManagedObjectKind, ManagedObjectRef, Tag};
use crate::domain::ports::VirtualizationInventory;
use crate::error::{Error, Result};
use crate::session::vsphere::with_deadline;
use crate::topology::reachability::reachable_datastores;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use tracing::{debug, info, warn};

/// Resolves the failure domains of one vCenter
pub struct FailureDomainResolver<'a> {
    inventory: &'a dyn VirtualizationInventory,
    config: &'a GeneratorConfig,
}

impl<'a> FailureDomainResolver<'a> {
    pub fn new(inventory: &'a dyn VirtualizationInventory, config: &'a GeneratorConfig) -> Self {
        Self { inventory, config }
    }

    async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_deadline(operation, self.config.vsphere_call_timeout, fut).await
    }

    /// Resolve every failure domain of the vCenter.
    ///
    /// A missing region or zone category, or any retrieval failure on a
    /// single cluster, fails the whole call.
    pub async fn resolve(&self) -> Result<Vec<FailureDomainSpec>> {
        let server = self.inventory.server();
        let names = &self.config.tag_categories;

        let region_tags = self.category_tags(&names.region).await?;
        let zone_tags = self.category_tags(&names.zone).await?;

        let zones = self.cluster_zones(&zone_tags).await?;
        debug!("{} clusters carry a zone tag on {}", zones.len(), server);

        let mut domains: BTreeMap<String, FailureDomainSpec> = BTreeMap::new();

        for region in &region_tags {
            let attached = self
                .call("attached objects", self.inventory.attached_objects(region))
                .await?;

            for dc_ref in attached.iter().filter(|r| r.is(ManagedObjectKind::Datacenter)) {
                let datacenter = self
                    .call("describe datacenter", self.inventory.describe(dc_ref))
                    .await?;
                let clusters = self
                    .call("list clusters", self.inventory.clusters(&datacenter))
                    .await?;

                for cluster in clusters {
                    let Some(zone) = zones.get(&cluster.reference.value) else {
                        continue;
                    };

                    let key = format!(
                        "{}/{}/{}",
                        server, datacenter.inventory_path, cluster.inventory_path
                    );
                    if domains.contains_key(&key) {
                        warn!(
                            "Cluster {} already has a failure domain, ignoring region tag {}",
                            cluster.inventory_path, region.name
                        );
                        continue;
                    }

                    let domain = self
                        .failure_domain(&datacenter, &cluster, &region.name, zone)
                        .await?;
                    debug!("Failure domain {} for {}", domain.name, key);
                    domains.insert(key, domain);
                }
            }
        }

        info!("Resolved {} failure domains on {}", domains.len(), server);
        Ok(domains.into_values().collect())
    }

    async fn category_tags(&self, category: &str) -> Result<Vec<Tag>> {
        let found = self
            .call("tag category", self.inventory.tag_category(category))
            .await?
            .ok_or_else(|| Error::TagCategoryNotFound {
                category: category.to_string(),
            })?;
        self.call("list tags", self.inventory.tags_for_category(&found))
            .await
    }

    /// Cluster moref value to zone name. Zone tags attached to anything other
    /// than a cluster are ignored; the first zone tag of a cluster wins.
    async fn cluster_zones(&self, zone_tags: &[Tag]) -> Result<HashMap<String, String>> {
        let mut zones = HashMap::new();
        for tag in zone_tags {
            let attached = self
                .call("attached objects", self.inventory.attached_objects(tag))
                .await?;
            for object in attached
                .into_iter()
                .filter(|r| r.is(ManagedObjectKind::ClusterComputeResource))
            {
                zones.entry(object.value).or_insert_with(|| tag.name.clone());
            }
        }
        Ok(zones)
    }

    async fn failure_domain(
        &self,
        datacenter: &InventoryObject,
        cluster: &InventoryObject,
        region: &str,
        zone: &str,
    ) -> Result<FailureDomainSpec> {
        let properties = self
            .call(
                "cluster properties",
                self.inventory.cluster_properties(&cluster.reference),
            )
            .await
            .map_err(|e| match e {
                Error::ObjectNotFound { .. } => Error::PropertyRetrieval {
                    object: cluster.inventory_path.clone(),
                    reason: e.to_string(),
                },
                other => other,
            })?;

        let datastores = reachable_datastores(
            self.inventory,
            &properties,
            self.config.reachability,
            self.config.vsphere_call_timeout,
        )
        .await?;

        let networks = self.ci_networks(&properties.networks).await?;

        Ok(FailureDomainSpec {
            name: sanitize_name(&format!(
                "{}-{}-{}",
                self.inventory.server(),
                datacenter.name,
                cluster.name
            )),
            region: region.to_string(),
            zone: zone.to_string(),
            server: self.inventory.server().to_string(),
            topology: Topology {
                datacenter: datacenter.inventory_path.clone(),
                compute_cluster: cluster.inventory_path.clone(),
                networks,
                datastore: datastores
                    .iter()
                    .map(|ds| ds.inventory_path.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            },
        })
    }

    /// Paths of the cluster networks whose name matches the port group filter
    async fn ci_networks(&self, networks: &[ManagedObjectRef]) -> Result<Vec<String>> {
        let mut paths = BTreeSet::new();
        for network in networks {
            let object = self.call("describe network", self.inventory.describe(network)).await?;
            if object.name.contains(&self.config.port_group_filter) {
                paths.insert(object.inventory_path);
            }
        }
        Ok(paths.into_iter().collect())
    }
}

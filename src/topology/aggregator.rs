//! Topology Aggregator
//!
//! Drives one generation pass over every configured vCenter (sorted by
//! server name):
//!
//! 1. open the vSphere session and record the datacenters
//! 2. build the CI port group VLAN map
//! 3. resolve the vCenter's addresses and locate it in the IBM Cloud accounts
//! 4. resolve failure domains and turn each into a [`Pool`]
//! 5. correlate the located pod's VLANs into [`Network`]s
//!
//! Session, DNS and configuration errors abort the run. A vCenter without
//! failure domains contributes no assets, and one that cannot be located
//! contributes pools but no networks. When two vCenters produce an asset with
//! the same file name (e.g. both sit in the same pod) the first one is kept.

use crate::config::{GeneratorConfig, VPXD_HOSTNAME_URL_KEY};
use crate::crd::{FailureDomainSpec, IbmPoolSpec, Network, Pool, PoolSpec};
use crate::domain::inventory::{PortGroup, VlanNumber};
use crate::domain::network::{NetworkSubnet, NetworkVlan};
use crate::domain::ports::{HostResolverRef, VirtualizationInventory};
use crate::error::Result;
use crate::manifest::Asset;
use crate::session::softlayer::SoftLayerSessions;
use crate::session::vsphere::{with_deadline, VSphereSessions};
use crate::topology::failure_domain::FailureDomainResolver;
use crate::topology::location::{find_vcenter_location, VCenterLocation};
use crate::topology::vlan::{correlate_networks, port_group_vlans, PortGroupVlan};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use tracing::{debug, info, warn};

// =============================================================================
// Output
// =============================================================================

/// Datacenters of one vCenter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VCenterSummary {
    pub server: String,
    pub datacenters: Vec<String>,
}

/// Compute capacity of one failure domain's cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDomainCapacity {
    pub name: String,
    pub num_cpu_cores: u32,
    pub total_memory: u64,
}

/// A port group joined with the IBM Cloud VLAN carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGroupSubnet {
    pub vlan_id: VlanNumber,
    pub name: String,
    pub pod_name: Option<String>,
    pub datacenter_name: Option<String>,
    pub subnets: Vec<NetworkSubnet>,
}

/// Everything discovered during a pass, beyond the manifest assets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSummary {
    pub vcenters: Vec<VCenterSummary>,
    pub failure_domains: Vec<FailureDomainSpec>,
    pub failure_domains_resource_capacity: Vec<FailureDomainCapacity>,
    pub port_group_subnets: Vec<PortGroupSubnet>,
}

/// Result of one generation pass
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Per vCenter: pools, then networks. File names are unique.
    pub assets: Vec<Asset>,
    pub summary: EnvironmentSummary,
    file_names: BTreeSet<String>,
}

impl GenerationOutput {
    /// Add an asset unless one with the same file name is already present.
    /// The first asset for a file name wins.
    fn push_asset(&mut self, asset: Asset) {
        if self.file_names.insert(asset.file_name.clone()) {
            self.assets.push(asset);
        } else {
            warn!("Skipping duplicate asset {}", asset.file_name);
        }
    }

    pub fn pool_count(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| a.file_name.starts_with("pool-"))
            .count()
    }

    pub fn network_count(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| a.file_name.starts_with("network-"))
            .count()
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Correlates every configured vCenter with the IBM Cloud accounts
pub struct TopologyAggregator {
    config: GeneratorConfig,
    vsphere: VSphereSessions,
    softlayer: SoftLayerSessions,
    resolver: HostResolverRef,
}

impl TopologyAggregator {
    pub fn new(
        config: GeneratorConfig,
        vsphere: VSphereSessions,
        softlayer: SoftLayerSessions,
        resolver: HostResolverRef,
    ) -> Self {
        Self {
            config,
            vsphere,
            softlayer,
            resolver,
        }
    }

    /// Run one pass over every vCenter
    pub async fn generate(&mut self) -> Result<GenerationOutput> {
        self.config.validate()?;
        let mut output = GenerationOutput::default();

        for server in self.vsphere.servers() {
            info!("Processing vCenter {}", server);
            self.process_endpoint(&server, &mut output).await?;
        }

        info!(
            "Generated {} pools and {} networks across {} vCenters",
            output.pool_count(),
            output.network_count(),
            output.summary.vcenters.len()
        );
        Ok(output)
    }

    async fn process_endpoint(&mut self, server: &str, output: &mut GenerationOutput) -> Result<()> {
        let timeout = self.config.vsphere_call_timeout;
        let session = self.vsphere.session(server).await?;
        let inventory: &dyn VirtualizationInventory = session.as_ref();

        let datacenters = with_deadline("list datacenters", timeout, inventory.datacenters()).await?;
        output.summary.vcenters.push(VCenterSummary {
            server: server.to_string(),
            datacenters: datacenters.iter().map(|dc| dc.inventory_path.clone()).collect(),
        });

        let mut port_groups: Vec<PortGroup> = Vec::new();
        for dc in &datacenters {
            port_groups.extend(
                with_deadline("list port groups", timeout, inventory.distributed_port_groups(dc))
                    .await?,
            );
        }
        let pg_vlans = port_group_vlans(&port_groups, &self.config.port_group_filter)?;
        debug!("{} CI port groups with VLANs on {}", pg_vlans.len(), server);

        self.check_hostname(inventory, server).await;

        let addresses = self.resolver.lookup(server).await?;
        let (location, pod_vlans) = self.locate(server, &addresses).await;

        let failure_domains = match FailureDomainResolver::new(inventory, &self.config).resolve().await {
            Ok(domains) if !domains.is_empty() => domains,
            Ok(_) => {
                warn!("No failure domains found for {}", server);
                return Ok(());
            }
            Err(e) if e.is_recoverable() => {
                warn!("No failure domains found for {}: {}", server, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let ibm_pool_spec = IbmPoolSpec {
            pod: location.pod_name.clone(),
            datacenter: location.datacenter_name.clone(),
        };

        for fd in &failure_domains {
            let cluster = with_deadline(
                "cluster by path",
                timeout,
                inventory.cluster_by_path(&fd.topology.compute_cluster),
            )
            .await?;
            let summary = with_deadline(
                "cluster summary",
                timeout,
                inventory.cluster_summary(&cluster.reference),
            )
            .await?;

            output
                .summary
                .failure_domains_resource_capacity
                .push(FailureDomainCapacity {
                    name: fd.name.clone(),
                    num_cpu_cores: summary.num_cpu_cores,
                    total_memory: summary.total_memory,
                });

            let pool = Pool::new(
                &fd.name,
                PoolSpec::from_capacity(fd.clone(), &summary, ibm_pool_spec.clone()),
            );
            output.push_asset(Asset::pool(pool));
        }
        output.summary.failure_domains.extend(failure_domains);

        let Some(pod_vlans) = pod_vlans else {
            let first_address = addresses
                .first()
                .map(IpAddr::to_string)
                .unwrap_or_default();
            match &location.pod_name {
                Some(pod) => warn!(
                    "Unable to retrieve IBM network subnets in datacenter pod {} for vCenter {} using IP address {}",
                    pod, server, first_address
                ),
                None => warn!(
                    "Unable to find physical location of vCenter {} using IP address {}",
                    server, first_address
                ),
            }
            return Ok(());
        };

        let networks = correlate_networks(&pod_vlans, &pg_vlans, &self.config.ipv6_prefix)?;
        if networks.is_empty() {
            warn!(
                "No VLANs correlated for vCenter {} in pod {:?}",
                server, location.pod_name
            );
        }

        output
            .summary
            .port_group_subnets
            .extend(port_group_subnets(&pod_vlans, &pg_vlans, &networks));
        for network in networks {
            output.push_asset(Asset::network(network));
        }
        Ok(())
    }

    /// Compare the vCenter's canonical hostname with the configured server
    async fn check_hostname(&self, inventory: &dyn VirtualizationInventory, server: &str) {
        let timeout = self.config.vsphere_call_timeout;
        match with_deadline(
            "hostname option",
            timeout,
            inventory.option_value(VPXD_HOSTNAME_URL_KEY),
        )
        .await
        {
            Ok(Some(url)) if url != server => {
                warn!("vCenter URL does not match: {} != {}", server, url)
            }
            Ok(Some(_)) => {}
            Ok(None) => debug!("{} not set on {}", VPXD_HOSTNAME_URL_KEY, server),
            Err(e) => warn!("Unable to read {} on {}: {}", VPXD_HOSTNAME_URL_KEY, server, e),
        }
    }

    /// Try each account in order; the first one that locates the vCenter
    /// supplies the pod's VLANs
    async fn locate(
        &mut self,
        server: &str,
        addresses: &[IpAddr],
    ) -> (VCenterLocation, Option<Vec<NetworkVlan>>) {
        let mut location = VCenterLocation::default();

        for account in self.softlayer.accounts() {
            location = match find_vcenter_location(&mut self.softlayer, &account, addresses).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Unable to search account {} for vCenter {}: {}", account, server, e);
                    continue;
                }
            };

            let (Some(datacenter), Some(pod)) =
                (location.datacenter_name.clone(), location.pod_name.clone())
            else {
                continue;
            };

            return match self.softlayer.vlans_in(&account, &datacenter, &pod).await {
                Ok(vlans) => (location, Some(vlans)),
                Err(e) => {
                    warn!(
                        "Unable to list VLANs of pod {} in account {}: {}",
                        pod, account, e
                    );
                    (location, None)
                }
            };
        }

        (location, None)
    }
}

fn port_group_subnets(
    pod_vlans: &[NetworkVlan],
    pg_vlans: &BTreeMap<VlanNumber, PortGroupVlan>,
    networks: &[Network],
) -> Vec<PortGroupSubnet> {
    networks
        .iter()
        .filter_map(|network| {
            let number: VlanNumber = network.spec.vlan_id.parse().ok()?;
            let pg = pg_vlans.get(&number)?;
            let vlan = pod_vlans.iter().find(|v| v.vlan_number == Some(number))?;
            Some(PortGroupSubnet {
                vlan_id: number,
                name: pg.name.clone(),
                pod_name: vlan.pod_name.clone(),
                datacenter_name: vlan.datacenter_name().map(str::to_string),
                subnets: vlan.subnets.clone(),
            })
        })
        .collect()
}

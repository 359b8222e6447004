//! VLAN / Network Correlator
//!
//! Joins the vCenter's CI port groups with the IBM Cloud VLANs of the pod the
//! vCenter lives in, using the VLAN number as the join key, and derives an
//! IPv6 companion subnet for every match.

use crate::config::validate_ipv6_prefix;
use crate::crd::network::{Network, NetworkSpec};
use crate::domain::inventory::{PortGroup, VlanNumber};
use crate::domain::network::NetworkVlan;
use crate::error::{Error, ErrorAction, Result};
use ipnetwork::Ipv6Network;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv6Addr;
use tracing::{debug, warn};

/// Maximum number of IPv4 addresses copied into a network record
pub const MAX_RECORDED_ADDRESSES: usize = 20;

/// Prefix length of the IPv6 companion subnet
pub const IPV6_COMPANION_PREFIX_LEN: u8 = 64;

// =============================================================================
// Port Group VLANs
// =============================================================================

/// A CI port group and the access VLAN it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGroupVlan {
    pub vlan: VlanNumber,
    pub name: String,
    pub inventory_path: String,
}

/// Build the VLAN-number-to-port-group map for port groups whose name
/// contains `filter`.
///
/// Port groups without a single access VLAN are skipped with a warning. When
/// two port groups carry the same VLAN the first one is kept.
pub fn port_group_vlans(
    port_groups: &[PortGroup],
    filter: &str,
) -> Result<BTreeMap<VlanNumber, PortGroupVlan>> {
    let mut vlans: BTreeMap<VlanNumber, PortGroupVlan> = BTreeMap::new();

    for pg in port_groups.iter().filter(|pg| pg.name.contains(filter)) {
        let vlan = match pg.vlan_id() {
            Ok(vlan) => vlan,
            Err(e) if e.action() == ErrorAction::SkipObject => {
                warn!("Skipping port group {}: {}", pg.inventory_path, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(existing) = vlans.get(&vlan) {
            warn!(
                "VLAN {} is carried by both {} and {}, keeping {}",
                vlan, existing.inventory_path, pg.inventory_path, existing.name
            );
            continue;
        }

        vlans.insert(
            vlan,
            PortGroupVlan {
                vlan,
                name: pg.name.clone(),
                inventory_path: pg.inventory_path.clone(),
            },
        );
    }

    Ok(vlans)
}

// =============================================================================
// IPv6 Companion Subnet
// =============================================================================

/// IPv6 /64 derived from a base prefix and a VLAN number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Companion {
    pub network: Ipv6Network,
    pub gateway: Ipv6Addr,
    pub start: Ipv6Addr,
}

impl Ipv6Companion {
    /// Derive `<base>:<vlan>::1/64`. The VLAN number is written in decimal
    /// and read back as a hextet. The gateway is the second address after
    /// the network address and the start address the fourth.
    pub fn derive(base_prefix: &str, vlan: VlanNumber) -> Result<Self> {
        validate_ipv6_prefix(base_prefix)?;
        let literal = format!("{}:{}::1", base_prefix, vlan);
        let address: Ipv6Addr = literal.parse().map_err(|e| Error::InvalidIpv6Prefix {
            prefix: base_prefix.to_string(),
            reason: format!("{}: {}", literal, e),
        })?;

        let network = Ipv6Network::new(address, IPV6_COMPANION_PREFIX_LEN)
            .and_then(|subnet| Ipv6Network::new(subnet.network(), IPV6_COMPANION_PREFIX_LEN))
            .map_err(|e| Error::InvalidIpv6Prefix {
                prefix: base_prefix.to_string(),
                reason: e.to_string(),
            })?;
        let network_address = u128::from(network.network());

        Ok(Self {
            network,
            gateway: Ipv6Addr::from(network_address + 2),
            start: Ipv6Addr::from(network_address + 4),
        })
    }

    /// Network in `addr/len` notation, e.g. `fd00:1234:5678:42::/64`
    pub fn prefix(&self) -> String {
        self.network.to_string()
    }

    pub fn prefix_len(&self) -> u8 {
        self.network.prefix()
    }
}

// =============================================================================
// Correlation
// =============================================================================

/// Join the pod's VLANs with the port group map, one network per match.
///
/// VLANs without a matching port group are skipped silently. Only the first
/// subnet of a VLAN is used. Output is sorted by VLAN number.
pub fn correlate_networks(
    vlans: &[NetworkVlan],
    port_groups: &BTreeMap<VlanNumber, PortGroupVlan>,
    ipv6_prefix: &str,
) -> Result<Vec<Network>> {
    let mut networks: BTreeMap<VlanNumber, Network> = BTreeMap::new();

    for nv in vlans {
        let Some(number) = nv.vlan_number else {
            continue;
        };
        let Some(pg) = port_groups.get(&number) else {
            continue;
        };
        if networks.contains_key(&number) {
            warn!("VLAN {} listed more than once for the pod, keeping the first", number);
            continue;
        }

        let Some(subnet) = nv.subnets.first() else {
            warn!("VLAN {} ({}) has no subnets, skipping", number, pg.name);
            continue;
        };
        if nv.subnets.len() > 1 {
            warn!(
                "VLAN {} has {} subnets, using only the first entry",
                number,
                nv.subnets.len()
            );
        }

        let companion = Ipv6Companion::derive(ipv6_prefix, number)?;

        let recorded = subnet
            .ip_address_count
            .map_or(MAX_RECORDED_ADDRESSES, |count| {
                (count as usize).min(MAX_RECORDED_ADDRESSES)
            });
        let ip_addresses: Vec<String> = subnet
            .ip_addresses
            .iter()
            .filter_map(|a| a.ip_address.clone())
            .take(recorded)
            .collect();

        let datacenter = nv.datacenter_name().map(str::to_string);
        let name = format!(
            "{}-{}-{}",
            pg.name,
            datacenter.as_deref().unwrap_or_default(),
            nv.pod_name.as_deref().unwrap_or_default()
        );

        let spec = NetworkSpec {
            port_group_name: pg.name.clone(),
            port_group_full_path: pg.inventory_path.clone(),
            vlan_id: number.to_string(),
            pod_name: nv.pod_name.clone(),
            datacenter_name: datacenter,
            cidr: subnet.cidr,
            gateway: subnet.gateway.clone(),
            ip_address_count: subnet.ip_address_count,
            netmask: subnet.netmask.clone(),
            subnet_type: subnet.subnet_type.clone(),
            machine_network_cidr: subnet.machine_network_cidr(),
            ip_addresses,
            cidr_ipv6: companion.prefix_len(),
            gateway_ipv6: companion.gateway.to_string(),
            ipv6_prefix: companion.prefix(),
            start_ipv6_address: companion.start.to_string(),
        };

        debug!("Correlated VLAN {} with port group {}", number, pg.name);
        networks.insert(number, Network::new(&name, spec));
    }

    Ok(networks.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::{ManagedObjectKind, ManagedObjectRef, PortConfig, VlanSpec};
    use crate::topology::fixtures::vlan;
    use assert_matches::assert_matches;

    fn pg(name: &str, config: PortConfig) -> PortGroup {
        PortGroup {
            reference: ManagedObjectRef::new(ManagedObjectKind::DistributedVirtualPortgroup, name),
            name: name.into(),
            inventory_path: format!("/dc1/network/{}", name),
            port_config: config,
        }
    }

    fn access(vlan: i32) -> PortConfig {
        PortConfig::VmwareDvs {
            vlan: Some(VlanSpec::VlanId { id: vlan }),
        }
    }

    fn map(entries: &[(VlanNumber, &str)]) -> BTreeMap<VlanNumber, PortGroupVlan> {
        entries
            .iter()
            .map(|(vlan, name)| {
                (
                    *vlan,
                    PortGroupVlan {
                        vlan: *vlan,
                        name: name.to_string(),
                        inventory_path: format!("/dc1/network/{}", name),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_ipv6_companion_derivation() {
        let companion = Ipv6Companion::derive("fd00:1234:5678", 42).unwrap();
        assert_eq!(companion.prefix(), "fd00:1234:5678:42::/64");
        assert_eq!(companion.prefix_len(), 64);
        assert_eq!(companion.gateway.to_string(), "fd00:1234:5678:42::2");
        assert_eq!(companion.start.to_string(), "fd00:1234:5678:42::4");

        assert_eq!(Ipv6Companion::derive("fd00:1234:5678", 42).unwrap(), companion);
    }

    #[test]
    fn test_ipv6_companion_bad_prefix() {
        assert_matches!(
            Ipv6Companion::derive("not-a-prefix", 42),
            Err(Error::InvalidIpv6Prefix { .. })
        );
    }

    #[test]
    fn test_four_hextet_base_is_rejected() {
        // the VLAN would land in the fifth hextet, outside the /64
        assert_matches!(
            Ipv6Companion::derive("fd65:a1a8:60ad:1", 100),
            Err(Error::InvalidIpv6Prefix { .. })
        );

        let first = Ipv6Companion::derive("fd65:a1a8:60ad", 100).unwrap();
        let second = Ipv6Companion::derive("fd65:a1a8:60ad", 200).unwrap();
        assert_ne!(first.network, second.network);
    }

    #[test]
    fn test_port_group_vlans_filters_and_skips() {
        let groups = vec![
            pg("ci-vlan-100", access(100)),
            pg("other-pg", access(400)),
            pg(
                "ci-vlan-300",
                PortConfig::Other {
                    kind: "DVPortSetting".into(),
                },
            ),
            pg("ci-vlan-100-dup", access(100)),
        ];

        let vlans = port_group_vlans(&groups, "ci-vlan-").unwrap();
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[&100].name, "ci-vlan-100");
    }

    #[test]
    fn test_join_emits_only_matching_vlans() {
        let vlans = vec![
            vlan(200, "dal10", "dal10.pod01", "10.0.2", 24, 4),
            vlan(100, "dal10", "dal10.pod01", "10.0.0", 24, 4),
        ];

        let networks = correlate_networks(&vlans, &map(&[(100, "ci-vlan-100")]), "fd65:a1a8:60ad").unwrap();
        assert_eq!(networks.len(), 1);

        let network = &networks[0];
        assert_eq!(network.metadata.name.as_deref(), Some("ci-vlan-100-dal10-dal10.pod01"));
        assert_eq!(network.spec.vlan_id, "100");
        assert_eq!(network.spec.port_group_full_path, "/dc1/network/ci-vlan-100");
        assert_eq!(network.spec.machine_network_cidr, "10.0.0.0/24");
        assert_eq!(network.spec.ipv6_prefix, "fd65:a1a8:60ad:100::/64");
    }

    #[test]
    fn test_address_list_capped() {
        let vlans = vec![vlan(100, "dal10", "dal10.pod01", "10.0.0", 24, 35)];
        let networks = correlate_networks(&vlans, &map(&[(100, "ci-vlan-100")]), "fd65:a1a8:60ad").unwrap();

        assert_eq!(networks[0].spec.ip_addresses.len(), 20);
        assert_eq!(networks[0].spec.ip_address_count, Some(35));
    }

    #[test]
    fn test_first_subnet_only_and_sorted_output() {
        let mut multi = vlan(300, "dal10", "dal10.pod01", "10.0.3", 24, 2);
        multi.subnets.push(vlan(301, "dal10", "dal10.pod01", "10.0.4", 24, 2).subnets.remove(0));
        let vlans = vec![multi, vlan(100, "dal10", "dal10.pod01", "10.0.0", 24, 2)];

        let networks = correlate_networks(
            &vlans,
            &map(&[(100, "ci-vlan-100"), (300, "ci-vlan-300")]),
            "fd65:a1a8:60ad",
        )
        .unwrap();

        let ids: Vec<_> = networks.iter().map(|n| n.spec.vlan_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "300"]);
        assert_eq!(networks[1].spec.machine_network_cidr, "10.0.3.0/24");
    }

    #[test]
    fn test_vlan_without_subnets_skipped() {
        let mut empty = vlan(100, "dal10", "dal10.pod01", "10.0.0", 24, 2);
        empty.subnets.clear();

        let networks = correlate_networks(&[empty], &map(&[(100, "ci-vlan-100")]), "fd65:a1a8:60ad").unwrap();
        assert!(networks.is_empty());
    }
}

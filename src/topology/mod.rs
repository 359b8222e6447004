//! Cross-Provider Topology Engine
//!
//! - [`reachability`]: datastores reachable from every host of a cluster
//! - [`failure_domain`]: region / zone tag walk producing failure domains
//! - [`location`]: locating a vCenter in the IBM Cloud network by address
//! - [`vlan`]: joining port groups and IBM Cloud VLANs into networks
//! - [`aggregator`]: one generation pass across every vCenter

pub mod aggregator;
pub mod failure_domain;
pub mod location;
pub mod reachability;
pub mod vlan;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregator::{EnvironmentSummary, GenerationOutput, TopologyAggregator};
pub use failure_domain::FailureDomainResolver;
pub use location::{find_vcenter_location, locate_in_vlans, VCenterLocation};
pub use reachability::{compute_reachable, reachable_datastores};
pub use vlan::{correlate_networks, port_group_vlans, Ipv6Companion, PortGroupVlan};

//! Physical-Location Correlator
//!
//! Locates a vCenter inside an IBM Cloud account by testing its addresses
//! against every subnet of every VLAN in the account. The first containing
//! subnet wins. The provider does not specify the order of its VLAN list, so
//! when several VLANs contain a candidate address the chosen one is not
//! deterministic across runs.

use crate::domain::inventory::VlanNumber;
use crate::domain::network::NetworkVlan;
use crate::error::{ErrorAction, Result};
use crate::session::softlayer::SoftLayerSessions;
use serde::Serialize;
use std::net::IpAddr;
use tracing::{debug, info};

/// Where a vCenter sits in the IBM Cloud network. All fields are unset when
/// no subnet contains any of the candidate addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VCenterLocation {
    pub pod_name: Option<String>,
    pub datacenter_name: Option<String>,
    pub primary_router: Option<String>,
    pub vlan_number: Option<VlanNumber>,
    pub ip_address: Option<IpAddr>,
}

impl VCenterLocation {
    /// A location without a datacenter name counts as not found
    pub fn is_found(&self) -> bool {
        self.datacenter_name.is_some()
    }
}

/// Scan `vlans` for the first subnet containing one of `candidates`.
/// Subnets without a usable network are skipped.
pub fn locate_in_vlans(vlans: &[NetworkVlan], candidates: &[IpAddr]) -> Result<VCenterLocation> {
    for vlan in vlans {
        for subnet in &vlan.subnets {
            let network = match subnet.network() {
                Ok(network) => network,
                Err(e) if e.action() == ErrorAction::SkipObject => {
                    debug!("Skipping subnet on VLAN {:?}: {}", vlan.vlan_number, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(ip) = candidates.iter().find(|ip| network.contains(**ip)) {
                return Ok(VCenterLocation {
                    pod_name: vlan.pod_name.clone(),
                    datacenter_name: vlan.datacenter_name().map(str::to_string),
                    primary_router: vlan.primary_router_hostname().map(str::to_string),
                    vlan_number: vlan.vlan_number,
                    ip_address: Some(*ip),
                });
            }
        }
    }
    Ok(VCenterLocation::default())
}

/// Locate a vCenter in one account, using the account's cached VLAN list
pub async fn find_vcenter_location(
    sessions: &mut SoftLayerSessions,
    account: &str,
    candidates: &[IpAddr],
) -> Result<VCenterLocation> {
    let vlans = sessions.network_vlans(account).await?;
    let location = locate_in_vlans(vlans, candidates)?;

    if location.is_found() {
        info!(
            "Located {:?} in account {}: datacenter {:?}, pod {:?}, VLAN {:?}",
            location.ip_address,
            account,
            location.datacenter_name,
            location.pod_name,
            location.vlan_number
        );
    } else {
        debug!("No subnet in account {} contains {:?}", account, candidates);
    }
    Ok(location)
}

//! Datastore Reachability
//!
//! Computes which cluster-attached datastores can be reached from every host
//! of the cluster. In strict mode a datastore qualifies only when the number
//! of distinct cluster hosts that see it equals the cluster's host count; a
//! cluster without hosts therefore has no reachable datastores. Attached mode
//! treats every datastore attached to the cluster as reachable.

use crate::config::ReachabilityMode;
use crate::domain::inventory::{ClusterProperties, InventoryObject, ManagedObjectRef};
use crate::domain::ports::VirtualizationInventory;
use crate::error::Result;
use crate::session::vsphere::with_deadline;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::debug;

/// Pure reachability over already retrieved host visibility.
///
/// `visibility` pairs each cluster host with the datastores it reports.
/// Returns the reachable subset of `attached`, in attachment order.
pub fn compute_reachable(
    attached: &[ManagedObjectRef],
    hosts: &[ManagedObjectRef],
    visibility: &[(ManagedObjectRef, Vec<ManagedObjectRef>)],
    mode: ReachabilityMode,
) -> Vec<ManagedObjectRef> {
    if mode == ReachabilityMode::Attached {
        return attached.to_vec();
    }

    let members: BTreeSet<&ManagedObjectRef> = hosts.iter().collect();
    if members.is_empty() {
        return Vec::new();
    }

    let mut seen_by: HashMap<&ManagedObjectRef, BTreeSet<&ManagedObjectRef>> = attached
        .iter()
        .map(|ds| (ds, BTreeSet::new()))
        .collect();

    for (host, datastores) in visibility {
        if !members.contains(host) {
            continue;
        }
        for ds in datastores {
            if let Some(seen) = seen_by.get_mut(ds) {
                seen.insert(host);
            }
        }
    }

    attached
        .iter()
        .filter(|ds| seen_by.get(ds).is_some_and(|seen| seen.len() == members.len()))
        .cloned()
        .collect()
}

/// Resolve a cluster's reachable datastores to inventory objects.
///
/// Any retrieval error aborts the computation; no partial result is returned.
pub async fn reachable_datastores(
    inventory: &dyn VirtualizationInventory,
    properties: &ClusterProperties,
    mode: ReachabilityMode,
    timeout: Duration,
) -> Result<Vec<InventoryObject>> {
    let mut visibility = Vec::with_capacity(properties.hosts.len());
    if mode == ReachabilityMode::Strict {
        for host in &properties.hosts {
            let datastores =
                with_deadline("host datastores", timeout, inventory.host_datastores(host)).await?;
            visibility.push((host.clone(), datastores));
        }
    }

    let reachable = compute_reachable(&properties.datastores, &properties.hosts, &visibility, mode);
    debug!(
        "{} of {} attached datastores reachable ({} mode)",
        reachable.len(),
        properties.datastores.len(),
        mode
    );

    let mut objects = Vec::with_capacity(reachable.len());
    for ds in &reachable {
        objects.push(with_deadline("describe datastore", timeout, inventory.describe(ds)).await?);
    }
    Ok(objects)
}

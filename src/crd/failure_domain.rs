//! vSphere Failure Domain
//!
//! A named (datacenter, cluster) pair tagged with a region and a zone,
//! shaped like the OpenShift `VSpherePlatformFailureDomainSpec`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One failure domain of a vCenter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailureDomainSpec {
    /// Synthetic name derived from server, datacenter and cluster
    pub name: String,

    /// Region tag name attached to the datacenter
    pub region: String,

    /// Zone tag name attached to the cluster
    pub zone: String,

    /// vCenter server owning this failure domain
    pub server: String,

    pub topology: Topology,
}

/// Inventory paths making up a failure domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    /// Datacenter inventory path
    pub datacenter: String,

    /// Cluster inventory path
    pub compute_cluster: String,

    /// Port group paths matching the CI naming filter, sorted
    #[serde(default)]
    pub networks: Vec<String>,

    /// Comma-joined paths of datastores reachable from every host
    #[serde(default)]
    pub datastore: String,
}

/// Build a DNS-1123 friendly name: lower-cased, anything outside
/// `[a-z0-9-]` replaced by `-`
pub fn sanitize_name(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(
            sanitize_name("vcs8e-vc.ocp2.dev.cluster.com-IBMCloud-vcs-ci-workload"),
            "vcs8e-vc-ocp2-dev-cluster-com-ibmcloud-vcs-ci-workload"
        );
        assert_eq!(sanitize_name("dc 1_cluster"), "dc-1-cluster");
    }

    #[test]
    fn test_topology_field_names() {
        let fd = FailureDomainSpec {
            name: "fd".into(),
            topology: Topology {
                compute_cluster: "/dc1/host/cluster1".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&fd).unwrap();
        assert_eq!(json["topology"]["computeCluster"], "/dc1/host/cluster1");
    }
}

//! Pool CRD
//!
//! One failure domain enriched with cluster compute capacity and the IBM Cloud
//! pod / datacenter the vCenter is physically located in.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::failure_domain::FailureDomainSpec;
use crate::domain::inventory::ClusterSummary;

/// Bytes per GiB, used to express pool memory
const GIB: u64 = 1024 * 1024 * 1024;

// =============================================================================
// Pool CRD
// =============================================================================

/// Pool defines the resources available for a given vCenter, datacenter and
/// cluster.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "vsphere-capacity-manager.splat-team.io",
    version = "v1",
    kind = "Pool",
    derive = "PartialEq",
    plural = "pools",
    namespaced,
    printcolumn = r#"{"name": "vCPUs", "type": "integer", "jsonPath": ".spec.vcpus"}"#,
    printcolumn = r#"{"name": "Memory(GB)", "type": "integer", "jsonPath": ".spec.memory"}"#,
    printcolumn = r#"{"name": "Server", "type": "string", "jsonPath": ".spec.server"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    #[serde(flatten)]
    pub failure_domain: FailureDomainSpec,

    /// Number of virtual CPUs (cluster core count)
    pub vcpus: u32,

    /// Memory in GiB
    pub memory: u64,

    /// Storage in GiB
    pub storage: u64,

    /// When true the pool is excluded from default scheduling
    pub exclude: bool,

    #[serde(rename = "ibmPoolSpec", default)]
    pub ibm_pool_spec: IbmPoolSpec,
}

/// IBM Cloud placement of the pool's vCenter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IbmPoolSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

impl PoolSpec {
    /// Build a pool spec from a failure domain and its cluster summary
    pub fn from_capacity(
        failure_domain: FailureDomainSpec,
        summary: &ClusterSummary,
        ibm_pool_spec: IbmPoolSpec,
    ) -> Self {
        Self {
            failure_domain,
            vcpus: summary.num_cpu_cores,
            memory: summary.total_memory / GIB,
            storage: 0,
            exclude: false,
            ibm_pool_spec,
        }
    }
}

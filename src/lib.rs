//! vcmd - vSphere Capacity Manager Data Generator
//!
//! Correlates the topology of vSphere environments with the IBM Cloud
//! (SoftLayer) network they run in and produces `Pool` and `Network`
//! manifests for the vSphere capacity manager.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          Topology Aggregator                                 │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │ Failure Domain  │  │    Location     │  │      VLAN / Network         │  │
//! │  │    Resolver     │  │   Correlator    │  │       Correlator            │  │
//! │  └────────┬────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! │           │                    │                         │                   │
//! │  ┌────────┴────────┐           │                         │                   │
//! │  │  Reachability   │           │                         │                   │
//! │  └─────────────────┘           │                         │                   │
//! ├────────────────────────────────┼─────────────────────────┼───────────────────┤
//! │                        Session Managers                                      │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────────┐   │
//! │  │      vSphere sessions       │  │   SoftLayer sessions + caches       │   │
//! │  └─────────────────────────────┘  └─────────────────────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                        Platform Adapters                                     │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────────┐   │
//! │  │  vSphere inventory snapshot │  │       SoftLayer REST API            │   │
//! │  └─────────────────────────────┘  └─────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`topology`]: correlation engine
//! - [`session`]: per-run provider session managers
//! - [`platform`]: provider adapters
//! - [`crd`]: Pool and Network resources
//! - [`manifest`]: asset file writing
//! - [`domain`]: inventory records and provider traits
//! - [`config`]: generator configuration and credentials
//! - [`error`]: error types and handling

pub mod config;
pub mod crd;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod session;
pub mod topology;

// Re-export commonly used types
pub use config::{
    load_softlayer_credentials, load_vcenter_credentials, GeneratorConfig, ReachabilityMode,
    SoftLayerCredential, TagCategoryNames, VCenterCredential,
};

pub use crd::{FailureDomainSpec, IbmPoolSpec, Network, NetworkSpec, Pool, PoolSpec, Topology};

pub use domain::ports::{
    HostResolver, NetworkConnector, NetworkInventory, VirtualizationConnector,
    VirtualizationInventory,
};

pub use error::{Error, ErrorAction, Result};

pub use manifest::{write_assets, Asset, AssetDocument};

pub use platform::{SnapshotConnector, SoftLayerConfig, SoftLayerConnector, SystemResolver};

pub use session::{SoftLayerSessions, VSphereSessions};

pub use topology::{EnvironmentSummary, GenerationOutput, TopologyAggregator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

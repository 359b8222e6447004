//! Provider Adapters
//!
//! Concrete implementations of the domain ports:
//! - SoftLayer REST API client (IBM Cloud network inventory)
//! - vSphere inventory served from captured snapshots
//! - System DNS resolver

pub mod dns;
pub mod snapshot;
pub mod softlayer;

pub use dns::SystemResolver;
pub use snapshot::{InventorySnapshot, SnapshotConnector, SnapshotInventory};
pub use softlayer::{SoftLayerConfig, SoftLayerConnector, SoftLayerRestClient};

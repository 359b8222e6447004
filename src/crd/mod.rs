//! Custom Resource Definitions for the vSphere capacity manager
//!
//! This module contains the generated resource types:
//! - Pool: failure domain plus compute capacity
//! - Network: CI port group correlated with an IBM Cloud VLAN
//! - FailureDomainSpec: region/zone tagged (datacenter, cluster) pair

pub mod failure_domain;
pub mod network;
pub mod pool;

pub use failure_domain::*;
pub use network::*;
pub use pool::*;

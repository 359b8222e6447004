//! Domain layer - Inventory records and port definitions
//!
//! This module defines the typed records returned by both providers and the
//! traits (ports) that provider adapters implement, following hexagonal
//! architecture principles.

pub mod inventory;
pub mod network;
pub mod ports;

pub use inventory::*;
pub use network::*;
pub use ports::*;

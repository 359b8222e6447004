//! Provider Session Cache
//!
//! Explicit per-run session managers for both providers. Each manager owns
//! a mapping from server / account key to a lazily created session and is
//! passed by reference to every component that needs provider access.
//! Access is single-threaded: managers take `&mut self` and do no locking.

pub mod softlayer;
pub mod vsphere;

pub use softlayer::*;
pub use vsphere::*;

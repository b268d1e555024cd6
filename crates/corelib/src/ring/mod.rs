//! Consistent hash ring implementation.
//!
//! The ring manages virtual node placements and provides lookup operations
//! for finding the nodes responsible for keys. Layers, leaves first:
//!
//! - [`RingIndex`]: one immutable, sorted generation of placements
//! - [`RingEngine`]: node table; regenerates the index on commit
//! - [`StagingManager`]: queued add/update/replace operations
//! - [`HashRing`]: the thread-safe caller-facing wrapper

pub mod engine;
pub mod hash_ring;
pub mod index;
pub mod lookup;
pub mod staging;

pub use engine::RingEngine;
pub use hash_ring::{HashRing, RingBuilder};
pub use index::{RingIndex, Successors};
pub use lookup::{Lookup, LookupMode};
pub use staging::{Pending, PendingOperation, StagingManager};

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;

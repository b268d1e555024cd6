//! Core library for a client-side consistent hashing ring.
//!
//! This crate provides:
//! - Tokens and partitioners (the hash space)
//! - Weighted virtual node placement
//! - Node records with health status; only alive nodes are routable
//! - Staged membership changes committed in one batch
//! - Lookup of one, N, or all distinct nodes for a key

pub mod config;
pub mod error;
mod input;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod vnode;

pub use config::RingConfig;
pub use error::{Error, Result, ValidationError};
pub use node::{NodeRecord, NodeSpec, NodeStatus, NodeUpdate};
pub use partitioner::{HashAlgorithm, Partitioner};
pub use ring::{
    HashRing, Lookup, LookupMode, Pending, PendingOperation, Ring, RingBuilder, RingEngine,
    RingIndex, StagingManager,
};
pub use token::Token;
pub use vnode::VirtualNode;

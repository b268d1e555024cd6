//! Caller-facing hash ring.
//!
//! [`HashRing`] pairs a [`RingEngine`] with a [`StagingManager`] behind one
//! lock. Staging and commit take the write lock; lookups hold the read lock
//! only long enough to hash the token and clone the current index `Arc`, then
//! walk that generation without blocking commits.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::node::{NodeRecord, NodeSpec};
use crate::partitioner::{HashAlgorithm, Partitioner};
use crate::ring::engine::RingEngine;
use crate::ring::index::RingIndex;
use crate::ring::lookup::{Lookup, LookupMode};
use crate::ring::staging::{Pending, StagingManager};
use crate::token::Token;

#[derive(Debug)]
struct Inner {
    engine: RingEngine,
    staging: StagingManager,
}

/// A consistent hash ring with staged, batch-committed membership changes.
///
/// # Example
///
/// ```rust
/// use corelib::{HashRing, NodeSpec, NodeStatus};
///
/// let ring = HashRing::with_nodes(vec![
///     NodeSpec::new("second").weight(100),
///     NodeSpec::new("theverylast").weight(100),
///     NodeSpec::new("dead").status(NodeStatus::Dead),
/// ])
/// .unwrap();
///
/// let mut all = ring.get_all("");
/// all.sort();
/// assert_eq!(all, vec!["second", "theverylast"]);
/// ```
#[derive(Debug)]
pub struct HashRing {
    inner: RwLock<Inner>,
}

impl Default for HashRing {
    fn default() -> Self {
        Self::from_engine(RingEngine::default())
    }
}

impl HashRing {
    /// An empty ring with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `nodes` as adds and commit them before returning.
    pub fn with_nodes(nodes: impl IntoIterator<Item = NodeSpec>) -> Result<Self> {
        RingBuilder::new().add_nodes(nodes).build()
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    fn from_engine(engine: RingEngine) -> Self {
        let staging = StagingManager::new(engine.config().default_weight);
        Self {
            inner: RwLock::new(Inner { engine, staging }),
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Position of `token` and the generation it should be resolved against.
    fn locate(&self, token: &str) -> (Token, Arc<RingIndex>) {
        let inner = self.inner.read();
        let position = inner.engine.position(token.as_bytes());
        (position, Arc::clone(inner.engine.index()))
    }

    /// General lookup entry point.
    ///
    /// A missing token (`None`) fails with [`Error::InvalidArgument`]; the
    /// empty string is an ordinary token.
    pub fn route(&self, token: Option<&str>, mode: LookupMode) -> Result<Lookup> {
        let token = token.ok_or_else(|| Error::InvalidArgument("token can't be nil".into()))?;
        let (position, index) = self.locate(token);
        Ok(index.get(position, mode))
    }

    /// The node owning `token`, or `None` if no node is alive.
    pub fn get(&self, token: &str) -> Option<String> {
        let (position, index) = self.locate(token);
        index.owner(position).map(str::to_string)
    }

    /// Up to `n` distinct alive nodes for `token`, primary first.
    pub fn get_n(&self, token: &str, n: usize) -> Vec<String> {
        let (position, index) = self.locate(token);
        index.get(position, LookupMode::Count(n)).into_vec()
    }

    /// Every distinct alive node, in ring order from `token`.
    pub fn get_all(&self, token: &str) -> Vec<String> {
        let (position, index) = self.locate(token);
        index.get(position, LookupMode::All).into_vec()
    }

    /// The committed index generation. Stays valid across later commits.
    pub fn snapshot(&self) -> Arc<RingIndex> {
        Arc::clone(self.inner.read().engine.index())
    }

    /// Position of `token` on this ring.
    pub fn position(&self, token: &str) -> Token {
        self.inner.read().engine.position(token.as_bytes())
    }

    // ------------------------------------------------------------------
    // Staging
    // ------------------------------------------------------------------

    pub fn add(&self, node: NodeSpec) -> Result<()> {
        self.inner.write().staging.stage_add(node)
    }

    pub fn add_many(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        self.inner.write().staging.stage_add_many(nodes)
    }

    pub fn update(&self, node: NodeSpec) -> Result<()> {
        self.inner.write().staging.stage_update(node)
    }

    pub fn update_many(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        self.inner.write().staging.stage_update_many(nodes)
    }

    pub fn replace(&self, node: NodeSpec) -> Result<()> {
        self.inner.write().staging.stage_replace(node)
    }

    pub fn replace_many(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        self.inner.write().staging.stage_replace_many(nodes)
    }

    /// Commit every staged operation. A no-op when nothing is staged.
    pub fn refresh(&self) -> Pending {
        let mut inner = self.inner.write();
        let Inner { engine, staging } = &mut *inner;
        staging.commit(engine)
    }

    /// Stage adds and commit under the same lock.
    pub fn add_now(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<Pending> {
        let mut inner = self.inner.write();
        let Inner { engine, staging } = &mut *inner;
        staging.stage_add_many(nodes)?;
        Ok(staging.commit(engine))
    }

    /// Stage updates and commit under the same lock.
    pub fn update_now(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<Pending> {
        let mut inner = self.inner.write();
        let Inner { engine, staging } = &mut *inner;
        staging.stage_update_many(nodes)?;
        Ok(staging.commit(engine))
    }

    /// Stage replacements and commit under the same lock.
    pub fn replace_now(&self, nodes: impl IntoIterator<Item = NodeSpec>) -> Result<Pending> {
        let mut inner = self.inner.write();
        let Inner { engine, staging } = &mut *inner;
        staging.stage_replace_many(nodes)?;
        Ok(staging.commit(engine))
    }

    pub fn pending(&self) -> Pending {
        self.inner.read().staging.pending()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Committed nodes of any status.
    pub fn node_count(&self) -> usize {
        self.inner.read().engine.node_count()
    }

    pub fn alive_count(&self) -> usize {
        self.inner.read().engine.alive_count()
    }

    /// Virtual nodes in the current generation.
    pub fn token_count(&self) -> usize {
        self.inner.read().engine.index().len()
    }

    pub fn node(&self, name: &str) -> Option<NodeRecord> {
        self.inner.read().engine.node(name)
    }

    pub fn nodes(&self) -> Vec<NodeRecord> {
        self.inner.read().engine.nodes()
    }

    /// All placements in ring order (for debugging).
    pub fn tokens(&self) -> Vec<(Token, String)> {
        self.snapshot()
            .tokens()
            .into_iter()
            .map(|(token, node)| (token, node.to_string()))
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().engine.generation()
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.inner.read().engine.partitioner_name()
    }
}

/// Builder for [`HashRing`].
///
/// ```rust
/// use corelib::{HashAlgorithm, NodeSpec, RingBuilder};
///
/// let ring = RingBuilder::new()
///     .with_hash(HashAlgorithm::Sip13)
///     .with_points_per_granule(8)
///     .add_node(NodeSpec::new("node1"))
///     .add_node(NodeSpec::new("node2").weight(200))
///     .build()
///     .unwrap();
/// assert_eq!(ring.token_count(), 8 + 16);
/// ```
#[derive(Default)]
pub struct RingBuilder {
    config: RingConfig,
    partitioner: Option<Arc<dyn Partitioner>>,
    nodes: Vec<NodeSpec>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.config.hash = hash;
        self
    }

    /// Virtual nodes per `weight_granularity` units of weight.
    pub fn with_points_per_granule(mut self, points: u32) -> Self {
        self.config.points_per_granule = points;
        self
    }

    pub fn with_default_weight(mut self, weight: u32) -> Self {
        self.config.default_weight = weight;
        self
    }

    /// Use a custom partitioner instead of `config.hash`.
    pub fn with_partitioner(mut self, partitioner: impl Partitioner) -> Self {
        self.partitioner = Some(Arc::new(partitioner));
        self
    }

    pub fn add_node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_nodes(mut self, nodes: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Build the ring, committing the initial nodes if there are any.
    pub fn build(self) -> Result<HashRing> {
        let engine = match self.partitioner {
            Some(partitioner) => RingEngine::with_partitioner(self.config, partitioner)?,
            None => RingEngine::new(self.config)?,
        };
        let ring = HashRing::from_engine(engine);
        if !self.nodes.is_empty() {
            ring.add_now(self.nodes)?;
        }
        Ok(ring)
    }
}

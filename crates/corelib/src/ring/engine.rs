//! The ring engine: node table plus the current index generation.
//!
//! The engine owns every committed node record. Structural changes only touch
//! the table; [`RingEngine::regenerate`] then rebuilds the [`RingIndex`] from
//! scratch, placing virtual nodes for alive nodes only. Dead, down and unknown
//! nodes stay in the table so later updates can revive them.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RingConfig;
use crate::error::Result;
use crate::node::{NodeRecord, NodeStatus, NodeUpdate};
use crate::partitioner::Partitioner;
use crate::ring::index::RingIndex;
use crate::ring::lookup::{Lookup, LookupMode};
use crate::token::Token;
use crate::vnode::VirtualNode;

const REGENERATIONS_TOTAL: &str = "corelib_ring_regenerations_total";
const VNODES: &str = "corelib_ring_vnodes";
const ALIVE_NODES: &str = "corelib_ring_alive_nodes";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeEntry {
    weight: u32,
    status: NodeStatus,
}

/// Node table and the index generated from it.
pub struct RingEngine {
    config: RingConfig,
    partitioner: Arc<dyn Partitioner>,
    nodes: BTreeMap<String, NodeEntry>,
    index: Arc<RingIndex>,
    generation: u64,
}

impl RingEngine {
    /// Create an empty engine using the partitioner named by `config.hash`.
    pub fn new(config: RingConfig) -> Result<Self> {
        let partitioner = config.hash.partitioner();
        Self::with_partitioner(config, partitioner)
    }

    pub fn with_partitioner(config: RingConfig, partitioner: Arc<dyn Partitioner>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            partitioner,
            nodes: BTreeMap::new(),
            index: Arc::new(RingIndex::new()),
            generation: 0,
        })
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Position of a lookup token on the ring.
    pub fn position(&self, token: &[u8]) -> Token {
        self.partitioner.partition(token)
    }

    /// Look up `token` in the current generation.
    pub fn get(&self, token: &[u8], mode: LookupMode) -> Lookup {
        self.index.get(self.position(token), mode)
    }

    /// The current index generation.
    pub fn index(&self) -> &Arc<RingIndex> {
        &self.index
    }

    /// Number of regenerations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert or overwrite a node. Takes effect on the next regeneration.
    pub fn apply_add(&mut self, record: NodeRecord) {
        self.insert(record);
    }

    /// Apply only the fields present in `update`.
    ///
    /// A name not in the table is recorded with the default weight and, unless
    /// the update carries one, status [`NodeStatus::Unknown`].
    pub fn apply_update(&mut self, update: NodeUpdate) {
        let default_weight = self.config.default_weight;
        let entry = self
            .nodes
            .entry(update.name)
            .or_insert_with_key(|name| {
                debug!(node = %name, "update for unknown node; recording it");
                NodeEntry {
                    weight: default_weight,
                    status: NodeStatus::Unknown,
                }
            });
        if let Some(weight) = update.weight {
            entry.weight = weight;
        }
        if let Some(status) = update.status {
            entry.status = status;
        }
    }

    /// Insert or overwrite a node on the replace path. Same table semantics
    /// as [`RingEngine::apply_add`].
    pub fn apply_replace(&mut self, record: NodeRecord) {
        self.insert(record);
    }

    fn insert(&mut self, record: NodeRecord) {
        self.nodes.insert(
            record.name,
            NodeEntry {
                weight: record.weight,
                status: record.status,
            },
        );
    }

    /// Add a node and regenerate immediately.
    pub fn add_node(&mut self, record: NodeRecord) {
        self.apply_add(record);
        self.regenerate();
    }

    /// Update a node and regenerate immediately.
    pub fn update_node(&mut self, update: NodeUpdate) {
        self.apply_update(update);
        self.regenerate();
    }

    /// Drop a node from the table. Returns false if it was not there.
    pub fn remove_node(&mut self, name: &str) -> bool {
        let removed = self.nodes.remove(name).is_some();
        if removed {
            self.regenerate();
        }
        removed
    }

    /// Rebuild the index from the node table.
    ///
    /// Every alive node gets `config.points_for(weight)` placements at
    /// `hash("{name}:{i}")`. The result depends only on the table contents.
    pub fn regenerate(&mut self) {
        let mut placements = Vec::new();
        let mut alive = 0usize;

        for (name, entry) in &self.nodes {
            if !entry.status.is_alive() {
                continue;
            }
            alive += 1;
            if self.config.is_clamped(entry.weight) {
                warn!(node = %name, weight = entry.weight, max = self.config.max_points_per_node,
                    "virtual node count clamped");
            }
            let node: Arc<str> = Arc::from(name.as_str());
            let points = self.config.points_for(entry.weight);
            placements.reserve(points as usize);
            for i in 0..points {
                placements.push(VirtualNode::from_index(&*self.partitioner, &node, i));
            }
        }

        let mut index = RingIndex::new();
        let dropped = index.rebuild(placements);
        if dropped > 0 {
            warn!(dropped, "virtual node positions collided");
        }
        self.index = Arc::new(index);
        self.generation += 1;

        debug!(
            generation = self.generation,
            nodes = self.nodes.len(),
            alive,
            vnodes = self.index.len(),
            "regenerated ring index"
        );
        metrics::counter!(REGENERATIONS_TOTAL).increment(1);
        metrics::gauge!(VNODES).set(self.index.len() as f64);
        metrics::gauge!(ALIVE_NODES).set(alive as f64);
    }

    /// The committed record for `name`, whatever its status.
    pub fn node(&self, name: &str) -> Option<NodeRecord> {
        self.nodes.get(name).map(|entry| NodeRecord {
            name: name.to_string(),
            weight: entry.weight,
            status: entry.status,
        })
    }

    /// Every committed record, ordered by name.
    pub fn nodes(&self) -> Vec<NodeRecord> {
        self.nodes
            .iter()
            .map(|(name, entry)| NodeRecord {
                name: name.clone(),
                weight: entry.weight,
                status: entry.status,
            })
            .collect()
    }

    /// Size of the node table, including non-alive nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes eligible for lookups.
    pub fn alive_count(&self) -> usize {
        self.nodes.values().filter(|e| e.status.is_alive()).count()
    }
}

impl Default for RingEngine {
    fn default() -> Self {
        let config = RingConfig::default();
        Self {
            partitioner: config.hash.partitioner(),
            config,
            nodes: BTreeMap::new(),
            index: Arc::new(RingIndex::new()),
            generation: 0,
        }
    }
}

impl std::fmt::Debug for RingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingEngine")
            .field("partitioner", &self.partitioner.name())
            .field("nodes", &self.nodes.len())
            .field("vnodes", &self.index.len())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::HashAlgorithm;

    fn record(name: &str, weight: u32, status: NodeStatus) -> NodeRecord {
        NodeRecord {
            name: name.into(),
            weight,
            status,
        }
    }

    fn engine() -> RingEngine {
        RingEngine::new(RingConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_engine() {
        let engine = engine();
        assert_eq!(engine.get(b"", LookupMode::Single), Lookup::One(None));
        assert_eq!(engine.get(b"", LookupMode::All), Lookup::Many(vec![]));
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_only_alive_nodes_are_placed() {
        let mut engine = engine();
        engine.apply_add(record("a", 100, NodeStatus::Alive));
        engine.apply_add(record("b", 100, NodeStatus::Dead));
        engine.apply_add(record("c", 100, NodeStatus::Down));
        engine.apply_add(record("d", 100, NodeStatus::Unknown));
        engine.regenerate();

        assert_eq!(engine.node_count(), 4);
        assert_eq!(engine.alive_count(), 1);
        assert_eq!(engine.index().node_count(), 1);
        assert_eq!(engine.index().len(), 160);
        assert_eq!(engine.get(b"k", LookupMode::All).into_vec(), vec!["a"]);
    }

    #[test]
    fn test_table_changes_invisible_until_regenerate() {
        let mut engine = engine();
        engine.apply_add(record("a", 100, NodeStatus::Alive));
        assert!(engine.get(b"k", LookupMode::All).is_empty());
        engine.regenerate();
        assert_eq!(engine.get(b"k", LookupMode::All).len(), 1);
    }

    #[test]
    fn test_vnodes_proportional_to_weight() {
        let mut engine = engine();
        engine.apply_add(record("light", 100, NodeStatus::Alive));
        engine.apply_add(record("heavy", 300, NodeStatus::Alive));
        engine.regenerate();

        let heavy = engine
            .index()
            .tokens()
            .iter()
            .filter(|(_, n)| *n == "heavy")
            .count();
        assert_eq!(heavy, 480);
        assert_eq!(engine.index().len(), 640);
    }

    #[test]
    fn test_update_partial_fields() {
        let mut engine = engine();
        engine.add_node(record("a", 250, NodeStatus::Alive));
        engine.update_node(NodeUpdate {
            name: "a".into(),
            weight: None,
            status: Some(NodeStatus::Dead),
        });
        assert_eq!(engine.node("a"), Some(record("a", 250, NodeStatus::Dead)));
        assert!(engine.index().is_empty());

        engine.update_node(NodeUpdate {
            name: "a".into(),
            weight: None,
            status: Some(NodeStatus::Alive),
        });
        assert_eq!(engine.node("a").unwrap().weight, 250);
        assert_eq!(engine.index().len(), 400);
    }

    #[test]
    fn test_update_unknown_node_records_it() {
        let mut engine = engine();
        engine.update_node(NodeUpdate {
            name: "ghost".into(),
            weight: Some(50),
            status: None,
        });
        assert_eq!(engine.node("ghost"), Some(record("ghost", 50, NodeStatus::Unknown)));
        assert!(engine.get(b"k", LookupMode::Single).is_empty());

        engine.update_node(NodeUpdate {
            name: "ghost".into(),
            weight: None,
            status: Some(NodeStatus::Alive),
        });
        assert_eq!(
            engine.get(b"k", LookupMode::Single),
            Lookup::One(Some("ghost".into()))
        );
    }

    #[test]
    fn test_replace_overwrites() {
        let mut engine = engine();
        engine.apply_add(record("a", 100, NodeStatus::Dead));
        engine.apply_replace(record("a", 200, NodeStatus::Alive));
        engine.regenerate();
        assert_eq!(engine.node("a"), Some(record("a", 200, NodeStatus::Alive)));
    }

    #[test]
    fn test_remove_node() {
        let mut engine = engine();
        engine.add_node(record("a", 100, NodeStatus::Alive));
        engine.add_node(record("b", 100, NodeStatus::Alive));
        assert!(engine.remove_node("a"));
        assert!(!engine.remove_node("a"));
        assert_eq!(engine.get(b"x", LookupMode::All).into_vec(), vec!["b"]);
    }

    #[test]
    fn test_regeneration_is_reproducible() {
        let build = || {
            let mut engine = RingEngine::new(RingConfig {
                hash: HashAlgorithm::Sip13,
                ..RingConfig::default()
            })
            .unwrap();
            for name in ["n1", "n2", "n3"] {
                engine.apply_add(record(name, 100, NodeStatus::Alive));
            }
            engine.regenerate();
            engine
        };
        let (a, b) = (build(), build());
        assert_eq!(a.index().tokens(), b.index().tokens());
        assert_eq!(a.partitioner_name(), "SipPartitioner");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RingConfig {
            points_per_granule: 0,
            ..RingConfig::default()
        };
        assert!(RingEngine::new(config).is_err());
    }
}

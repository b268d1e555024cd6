//! Staged mutations.
//!
//! Adds, updates and replacements are validated when staged and buffered in
//! three ordered queues. Nothing reaches the engine until
//! [`StagingManager::commit`], which applies adds, then updates, then
//! replacements, and regenerates the index exactly once.

use tracing::{debug, trace};

use crate::error::Result;
use crate::node::{NodeRecord, NodeSpec, NodeStatus, NodeUpdate};
use crate::ring::engine::RingEngine;

const COMMITS_TOTAL: &str = "corelib_ring_commits_total";

/// A buffered mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingOperation {
    Add(NodeRecord),
    Update(NodeUpdate),
    Replace(NodeRecord),
}

/// Queue lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pending {
    pub adds: usize,
    pub updates: usize,
    pub replaces: usize,
}

impl Pending {
    pub fn total(&self) -> usize {
        self.adds + self.updates + self.replaces
    }
}

/// Three ordered queues of validated operations.
#[derive(Clone, Debug)]
pub struct StagingManager {
    default_weight: u32,
    adds: Vec<NodeRecord>,
    updates: Vec<NodeUpdate>,
    replaces: Vec<NodeRecord>,
}

impl StagingManager {
    /// `default_weight` fills in records staged without a weight.
    pub fn new(default_weight: u32) -> Self {
        Self {
            default_weight,
            adds: Vec::new(),
            updates: Vec::new(),
            replaces: Vec::new(),
        }
    }

    /// Validate and queue one add. Status defaults to alive.
    pub fn stage_add(&mut self, spec: NodeSpec) -> Result<()> {
        let record = spec.to_record(self.default_weight, NodeStatus::Alive)?;
        trace!(node = %record.name, "staged add");
        self.adds.push(record);
        Ok(())
    }

    /// Validate every spec, then queue them all. Nothing is queued on error.
    pub fn stage_add_many(&mut self, specs: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        let records = specs
            .into_iter()
            .map(|spec| spec.to_record(self.default_weight, NodeStatus::Alive))
            .collect::<Result<Vec<_>>>()?;
        trace!(count = records.len(), "staged adds");
        self.adds.extend(records);
        Ok(())
    }

    /// Validate and queue one partial update.
    pub fn stage_update(&mut self, spec: NodeSpec) -> Result<()> {
        let update = spec.to_update()?;
        trace!(node = %update.name, "staged update");
        self.updates.push(update);
        Ok(())
    }

    pub fn stage_update_many(&mut self, specs: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        let updates = specs
            .into_iter()
            .map(|spec| spec.to_update())
            .collect::<Result<Vec<_>>>()?;
        trace!(count = updates.len(), "staged updates");
        self.updates.extend(updates);
        Ok(())
    }

    /// Validate and queue one replacement. Status defaults to alive.
    pub fn stage_replace(&mut self, spec: NodeSpec) -> Result<()> {
        let record = spec.to_record(self.default_weight, NodeStatus::Alive)?;
        trace!(node = %record.name, "staged replace");
        self.replaces.push(record);
        Ok(())
    }

    pub fn stage_replace_many(&mut self, specs: impl IntoIterator<Item = NodeSpec>) -> Result<()> {
        let records = specs
            .into_iter()
            .map(|spec| spec.to_record(self.default_weight, NodeStatus::Alive))
            .collect::<Result<Vec<_>>>()?;
        trace!(count = records.len(), "staged replaces");
        self.replaces.extend(records);
        Ok(())
    }

    pub fn pending(&self) -> Pending {
        Pending {
            adds: self.adds.len(),
            updates: self.updates.len(),
            replaces: self.replaces.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending().total() == 0
    }

    /// Empty all queues, returning their contents in commit order.
    pub fn drain(&mut self) -> Vec<PendingOperation> {
        let mut ops = Vec::with_capacity(self.pending().total());
        ops.extend(self.adds.drain(..).map(PendingOperation::Add));
        ops.extend(self.updates.drain(..).map(PendingOperation::Update));
        ops.extend(self.replaces.drain(..).map(PendingOperation::Replace));
        ops
    }

    /// Apply everything queued to `engine` and regenerate once.
    ///
    /// Returns what was applied; with nothing queued the engine is left
    /// untouched and the result is all zeros.
    pub fn commit(&mut self, engine: &mut RingEngine) -> Pending {
        let pending = self.pending();
        if pending.total() == 0 {
            return pending;
        }

        for op in self.drain() {
            match op {
                PendingOperation::Add(record) => engine.apply_add(record),
                PendingOperation::Update(update) => engine.apply_update(update),
                PendingOperation::Replace(record) => engine.apply_replace(record),
            }
        }
        engine.regenerate();

        debug!(
            adds = pending.adds,
            updates = pending.updates,
            replaces = pending.replaces,
            generation = engine.generation(),
            "committed staged operations"
        );
        metrics::counter!(COMMITS_TOTAL).increment(1);
        pending
    }
}

impl Default for StagingManager {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use crate::error::{Error, ValidationError};
    use crate::ring::lookup::LookupMode;

    fn engine() -> RingEngine {
        RingEngine::new(RingConfig::default()).unwrap()
    }

    #[test]
    fn test_commit_order_add_update_replace() {
        let mut staging = StagingManager::default();
        staging.stage_replace(NodeSpec::new("a").weight(300)).unwrap();
        staging.stage_update(NodeSpec::new("a").status(NodeStatus::Dead)).unwrap();
        staging.stage_add(NodeSpec::new("a").weight(100)).unwrap();

        let ops = staging.drain();
        assert!(matches!(ops[0], PendingOperation::Add(_)));
        assert!(matches!(ops[1], PendingOperation::Update(_)));
        assert!(matches!(ops[2], PendingOperation::Replace(_)));
        assert!(staging.is_empty());
    }

    #[test]
    fn test_replace_wins_over_add_in_same_batch() {
        let mut engine = engine();
        let mut staging = StagingManager::default();
        staging.stage_add(NodeSpec::new("a").weight(100)).unwrap();
        staging
            .stage_replace(NodeSpec::new("a").weight(500).status(NodeStatus::Down))
            .unwrap();
        staging.commit(&mut engine);

        let node = engine.node("a").unwrap();
        assert_eq!(node.weight, 500);
        assert_eq!(node.status, NodeStatus::Down);
    }

    #[test]
    fn test_commit_regenerates_once() {
        let mut engine = engine();
        let mut staging = StagingManager::default();
        staging
            .stage_add_many(vec![NodeSpec::new("a"), NodeSpec::new("b")])
            .unwrap();
        staging.stage_update(NodeSpec::new("b").weight(50)).unwrap();

        let applied = staging.commit(&mut engine);
        assert_eq!(applied, Pending { adds: 2, updates: 1, replaces: 0 });
        assert_eq!(engine.generation(), 1);
        assert!(staging.is_empty());
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut engine = engine();
        let mut staging = StagingManager::default();
        assert_eq!(staging.commit(&mut engine).total(), 0);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_invalid_record_not_queued() {
        let mut staging = StagingManager::default();
        staging.stage_add(NodeSpec::new("ok")).unwrap();

        let err = staging
            .stage_add_many(vec![NodeSpec::new("fine"), NodeSpec::default()])
            .unwrap_err();
        assert_eq!(err, Error::Validation(ValidationError::MissingNodeName));
        assert_eq!(staging.pending().adds, 1);

        assert!(staging.stage_update(NodeSpec::new("")).is_err());
        assert!(staging.stage_replace(NodeSpec::default()).is_err());
        assert_eq!(staging.pending().total(), 1);
    }

    #[test]
    fn test_staged_ops_invisible_until_commit() {
        let mut engine = engine();
        let mut staging = StagingManager::default();
        staging.stage_add(NodeSpec::new("a")).unwrap();
        assert!(engine.get(b"t", LookupMode::All).is_empty());
        staging.commit(&mut engine);
        assert_eq!(engine.get(b"t", LookupMode::All).len(), 1);
    }

    #[test]
    fn test_default_weight_applied() {
        let mut staging = StagingManager::new(40);
        staging.stage_add(NodeSpec::new("a")).unwrap();
        match staging.drain().pop() {
            Some(PendingOperation::Add(record)) => assert_eq!(record.weight, 40),
            other => panic!("unexpected {:?}", other),
        }
    }
}

//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single token on the ring, each node
//! has multiple tokens (virtual nodes), proportional to its weight. This gives:
//!
//! 1. **Better Load Distribution**: More tokens = smoother distribution of keys
//! 2. **Gradual Rebalancing**: When nodes join/leave, only a fraction of keys move
//! 3. **Weighting**: A node of twice the weight owns roughly twice the keys
//!
//! Virtual nodes are derived data: the whole set is regenerated from the node
//! table on every commit and lives exactly as long as one index generation.

use std::fmt;
use std::sync::Arc;

use crate::partitioner::Partitioner;
use crate::token::Token;

/// A virtual node on the hash ring: a (position, node name) pair.
///
/// Ordering is by token first, then by node name, which is also the
/// tie-break when two placements hash to the same position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,
    /// The physical node that owns this virtual node.
    pub node: Arc<str>,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, node: Arc<str>) -> Self {
        Self { token, node }
    }

    /// Place virtual node number `vnode_index` of `node`.
    ///
    /// The position is the hash of `"{node}:{vnode_index}"`, so the same node
    /// table always produces the same placements.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use corelib::VirtualNode;
    /// use corelib::partitioner::Xxh3Partitioner;
    ///
    /// let name: Arc<str> = Arc::from("node1");
    /// let vnode0 = VirtualNode::from_index(&Xxh3Partitioner, &name, 0);
    /// let vnode1 = VirtualNode::from_index(&Xxh3Partitioner, &name, 1);
    /// assert_ne!(vnode0.token, vnode1.token);
    /// ```
    pub fn from_index<P: Partitioner + ?Sized>(
        partitioner: &P,
        node: &Arc<str>,
        vnode_index: u32,
    ) -> Self {
        let vnode_key = format!("{}:{}", node, vnode_index);
        let token = partitioner.partition(vnode_key.as_bytes());
        Self::new(token, Arc::clone(node))
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> Token {
        self.token.distance_to(&other.token)
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node)
    }
}

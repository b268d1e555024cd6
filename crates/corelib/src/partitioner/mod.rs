//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys into tokens
//! that can be placed on the hash ring. Both lookup tokens and virtual node
//! keys (`"{name}:{index}"`) go through the same partitioner.

pub mod sip;
pub mod traits;
pub mod xxh3;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;

/// Built-in hash functions selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Xxh3,
    Sip13,
}

impl HashAlgorithm {
    /// Instantiate the partitioner for this algorithm.
    pub fn partitioner(self) -> Arc<dyn Partitioner> {
        match self {
            HashAlgorithm::Xxh3 => Arc::new(Xxh3Partitioner),
            HashAlgorithm::Sip13 => Arc::new(SipPartitioner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deterministic() {
        for algo in [HashAlgorithm::Xxh3, HashAlgorithm::Sip13] {
            let p = algo.partitioner();
            assert_eq!(p.partition(b"node1:0"), p.partition(b"node1:0"));
        }
    }

    #[test]
    fn test_similar_keys_spread() {
        // Neighbouring vnode keys must not cluster on the ring.
        let p = Xxh3Partitioner;
        let tokens: Vec<_> = (0..64)
            .map(|i| p.partition(format!("node:{}", i).as_bytes()))
            .collect();
        let unique: HashSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), 64);

        let upper_half = tokens.iter().filter(|t| t.0 > u64::MAX / 2).count();
        assert!((16..=48).contains(&upper_half), "skewed: {}", upper_half);
    }

    #[test]
    fn test_algorithms_differ() {
        assert_ne!(
            Xxh3Partitioner.partition(b"key"),
            SipPartitioner.partition(b"key")
        );
        assert_eq!(Xxh3Partitioner.name(), "Xxh3Partitioner");
        assert_eq!(SipPartitioner.name(), "SipPartitioner");
    }
}

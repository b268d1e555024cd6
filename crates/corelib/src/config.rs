//! Ring configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::partitioner::HashAlgorithm;

/// Weight a node gets when a record does not carry one.
pub const DEFAULT_WEIGHT: u32 = 100;

/// Tunables for virtual node placement.
///
/// A node of weight `w` gets
/// `clamp(w * points_per_granule / weight_granularity, 1, max_points_per_node)`
/// virtual nodes. Setting `points_per_granule = 1` yields the plain
/// `max(1, w / weight_granularity)` placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    pub hash: HashAlgorithm,
    pub weight_granularity: u32,
    pub points_per_granule: u32,
    pub max_points_per_node: u32,
    pub default_weight: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::default(),
            weight_granularity: 100,
            points_per_granule: 160,
            max_points_per_node: 65_536,
            default_weight: DEFAULT_WEIGHT,
        }
    }
}

impl RingConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RingConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weight_granularity == 0 {
            return Err(Error::InvalidConfig("weight_granularity must be positive".into()));
        }
        if self.points_per_granule == 0 {
            return Err(Error::InvalidConfig("points_per_granule must be positive".into()));
        }
        if self.max_points_per_node == 0 {
            return Err(Error::InvalidConfig("max_points_per_node must be positive".into()));
        }
        Ok(())
    }

    /// Number of virtual nodes for a node of the given weight.
    pub fn points_for(&self, weight: u32) -> u32 {
        let raw = u64::from(weight) * u64::from(self.points_per_granule)
            / u64::from(self.weight_granularity.max(1));
        raw.clamp(1, u64::from(self.max_points_per_node)) as u32
    }

    /// True when `points_for` had to cap the raw count.
    pub(crate) fn is_clamped(&self, weight: u32) -> bool {
        u64::from(weight) * u64::from(self.points_per_granule)
            / u64::from(self.weight_granularity.max(1))
            > u64::from(self.max_points_per_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_proportional_to_weight() {
        let config = RingConfig::default();
        assert_eq!(config.points_for(100), 160);
        assert_eq!(config.points_for(200), 320);
        assert_eq!(config.points_for(50), 80);
    }

    #[test]
    fn test_points_minimum_one() {
        let config = RingConfig {
            points_per_granule: 1,
            ..RingConfig::default()
        };
        assert_eq!(config.points_for(0), 1);
        assert_eq!(config.points_for(99), 1);
        assert_eq!(config.points_for(100), 1);
        assert_eq!(config.points_for(250), 2);
    }

    #[test]
    fn test_points_clamped() {
        let config = RingConfig::default();
        assert_eq!(config.points_for(u32::MAX), 65_536);
        assert!(config.is_clamped(u32::MAX));
        assert!(!config.is_clamped(100));
    }

    #[test]
    fn test_from_json_defaults() {
        let config = RingConfig::from_json_str(r#"{"hash": "sip13", "points_per_granule": 4}"#)
            .unwrap();
        assert_eq!(config.hash, HashAlgorithm::Sip13);
        assert_eq!(config.points_per_granule, 4);
        assert_eq!(config.weight_granularity, 100);
    }

    #[test]
    fn test_rejects_zero_granularity() {
        let err = RingConfig::from_json_str(r#"{"weight_granularity": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(RingConfig::from_json_str(r#"{"vnodes": 3}"#).is_err());
    }
}

//! Node records for the consistent hash ring.
//!
//! Callers describe nodes with a [`NodeSpec`]: a name plus optional weight and
//! status. Staging validates a spec into either a full [`NodeRecord`] (add,
//! replace) or a partial [`NodeUpdate`] (update).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};

/// Health/eligibility tag of a node. Only [`NodeStatus::Alive`] nodes are
/// placed on the ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Dead,
    Alive,
    Down,
    /// Recorded but not considered. Updates naming an unknown node land here.
    #[default]
    Unknown,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Dead => "dead",
            NodeStatus::Alive => "alive",
            NodeStatus::Down => "down",
            NodeStatus::Unknown => "unknown",
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        matches!(self, NodeStatus::Alive)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dead" => Ok(NodeStatus::Dead),
            "alive" => Ok(NodeStatus::Alive),
            "down" => Ok(NodeStatus::Down),
            "unknown" | "default" => Ok(NodeStatus::Unknown),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// Caller-supplied description of a node, not yet validated.
///
/// ```rust
/// use corelib::{NodeSpec, NodeStatus};
///
/// let spec = NodeSpec::new("cache-1").weight(200).status(NodeStatus::Down);
/// assert_eq!(spec.node.as_deref(), Some("cache-1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub node: Option<String>,
    pub weight: Option<u32>,
    pub status: Option<NodeStatus>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Some(name.into()),
            weight: None,
            status: None,
        }
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn validated_name(&self) -> Result<String> {
        match self.node.as_deref() {
            None => Err(ValidationError::MissingNodeName.into()),
            Some("") => Err(ValidationError::EmptyNodeName.into()),
            Some(name) => Ok(name.to_string()),
        }
    }

    /// Validate into a full record, filling in defaults.
    pub fn to_record(&self, default_weight: u32, default_status: NodeStatus) -> Result<NodeRecord> {
        Ok(NodeRecord {
            name: self.validated_name()?,
            weight: self.weight.unwrap_or(default_weight),
            status: self.status.unwrap_or(default_status),
        })
    }

    /// Validate into a partial update; absent fields stay absent.
    pub fn to_update(&self) -> Result<NodeUpdate> {
        Ok(NodeUpdate {
            name: self.validated_name()?,
            weight: self.weight,
            status: self.status,
        })
    }
}

/// A validated node with every attribute resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub weight: u32,
    pub status: NodeStatus,
}

/// A validated partial record: only the present fields are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeUpdate {
    pub name: String,
    pub weight: Option<u32>,
    pub status: Option<NodeStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("alive".parse::<NodeStatus>().unwrap(), NodeStatus::Alive);
        assert_eq!("dead".parse::<NodeStatus>().unwrap(), NodeStatus::Dead);
        assert_eq!("down".parse::<NodeStatus>().unwrap(), NodeStatus::Down);
        assert_eq!("default".parse::<NodeStatus>().unwrap(), NodeStatus::Unknown);
        assert_eq!(
            "Alive".parse::<NodeStatus>(),
            Err(Error::UnknownStatus("Alive".into()))
        );
    }

    #[test]
    fn test_record_defaults() {
        let record = NodeSpec::new("a").to_record(100, NodeStatus::Alive).unwrap();
        assert_eq!(
            record,
            NodeRecord {
                name: "a".into(),
                weight: 100,
                status: NodeStatus::Alive
            }
        );
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let update = NodeSpec::new("a").status(NodeStatus::Dead).to_update().unwrap();
        assert_eq!(update.weight, None);
        assert_eq!(update.status, Some(NodeStatus::Dead));
    }

    #[test]
    fn test_missing_and_empty_name() {
        assert_eq!(
            NodeSpec::default().to_update(),
            Err(Error::Validation(ValidationError::MissingNodeName))
        );
        assert_eq!(
            NodeSpec::new("").to_record(100, NodeStatus::Alive),
            Err(Error::Validation(ValidationError::EmptyNodeName))
        );
    }
}

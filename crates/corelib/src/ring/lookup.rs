//! Lookup modes and results.

use std::str::FromStr;

use crate::error::{Error, Result};

/// How many nodes a lookup should return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Exactly one node, or none on an empty ring.
    #[default]
    Single,
    /// Up to `n` distinct alive nodes, in ring order.
    Count(usize),
    /// Every distinct alive node, in ring order.
    All,
}

impl From<usize> for LookupMode {
    fn from(n: usize) -> Self {
        LookupMode::Count(n)
    }
}

impl FromStr for LookupMode {
    type Err = Error;

    /// `""` is [`LookupMode::Single`], `"all"` is [`LookupMode::All`] and a
    /// non-negative integer is [`LookupMode::Count`].
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Ok(LookupMode::Single),
            "all" => Ok(LookupMode::All),
            other => other
                .parse::<usize>()
                .map(LookupMode::Count)
                .map_err(|_| Error::InvalidArgument(format!("unrecognized lookup mode {:?}", s))),
        }
    }
}

/// Result of a lookup: a single optional name or an ordered sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    One(Option<String>),
    Many(Vec<String>),
}

impl Lookup {
    pub fn len(&self) -> usize {
        match self {
            Lookup::One(node) => usize::from(node.is_some()),
            Lookup::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Lookup::One(node) => node.into_iter().collect(),
            Lookup::Many(nodes) => nodes,
        }
    }
}

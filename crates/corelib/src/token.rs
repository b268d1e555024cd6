//! Positions on the hash ring.
//!
//! The ring is the circular space `0..=u64::MAX`. Every key and every virtual
//! node is mapped to a [`Token`] by a [`Partitioner`](crate::Partitioner);
//! arithmetic on tokens wraps at the top of the space.

use std::fmt;

/// A position on the ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Token(pub u64);

impl Token {
    /// Minimum token value (start of ring).
    pub const MIN: Token = Token(0);
    /// Maximum token value (end of ring).
    pub const MAX: Token = Token(u64::MAX);

    /// True if this token is the minimum.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True if this token is the maximum.
    #[inline]
    pub fn is_max(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Clockwise distance from `self` to `other` on the ring.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> Self {
        Token(other.0.wrapping_sub(self.0))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token(value)
    }
}

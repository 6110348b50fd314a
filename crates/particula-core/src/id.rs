//! Strongly-typed identifiers.

use std::fmt;

/// Index of an attribute within its [`AttributeSchema`](crate::AttributeSchema).
///
/// `AttributeId(n)` is the n-th attribute in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub u32);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AttributeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Position of a block within its container, in creation order.
///
/// Only valid until the container's block list is next restructured
/// (compaction or releasing empty blocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Scene frame number a cached snapshot belongs to.
///
/// Signed because scene timelines may start before frame zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameIndex(pub i32);

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for FrameIndex {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

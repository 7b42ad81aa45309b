//! Tree identity and source ranges

use crate::node::SyntaxNode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Identity of one tree value
///
/// Assigned when a [`SyntaxTree`] is created. Two trees with equal content
/// created separately have different ids, so findings bound to an old tree
/// never silently attach to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(pub Ulid);

impl TreeId {
    /// Generate new tree ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TreeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A root node bound to its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    id: TreeId,
    root: SyntaxNode,
}

impl SyntaxTree {
    /// Wrap a root under a fresh identity
    #[inline]
    #[must_use]
    pub fn new(root: SyntaxNode) -> Self {
        Self {
            id: TreeId::new(),
            root,
        }
    }

    /// Wrap a root under a known identity
    ///
    /// Resolvers that cache parses use this to hand out the same identity for
    /// the same unit value.
    #[inline]
    #[must_use]
    pub fn with_id(id: TreeId, root: SyntaxNode) -> Self {
        Self { id, root }
    }

    /// Tree identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }
}

/// Half-open byte range `[start, end)` within a unit's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl TextRange {
    /// Create range; `end` is clamped to be at least `start`
    #[inline]
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Empty range at an offset
    #[inline]
    #[must_use]
    pub fn empty(at: u32) -> Self {
        Self { start: at, end: at }
    }

    /// Length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Zero-length range
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the range
    #[inline]
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `other` lies entirely inside this range
    #[inline]
    #[must_use]
    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Display for TextRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

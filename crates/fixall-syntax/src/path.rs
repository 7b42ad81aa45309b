//! Node paths for addressing within a syntax tree
//!
//! Provides [`NodePath`], the sequence of child indices leading from a root
//! to one of its descendants.

use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a syntax tree
///
/// Each segment is a child index. The empty path addresses the root.
///
/// # Examples
/// - `[]` → the root itself
/// - `[0, 2]` → third child of the root's first child, displayed `0/2`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(SmallVec<[usize; 8]>);

impl NodePath {
    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: &[usize]) -> Self {
        Self(SmallVec::from_slice(segments))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(SmallVec::from_slice(&self.0[..self.0.len() - 1])))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(index);
        new
    }

    /// Concatenate another path below this one
    #[must_use]
    pub fn join(&self, other: &NodePath) -> Self {
        let mut new = self.clone();
        new.0.extend_from_slice(&other.0);
        new
    }

    /// Path relative to `prefix`, if `prefix` is a prefix of this path
    #[must_use]
    pub fn strip_prefix(&self, prefix: &NodePath) -> Option<Self> {
        if prefix.is_prefix_of(self) {
            Some(Self(SmallVec::from_slice(&self.0[prefix.len()..])))
        } else {
            None
        }
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        s.split('/')
            .map(|segment| {
                segment
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidSegment(segment.to_string()))
            })
            .collect::<Result<SmallVec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(segments: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(segments))
    }
}

/// Errors related to node paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Segment is not a child index
    #[error("invalid path segment: '{0}'")]
    InvalidSegment(String),

    /// Path leaves the tree
    #[error("path {path} does not address a node (failed at depth {depth})")]
    OutOfBounds {
        /// Offending path
        path: String,
        /// Depth at which the child was missing
        depth: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_empty() {
        let root = NodePath::root();
        assert!(root.is_empty());
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn child_and_parent() {
        let path = NodePath::root().child(1).child(3);
        assert_eq!(path.segments(), &[1, 3]);
        assert_eq!(path.last(), Some(3));
        assert_eq!(path.parent(), Some(NodePath::new(&[1])));
    }

    #[test]
    fn prefix_relations() {
        let a = NodePath::new(&[0, 1]);
        let b = NodePath::new(&[0, 1, 4]);
        let c = NodePath::new(&[0, 2]);

        assert!(a.is_prefix_of(&b));
        assert!(a.is_ancestor_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_prefix_of(&c));
        assert_eq!(b.strip_prefix(&a), Some(NodePath::new(&[4])));
        assert_eq!(c.strip_prefix(&a), None);
    }

    #[test]
    fn display_round_trip() {
        let path = NodePath::new(&[2, 0, 11]);
        assert_eq!(path.to_string(), "2/0/11");
        assert_eq!("2/0/11".parse::<NodePath>().unwrap(), path);
        assert_eq!("".parse::<NodePath>().unwrap(), NodePath::root());
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "1/x".parse::<NodePath>().unwrap_err();
        assert_eq!(err, PathError::InvalidSegment("x".to_string()));
    }

    #[test]
    fn join_appends() {
        let a = NodePath::new(&[1]);
        let b = NodePath::new(&[2, 3]);
        assert_eq!(a.join(&b), NodePath::new(&[1, 2, 3]));
    }
}

//! fixall Syntax Model
//!
//! Immutable syntax trees and corpus snapshots for batch remediation.
//!
//! # Core Concepts
//!
//! - [`SyntaxNode`]: `Arc`-shared immutable node, edited by path copying
//! - [`ContentHash`]: Blake3 hash deciding structural equality
//! - [`NodePath`]: Child-index address of a node inside a root
//! - [`SyntaxTree`] / [`TreeId`]: A root bound to the identity findings refer to
//! - [`SourceUnit`], [`UnitGroup`], [`Corpus`]: Immutable snapshots with structural sharing
//!
//! # Example
//!
//! ```rust
//! use fixall_syntax::{Corpus, SourceUnit, SyntaxNode, UnitGroup};
//!
//! let unit = SourceUnit::new("lib.rs", SyntaxNode::root(vec![]));
//! let group = UnitGroup::new("core", "rust").add_unit(unit.clone()).unwrap();
//! let corpus = Corpus::from_groups([group]).unwrap();
//!
//! let edited = unit.with_root(SyntaxNode::root(vec![SyntaxNode::literal("1")]));
//! let next = corpus.replace_units([edited]).unwrap();
//!
//! assert_eq!(next.unit_count(), corpus.unit_count());
//! assert_ne!(next, corpus);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod corpus;
mod hash;
mod node;
mod path;
mod tree;

// Re-exports
pub use corpus::{Corpus, GroupId, LanguageTag, SourceUnit, SyntaxError, UnitGroup, UnitId};
pub use hash::ContentHash;
pub use node::{SyntaxKind, SyntaxNode};
pub use path::{NodePath, PathError};
pub use tree::{SyntaxTree, TextRange, TreeId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

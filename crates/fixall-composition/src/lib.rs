//! fixall Composition
//!
//! Building the replacement syntax and the replacement snapshot.
//!
//! # Core Concepts
//!
//! - [`PredicateCombinator`]: Merges two single-parameter predicates into one
//!   conjunctive predicate, unifying parameters by symbol identity
//! - [`SnapshotComposer`]: Rebuilds a corpus from per-unit replacement roots,
//!   keeping every group and unit in place
//!
//! # Example
//!
//! ```rust
//! use fixall_composition::{combine_predicates, PredicateFunction};
//! use fixall_syntax::SyntaxNode;
//!
//! let positive = PredicateFunction::inline(
//!     "x",
//!     SyntaxNode::binary(SyntaxNode::identifier("x"), ">", SyntaxNode::literal("0")),
//! );
//! let small = PredicateFunction::inline(
//!     "y",
//!     SyntaxNode::binary(SyntaxNode::identifier("y"), "<", SyntaxNode::literal("10")),
//! );
//!
//! let both = combine_predicates(Some(positive), Some(small)).unwrap();
//! assert_eq!(both.to_string(), "x => x > 0 && x < 10");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod predicate;
mod snapshot;

// Re-exports
pub use predicate::{
    combine_predicates, PredicateCombinator, PredicateFunction, DEFAULT_FALLBACK_PARAMETER,
};
pub use snapshot::{verify_shape, CompositionError, SnapshotComposer, UnitReplacement};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

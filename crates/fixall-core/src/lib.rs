//! fixall Core Orchestrator
//!
//! Applies one fix function across a unit, a unit group, or every group of
//! a corpus sharing a language, and composes the per-unit results into a
//! new snapshot.
//!
//! # Architecture
//!
//! ```text
//! Scope ──► FindingAggregator ──► group by owner tree ──► FixFunction (per unit)
//!             (task per group)                                  │
//!                                                               ▼
//!                                UpdatedEntity ◄── SnapshotComposer
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use fixall_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(provider: Arc<dyn FindingProvider>, corpus: Corpus, group: GroupId) -> fixall_core::Result<()> {
//! let fixer = BatchFixer::new(provider).with_config(FixAllConfig::default())?;
//! let rules: RuleSet = ["CMP001"].into_iter().collect();
//! let fix = Arc::new(FnFix::new(|unit: &SourceUnit, _findings: &[Finding]| {
//!     Ok(Some(unit.root().clone()))
//! }));
//!
//! let updated = fixer
//!     .apply(Scope::Corpus { origin: group }, &rules, fix, &corpus, &CancellationToken::new())
//!     .await?;
//! # let _ = updated;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregation;
mod collaborators;
mod config;
mod engine;
mod error;
mod finding;
pub mod logging;
mod report;
mod scope;

// Re-exports
pub use aggregation::{check_cancelled, Aggregated, FindingAggregator};
pub use collaborators::{
    AttachedTreeResolver, CachingTreeResolver, FindingProvider, FixFunction, FnFix, TreeResolver,
};
pub use config::{FixAllConfig, LoggingConfig};
pub use engine::BatchFixer;
pub use error::{FixAllError, Result};
pub use finding::{Finding, FindingKind, FindingKindError, FindingQuery, QueryKey, RuleSet};
pub use report::BatchReport;
pub use scope::{ResolvedScope, Scope, UpdatedEntity};

pub use tokio_util::sync::CancellationToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    //! Common imports for writing fix functions and running batches
    pub use crate::{
        BatchFixer, BatchReport, CancellationToken, Finding, FindingKind, FindingProvider,
        FindingQuery, FixAllConfig, FixAllError, FixFunction, FnFix, RuleSet, Scope,
        TreeResolver, UpdatedEntity,
    };
    pub use fixall_composition::{PredicateCombinator, PredicateFunction};
    pub use fixall_symbol::{MethodSignature, OverloadMatcher, Parameter, TypeRef};
    pub use fixall_syntax::{Corpus, GroupId, SourceUnit, SyntaxNode, UnitGroup, UnitId};
}

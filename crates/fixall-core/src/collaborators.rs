//! External collaborator interfaces
//!
//! The orchestrator does not know how findings are produced, how units are
//! parsed, or what a fix does. Those are supplied through these traits.

use crate::finding::{Finding, FindingQuery, RuleSet};
use async_trait::async_trait;
use fixall_syntax::{ContentHash, SourceUnit, SyntaxNode, SyntaxTree, UnitId};
use moka::future::Cache;
use std::fmt;
use std::sync::Arc;

/// Source of findings for one unit or group
#[async_trait]
pub trait FindingProvider: Send + Sync {
    /// Findings for `query`, in discovery order
    ///
    /// `rules` is a hint; the orchestrator filters the result itself.
    ///
    /// # Errors
    /// Any provider failure aborts the batch
    async fn query_findings(&self, query: FindingQuery, rules: &RuleSet)
        -> anyhow::Result<Vec<Finding>>;
}

/// Materialises the tree of a unit
#[async_trait]
pub trait TreeResolver: Send + Sync {
    /// Tree for `unit`
    ///
    /// Must be deterministic for a given unit value: the returned tree's id
    /// is what findings refer to.
    ///
    /// # Errors
    /// Any resolver failure aborts the batch
    async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree>;
}

/// Per-unit remediation
///
/// Implementations must not share mutable state between invocations; the
/// orchestrator calls them concurrently for different units.
#[async_trait]
pub trait FixFunction: Send + Sync {
    /// New root for `unit`, or `None` for no change
    ///
    /// # Errors
    /// An error aborts the whole batch
    async fn fix(&self, unit: &SourceUnit, findings: &[Finding]) -> anyhow::Result<Option<SyntaxNode>>;
}

/// [`FixFunction`] backed by a synchronous closure
pub struct FnFix<F> {
    f: F,
}

impl<F> FnFix<F>
where
    F: Fn(&SourceUnit, &[Finding]) -> anyhow::Result<Option<SyntaxNode>> + Send + Sync,
{
    /// Wrap closure
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnFix<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFix").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> FixFunction for FnFix<F>
where
    F: Fn(&SourceUnit, &[Finding]) -> anyhow::Result<Option<SyntaxNode>> + Send + Sync,
{
    async fn fix(&self, unit: &SourceUnit, findings: &[Finding]) -> anyhow::Result<Option<SyntaxNode>> {
        (self.f)(unit, findings)
    }
}

/// Resolver returning the tree already attached to each unit
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachedTreeResolver;

#[async_trait]
impl TreeResolver for AttachedTreeResolver {
    async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
        Ok(unit.tree().clone())
    }
}

/// Memoising resolver keyed by unit id and root content
///
/// Repeated resolution of the same unit value returns the same tree, and
/// therefore the same tree id, even when the inner resolver builds a fresh
/// tree each time.
pub struct CachingTreeResolver<R> {
    inner: R,
    cache: Cache<(UnitId, ContentHash), SyntaxTree>,
}

impl<R: TreeResolver> CachingTreeResolver<R> {
    /// Wrap `inner` with a cache of at most `max_capacity` trees
    #[must_use]
    pub fn new(inner: R, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_capacity),
        }
    }

    /// Configured cache bound
    #[must_use]
    pub fn max_capacity(&self) -> Option<u64> {
        self.cache.policy().max_capacity()
    }

    /// Number of cached trees
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop all cached trees
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<R> fmt::Debug for CachingTreeResolver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingTreeResolver")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: TreeResolver> TreeResolver for CachingTreeResolver<R> {
    async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
        let key = (unit.id(), *unit.root().content_hash());
        self.cache
            .try_get_with(key, self.inner.resolve_root(unit))
            .await
            .map_err(|e: Arc<anyhow::Error>| anyhow::anyhow!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Builds a fresh tree on every call
    #[derive(Default)]
    struct Reparse {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TreeResolver for Reparse {
        async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SyntaxTree::new(unit.root().clone()))
        }
    }

    struct Broken;

    #[async_trait]
    impl TreeResolver for Broken {
        async fn resolve_root(&self, _unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
            anyhow::bail!("parse error at 3:7")
        }
    }

    fn unit() -> SourceUnit {
        SourceUnit::new("a", SyntaxNode::root(vec![SyntaxNode::identifier("a")]))
    }

    #[tokio::test]
    async fn attached_resolver_returns_unit_tree() {
        let unit = unit();
        let tree = AttachedTreeResolver.resolve_root(&unit).await.unwrap();
        assert_eq!(tree.id(), unit.tree_id());
    }

    #[tokio::test]
    async fn caching_resolver_keeps_tree_identity() {
        let resolver = CachingTreeResolver::new(Reparse::default(), 16);
        let unit = unit();

        let first = resolver.resolve_root(&unit).await.unwrap();
        let second = resolver.resolve_root(&unit).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(resolver.inner.calls.load(Ordering::SeqCst), 1);

        // new content for the same unit is a new key
        let edited = unit.with_root(SyntaxNode::root(vec![]));
        let third = resolver.resolve_root(&edited).await.unwrap();
        assert_ne!(third.id(), first.id());
        assert_eq!(resolver.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn caching_resolver_propagates_failures() {
        let resolver = CachingTreeResolver::new(Broken, 16);
        let err = resolver.resolve_root(&unit()).await.unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[tokio::test]
    async fn closure_fix() {
        let fix = FnFix::new(|unit: &SourceUnit, findings: &[Finding]| {
            Ok((!findings.is_empty()).then(|| unit.root().clone()))
        });
        assert_eq!(fix.fix(&unit(), &[]).await.unwrap(), None);
    }
}

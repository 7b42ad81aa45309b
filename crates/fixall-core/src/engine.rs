//! Batch fix orchestrator
//!
//! [`BatchFixer`] applies one fix function across a scope:
//!
//! 1. resolve the scope to target groups and units
//! 2. aggregate findings (one concurrent task per group at corpus scope)
//! 3. resolve every target unit's tree and index units by tree identity
//! 4. group findings by owning unit, first-seen order
//! 5. run the fix once per implicated unit, concurrently
//! 6. compose the results into a new unit or corpus
//!
//! The batch is all-or-nothing: cancellation or any single failure returns
//! an error and no partial result.

use crate::aggregation::{check_cancelled, FindingAggregator};
use crate::collaborators::{AttachedTreeResolver, FindingProvider, FixFunction, TreeResolver};
use crate::config::FixAllConfig;
use crate::error::{FixAllError, Result};
use crate::finding::{Finding, RuleSet};
use crate::report::BatchReport;
use crate::scope::{ResolvedScope, Scope, UpdatedEntity};
use fixall_composition::{SnapshotComposer, UnitReplacement};
use fixall_syntax::{Corpus, SourceUnit, SyntaxNode, SyntaxTree, TreeId, UnitId};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Scope-aware concurrent batch fixer
#[derive(Clone)]
pub struct BatchFixer {
    aggregator: FindingAggregator,
    resolver: Arc<dyn TreeResolver>,
    config: FixAllConfig,
}

impl std::fmt::Debug for BatchFixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFixer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BatchFixer {
    /// Create fixer using each unit's attached tree and default configuration
    #[must_use]
    pub fn new(provider: Arc<dyn FindingProvider>) -> Self {
        Self {
            aggregator: FindingAggregator::new(provider),
            resolver: Arc::new(AttachedTreeResolver),
            config: FixAllConfig::default(),
        }
    }

    /// With tree resolver
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn TreeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// With `inner` behind a cache sized by the active configuration
    ///
    /// Apply [`with_config`](Self::with_config) first for a non-default
    /// capacity.
    #[must_use]
    pub fn with_caching_resolver<R: TreeResolver + 'static>(self, inner: R) -> Self {
        let resolver = self.config.caching_resolver(inner);
        self.with_resolver(Arc::new(resolver))
    }

    /// With configuration
    ///
    /// # Errors
    /// Returns `FixAllError::Config` if `config` fails validation
    pub fn with_config(mut self, config: FixAllConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FixAllConfig {
        &self.config
    }

    /// Apply `fix` to every unit in `scope` that has findings for `rules`
    ///
    /// Returns a [`UpdatedEntity::Unit`] for [`Scope::Unit`] and a
    /// [`UpdatedEntity::Corpus`] otherwise. Groups outside the scope are
    /// carried over unchanged.
    ///
    /// # Errors
    /// - `FixAllError::Cancelled` if `cancel` fires before the result is built
    /// - `FixAllError::FixFailed` if any fix invocation fails
    /// - `FixAllError::Aggregation`/`TreeResolution` on collaborator failure
    /// - `FixAllError::UnknownUnit`/`UnknownGroup` if `scope` is not in `corpus`
    pub async fn apply(
        &self,
        scope: Scope,
        rules: &RuleSet,
        fix: Arc<dyn FixFunction>,
        corpus: &Corpus,
        cancel: &CancellationToken,
    ) -> Result<UpdatedEntity> {
        self.apply_with_report(scope, rules, fix, corpus, cancel)
            .await
            .map(|(entity, _)| entity)
    }

    /// Like [`apply`](Self::apply), also returning run counters
    ///
    /// # Errors
    /// Same as [`apply`](Self::apply)
    #[tracing::instrument(skip_all, fields(scope = %scope, rules = %rules))]
    pub async fn apply_with_report(
        &self,
        scope: Scope,
        rules: &RuleSet,
        fix: Arc<dyn FixFunction>,
        corpus: &Corpus,
        cancel: &CancellationToken,
    ) -> Result<(UpdatedEntity, BatchReport)> {
        let started = Instant::now();
        let outcome = self.run(scope, rules, fix, corpus, cancel).await;

        match outcome {
            Ok((entity, mut report)) => {
                report.elapsed = started.elapsed();
                info!(
                    findings = report.findings_aggregated,
                    dropped = report.findings_dropped,
                    fixed = report.units_fixed,
                    unchanged = report.units_unchanged(),
                    elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
                    "batch fix complete"
                );
                Ok((entity, report))
            }
            Err(FixAllError::Cancelled) => {
                warn!("batch fix cancelled");
                Err(FixAllError::Cancelled)
            }
            Err(e) => {
                error!(error = %e, "batch fix failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        scope: Scope,
        rules: &RuleSet,
        fix: Arc<dyn FixFunction>,
        corpus: &Corpus,
        cancel: &CancellationToken,
    ) -> Result<(UpdatedEntity, BatchReport)> {
        check_cancelled(cancel)?;
        let resolved = scope.resolve(corpus)?;
        info!(
            groups = resolved.groups().len(),
            units = resolved.units().len(),
            language = %resolved.language(),
            "batch fix started"
        );

        let mut report = BatchReport {
            units_in_scope: resolved.units().len(),
            ..BatchReport::default()
        };

        let aggregated = self
            .aggregator
            .aggregate(resolved.queries(), rules, cancel)
            .await?;
        check_cancelled(cancel)?;
        report.queries_issued = aggregated.queries;
        report.findings_aggregated = aggregated.findings.len();

        if aggregated.findings.is_empty() {
            debug!("no findings, returning input unchanged");
            return Ok((unchanged(&resolved, corpus), report));
        }

        let trees = self.resolve_trees(resolved.units(), cancel).await?;

        let (grouped, dropped) = group_by_owner(aggregated.findings, &trees);
        report.findings_dropped = dropped;
        report.units_attempted = grouped.len();

        let outputs = self
            .fix_units(&resolved, &trees, grouped, fix, cancel)
            .await?;

        check_cancelled(cancel)?;
        let replacements: Vec<UnitReplacement> = outputs
            .into_iter()
            .filter_map(|(unit, root)| {
                let current = trees.get(&unit).map(SyntaxTree::root)?;
                (root != *current).then(|| UnitReplacement::new(unit, root))
            })
            .collect();
        report.units_fixed = replacements.len();

        let entity = compose(&resolved, corpus, replacements)?;
        Ok((entity, report))
    }

    /// Resolve every unit's tree concurrently
    async fn resolve_trees(
        &self,
        units: &[SourceUnit],
        cancel: &CancellationToken,
    ) -> Result<ResolvedTrees> {
        let resolutions = futures::future::try_join_all(units.iter().map(|unit| async move {
            let tree = self
                .resolver
                .resolve_root(unit)
                .await
                .map_err(|source| FixAllError::TreeResolution {
                    unit: unit.id(),
                    source,
                })?;
            Ok::<_, FixAllError>((unit.id(), tree))
        }));

        let resolved = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FixAllError::Cancelled),
            resolved = resolutions => resolved?,
        };

        let mut trees = ResolvedTrees::default();
        for (unit, tree) in resolved {
            trees.insert(unit, tree);
        }
        debug!(units = units.len(), "trees resolved");
        Ok(trees)
    }

    /// Run `fix` for every implicated unit, bounded by the configured concurrency
    async fn fix_units(
        &self,
        resolved: &ResolvedScope,
        trees: &ResolvedTrees,
        grouped: IndexMap<UnitId, Vec<Finding>>,
        fix: Arc<dyn FixFunction>,
        cancel: &CancellationToken,
    ) -> Result<Vec<(UnitId, SyntaxNode)>> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_fixes));
        let mut tasks = JoinSet::new();

        for unit in resolved.units() {
            let Some(findings) = grouped.get(&unit.id()) else {
                continue;
            };
            let Some(tree) = trees.get(&unit.id()) else {
                continue;
            };
            check_cancelled(cancel)?;

            let unit = unit.with_tree(tree.clone());
            let findings = findings.clone();
            let fix = Arc::clone(&fix);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| FixAllError::TaskFailed(e.to_string()))?;
                debug!(unit = %unit.id(), findings = findings.len(), "fixing unit");
                let output = fix
                    .fix(&unit, &findings)
                    .await
                    .map_err(|source| FixAllError::FixFailed {
                        unit: unit.id(),
                        source,
                    })?;
                Ok::<_, FixAllError>((unit.id(), output))
            });
        }

        let mut outputs = Vec::with_capacity(tasks.len());
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(FixAllError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok((unit, Some(root))))) => outputs.push((unit, root)),
                    Some(Ok(Ok((unit, None)))) => debug!(unit = %unit, "fix produced no change"),
                    Some(Ok(Err(e))) => {
                        tasks.abort_all();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        tasks.abort_all();
                        return Err(FixAllError::TaskFailed(e.to_string()));
                    }
                },
            }
        }
        Ok(outputs)
    }
}

/// Resolved trees by unit, plus the reverse index by tree identity
#[derive(Debug, Default)]
struct ResolvedTrees {
    by_unit: HashMap<UnitId, SyntaxTree>,
    by_tree: HashMap<TreeId, UnitId>,
}

impl ResolvedTrees {
    fn insert(&mut self, unit: UnitId, tree: SyntaxTree) {
        self.by_tree.insert(tree.id(), unit);
        self.by_unit.insert(unit, tree);
    }

    fn get(&self, unit: &UnitId) -> Option<&SyntaxTree> {
        self.by_unit.get(unit)
    }

    fn owner(&self, tree: TreeId) -> Option<UnitId> {
        self.by_tree.get(&tree).copied()
    }
}

/// Group findings by owning unit, keeping first-seen order
///
/// Findings whose tree is not in the index are dropped and counted.
fn group_by_owner(
    findings: Vec<Finding>,
    trees: &ResolvedTrees,
) -> (IndexMap<UnitId, Vec<Finding>>, usize) {
    let mut grouped: IndexMap<UnitId, Vec<Finding>> = IndexMap::new();
    let mut dropped = 0;

    for finding in findings {
        match trees.owner(finding.owner_tree()) {
            Some(unit) => grouped.entry(unit).or_default().push(finding),
            None => {
                debug!(finding = %finding, "owner tree outside scope, finding dropped");
                dropped += 1;
            }
        }
    }
    (grouped, dropped)
}

fn unchanged(resolved: &ResolvedScope, corpus: &Corpus) -> UpdatedEntity {
    match (resolved.scope(), resolved.units()) {
        (Scope::Unit(_), [unit]) => UpdatedEntity::Unit(unit.clone()),
        _ => UpdatedEntity::Corpus(corpus.clone()),
    }
}

fn compose(
    resolved: &ResolvedScope,
    corpus: &Corpus,
    replacements: Vec<UnitReplacement>,
) -> Result<UpdatedEntity> {
    if let (Scope::Unit(_), [unit]) = (resolved.scope(), resolved.units()) {
        let updated = match replacements.into_iter().next() {
            Some(replacement) => unit.with_root(replacement.root),
            None => unit.clone(),
        };
        return Ok(UpdatedEntity::Unit(updated));
    }

    let composed = SnapshotComposer::new().compose(corpus, replacements)?;
    Ok(UpdatedEntity::Corpus(composed))
}

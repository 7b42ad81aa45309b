//! Concurrent finding aggregation
//!
//! One task per query. Each task writes its result under its own unit or
//! group key in a shared [`DashMap`]; keys are disjoint, so tasks never
//! contend beyond the map's own sharding.

use crate::collaborators::FindingProvider;
use crate::error::{FixAllError, Result};
use crate::finding::{Finding, FindingQuery, QueryKey, RuleSet};
use dashmap::DashMap;
use indexmap::IndexSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Findings gathered for one batch
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    /// Wanted findings, deduplicated, in query then discovery order
    pub findings: Vec<Finding>,
    /// Queries issued
    pub queries: usize,
    /// Findings discarded because their rule was not requested
    pub filtered_out: usize,
}

/// Runs finding queries and merges their results
#[derive(Clone)]
pub struct FindingAggregator {
    provider: Arc<dyn FindingProvider>,
}

impl std::fmt::Debug for FindingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindingAggregator").finish_non_exhaustive()
    }
}

impl FindingAggregator {
    /// Create aggregator
    #[inline]
    #[must_use]
    pub fn new(provider: Arc<dyn FindingProvider>) -> Self {
        Self { provider }
    }

    /// Query every target and merge the results
    ///
    /// A single query runs inline; several run as concurrent tasks, with a
    /// cancellation check before each launch. Either way the queries race
    /// `cancel`.
    ///
    /// # Errors
    /// - `FixAllError::Cancelled` if `cancel` fires before all queries finish
    /// - `FixAllError::Aggregation` on the first provider failure
    /// - `FixAllError::TaskFailed` if a query task panics
    pub async fn aggregate(
        &self,
        queries: &[FindingQuery],
        rules: &RuleSet,
        cancel: &CancellationToken,
    ) -> Result<Aggregated> {
        let per_query = match queries {
            [single] => {
                check_cancelled(cancel)?;
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(FixAllError::Cancelled),
                    findings = self.query(single.clone(), rules) => vec![findings?],
                }
            }
            _ => self.query_concurrently(queries, rules, cancel).await?,
        };

        let mut merged = IndexSet::new();
        for findings in per_query {
            merged.extend(findings);
        }

        let total = merged.len();
        let findings: Vec<Finding> = merged.into_iter().filter(|f| rules.admits(f)).collect();
        Ok(Aggregated {
            filtered_out: total - findings.len(),
            queries: queries.len(),
            findings,
        })
    }

    async fn query(&self, query: FindingQuery, rules: &RuleSet) -> Result<Vec<Finding>> {
        let target = query.describe();
        let findings = self
            .provider
            .query_findings(query, rules)
            .await
            .map_err(|source| FixAllError::Aggregation {
                target: target.clone(),
                source,
            })?;
        debug!(query = %target, count = findings.len(), "findings queried");
        Ok(findings)
    }

    async fn query_concurrently(
        &self,
        queries: &[FindingQuery],
        rules: &RuleSet,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<Finding>>> {
        let results: Arc<DashMap<QueryKey, Vec<Finding>>> = Arc::new(DashMap::new());
        let rules = Arc::new(rules.clone());
        let mut tasks = JoinSet::new();

        for query in queries {
            check_cancelled(cancel)?;
            let key = query.key();
            let this = self.clone();
            let results = Arc::clone(&results);
            let rules = Arc::clone(&rules);
            let query = query.clone();
            tasks.spawn(async move {
                let findings = this.query(query, &rules).await?;
                results.insert(key, findings);
                Ok::<_, FixAllError>(())
            });
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(FixAllError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok(()))) => {}
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

        Ok(queries
            .iter()
            .map(|query| results.remove(&query.key()).map(|(_, f)| f).unwrap_or_default())
            .collect())
    }
}

/// Fail fast if cancellation was requested
///
/// # Errors
/// Returns `FixAllError::Cancelled` when `cancel` has fired
pub fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(FixAllError::Cancelled)
    } else {
        Ok(())
    }
}

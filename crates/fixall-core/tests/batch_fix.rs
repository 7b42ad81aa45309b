//! Batch fix orchestration tests
//!
//! Drive `BatchFixer` end to end with the in-memory provider and recording
//! fixes from `fixall-test-utils`.

use fixall_core::prelude::*;
use fixall_core::{BatchReport, QueryKey};
use fixall_test_utils::{
    finding, CorpusBuilder, FailingResolver, InMemoryFindingProvider, RecordingFix,
    ReparsingResolver, StallingFindingProvider, StallingFix, TestCorpus,
};
use fixall_syntax::{TextRange, TreeId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn rules(ids: &[&str]) -> RuleSet {
    ids.iter().copied().collect()
}

/// Two rust groups (a, b | c) and one python group (p)
fn fixture() -> TestCorpus {
    CorpusBuilder::new()
        .group("core", "rust", &["a", "b"])
        .group("cli", "rust", &["c"])
        .group("scripts", "python", &["p"])
        .build()
}

async fn run(
    provider: InMemoryFindingProvider,
    scope: Scope,
    rule_ids: &[&str],
    fix: Arc<dyn FixFunction>,
    corpus: &Corpus,
) -> fixall_core::Result<(UpdatedEntity, BatchReport)> {
    BatchFixer::new(Arc::new(provider))
        .apply_with_report(scope, &rules(rule_ids), fix, corpus, &CancellationToken::new())
        .await
}

/// Findings whose rule is not requested leave the corpus untouched and
/// never reach the fix function
#[tokio::test]
async fn unmatched_rules_return_input_unchanged() {
    let t = fixture();
    let provider = InMemoryFindingProvider::new(vec![
        finding("R1", t.unit("a"), 0),
        finding("R1", t.unit("c"), 4),
    ]);
    let fix = Arc::new(RecordingFix::new());

    let (updated, report) = run(
        provider,
        Scope::Corpus { origin: t.group("core").id() },
        &["OTHER"],
        fix.clone(),
        &t.corpus,
    )
    .await
    .unwrap();

    assert_eq!(updated, UpdatedEntity::Corpus(t.corpus.clone()));
    assert!(fix.invocations().is_empty());
    assert_eq!(report.findings_aggregated, 0);
    assert!(!report.changed());
}

#[tokio::test]
async fn unmatched_rules_at_unit_scope_return_same_unit() {
    let t = fixture();
    let fix = Arc::new(RecordingFix::new());

    let updated = run(
        InMemoryFindingProvider::default(),
        Scope::Unit(t.unit("b").id()),
        &["R1"],
        fix,
        &t.corpus,
    )
    .await
    .unwrap()
    .0;

    assert_eq!(updated.into_unit(), Some(t.unit("b").clone()));
}

/// One failing unit fails the batch; the caller's corpus is untouched
#[tokio::test]
async fn single_fix_failure_aborts_batch() {
    let t = CorpusBuilder::new()
        .group("core", "rust", &["u1", "u2", "u3"])
        .build();
    let before = t.corpus.clone();
    let provider = InMemoryFindingProvider::new(vec![
        finding("R1", t.unit("u1"), 0),
        finding("R1", t.unit("u2"), 0),
        finding("R1", t.unit("u3"), 0),
    ]);
    let failing = t.unit("u2").id();

    let err = run(
        provider,
        Scope::UnitGroup(t.group("core").id()),
        &["R1"],
        Arc::new(RecordingFix::failing_on(failing)),
        &t.corpus,
    )
    .await
    .unwrap_err();

    match &err {
        FixAllError::FixFailed { unit, source } => {
            assert_eq!(*unit, failing);
            assert!(source.to_string().contains("invalid syntax"));
        }
        other => panic!("expected FixFailed, got {other:?}"),
    }
    assert!(err.is_retryable_at_smaller_scope());
    assert_eq!(t.corpus, before);
}

/// Five findings over three units: one invocation per unit, carrying only
/// that unit's findings in first-seen order
#[tokio::test]
async fn findings_grouped_per_owner_in_discovery_order() {
    let t = CorpusBuilder::new()
        .group("core", "rust", &["u1", "u2", "u3"])
        .build();
    let (u1, u2, u3) = (t.unit("u1"), t.unit("u2"), t.unit("u3"));
    let all = vec![
        finding("R1", u2, 10),
        finding("R1", u1, 0),
        finding("R2", u2, 3),
        finding("R2", u3, 7),
        finding("R1", u2, 1),
    ];
    let fix = Arc::new(RecordingFix::new());

    let (updated, report) = run(
        InMemoryFindingProvider::new(all.clone()),
        Scope::UnitGroup(t.group("core").id()),
        &["R1", "R2"],
        fix.clone(),
        &t.corpus,
    )
    .await
    .unwrap();

    let invocations = fix.invocations();
    assert_eq!(invocations.len(), 3);
    assert_eq!(
        fix.invocation_for(u2.id()).unwrap().findings,
        vec![all[0].clone(), all[2].clone(), all[4].clone()]
    );
    assert_eq!(fix.invocation_for(u1.id()).unwrap().findings, vec![all[1].clone()]);
    assert_eq!(fix.invocation_for(u3.id()).unwrap().findings, vec![all[3].clone()]);

    assert_eq!(report.findings_aggregated, 5);
    assert_eq!(report.units_fixed, 3);

    let corpus = updated.into_corpus().unwrap();
    for unit in [u1, u2, u3] {
        let (_, fixed) = corpus.find_unit(&unit.id()).unwrap();
        assert_eq!(fixed.root(), &RecordingFix::fixed_root(unit));
    }
}

/// A finding owned by a tree outside the scope is dropped, not misattributed
#[tokio::test]
async fn foreign_owner_findings_are_dropped() {
    let t = fixture();
    let core = t.group("core").id();
    let stray = finding("R1", t.unit("p"), 0);
    let stale = Finding::new("R1", TreeId::new(), TextRange::new(0, 1));
    let provider = InMemoryFindingProvider::new(vec![finding("R1", t.unit("a"), 0)])
        .with_foreign(core, stray.clone())
        .with_foreign(core, stale.clone());
    let fix = Arc::new(RecordingFix::new());

    let (_, report) = run(provider, Scope::UnitGroup(core), &["R1"], fix.clone(), &t.corpus)
        .await
        .unwrap();

    assert_eq!(report.findings_dropped, 2);
    let invocations = fix.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].unit, t.unit("a").id());
    assert!(invocations
        .iter()
        .all(|i| !i.findings.contains(&stray) && !i.findings.contains(&stale)));
}

/// Corpus scope queries only groups sharing the origin's language and
/// carries other groups over unchanged
#[tokio::test]
async fn corpus_scope_follows_origin_language() {
    let t = fixture();
    let provider = Arc::new(InMemoryFindingProvider::new(vec![
        finding("R1", t.unit("b"), 0),
        finding("R1", t.unit("c"), 0),
        finding("R1", t.unit("p"), 0),
    ]));
    let fix = Arc::new(RecordingFix::new());

    let updated = BatchFixer::new(provider.clone())
        .apply(
            Scope::Corpus { origin: t.group("cli").id() },
            &rules(&["R1"]),
            fix.clone(),
            &t.corpus,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut queried = provider.queries();
    queried.sort_by_key(|k| format!("{k:?}"));
    let mut expected = vec![
        QueryKey::Group(t.group("core").id()),
        QueryKey::Group(t.group("cli").id()),
    ];
    expected.sort_by_key(|k| format!("{k:?}"));
    assert_eq!(queried, expected);

    let corpus = updated.into_corpus().unwrap();
    assert_eq!(corpus.unit_count(), t.corpus.unit_count());
    assert_eq!(corpus.group(&t.group("scripts").id()), Some(t.group("scripts")));
    assert_eq!(corpus.find_unit(&t.unit("a").id()).unwrap().1, t.unit("a"));
    assert_ne!(corpus.find_unit(&t.unit("b").id()).unwrap().1, t.unit("b"));
    assert_ne!(corpus.find_unit(&t.unit("c").id()).unwrap().1, t.unit("c"));
    assert!(fix.invocation_for(t.unit("p").id()).is_none());
}

/// Unit scope fixes only the named unit and returns it, not a corpus
#[tokio::test]
async fn unit_scope_returns_fixed_unit() {
    let t = fixture();
    let a = t.unit("a");
    let provider = InMemoryFindingProvider::new(vec![
        finding("R1", a, 0),
        finding("R1", t.unit("b"), 0),
    ]);
    let fix = Arc::new(RecordingFix::new());

    let (updated, report) = run(provider, Scope::Unit(a.id()), &["R1"], fix.clone(), &t.corpus)
        .await
        .unwrap();

    let fixed = updated.into_unit().unwrap();
    assert_eq!(fixed.id(), a.id());
    assert_eq!(fixed.root(), &RecordingFix::fixed_root(a));
    assert_ne!(fixed.tree_id(), a.tree_id());
    assert_eq!(fix.invocations().len(), 1);
    assert_eq!(report.units_in_scope, 1);
}

/// A fix returning `None` keeps the unit's value and tree identity
#[tokio::test]
async fn no_change_keeps_unit_identity() {
    let t = fixture();
    let (a, b) = (t.unit("a"), t.unit("b"));
    let provider = InMemoryFindingProvider::new(vec![finding("R1", a, 0), finding("R1", b, 0)]);
    let fix = Arc::new(RecordingFix::new().unchanged_on(a.id()));

    let (updated, report) = run(provider, Scope::UnitGroup(t.group("core").id()), &["R1"], fix, &t.corpus)
        .await
        .unwrap();

    let corpus = updated.into_corpus().unwrap();
    assert_eq!(corpus.find_unit(&a.id()).unwrap().1, a);
    assert_eq!(report.units_attempted, 2);
    assert_eq!(report.units_fixed, 1);
    assert_eq!(report.units_unchanged(), 1);
}

#[tokio::test]
async fn cancelled_before_start() {
    let t = fixture();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = BatchFixer::new(Arc::new(InMemoryFindingProvider::default()))
        .apply(
            Scope::UnitGroup(t.group("core").id()),
            &rules(&["R1"]),
            Arc::new(RecordingFix::new()),
            &t.corpus,
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

/// Cancelling while a fix is running returns `Cancelled`, never a partial corpus
#[tokio::test]
async fn cancelled_during_fix() {
    let t = fixture();
    let provider = InMemoryFindingProvider::new(vec![finding("R1", t.unit("a"), 0)]);
    let fix = Arc::new(StallingFix::default());
    let started = Arc::clone(&fix.started);
    let cancel = CancellationToken::new();
    let fixer = BatchFixer::new(Arc::new(provider));

    let scope = Scope::UnitGroup(t.group("core").id());
    let rule_set = rules(&["R1"]);
    let (result, ()) = tokio::join!(
        fixer.apply(scope, &rule_set, fix, &t.corpus, &cancel),
        async {
            started.notified().await;
            cancel.cancel();
        }
    );

    assert!(matches!(result, Err(FixAllError::Cancelled)));
}

/// Cancels the batch from inside the query and reports nothing
struct CancellingProvider {
    cancel: CancellationToken,
}

#[async_trait::async_trait]
impl FindingProvider for CancellingProvider {
    async fn query_findings(&self, _query: FindingQuery, _rules: &RuleSet) -> anyhow::Result<Vec<Finding>> {
        self.cancel.cancel();
        Ok(Vec::new())
    }
}

/// A cancel observed during a group query wins over the empty-findings result
#[tokio::test]
async fn cancelled_during_group_query() {
    let t = fixture();
    let cancel = CancellationToken::new();
    let provider = CancellingProvider { cancel: cancel.clone() };

    let err = BatchFixer::new(Arc::new(provider))
        .apply(
            Scope::UnitGroup(t.group("core").id()),
            &rules(&["R1"]),
            Arc::new(RecordingFix::new()),
            &t.corpus,
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

/// A provider that never answers does not hold a unit-scope batch past cancellation
#[tokio::test]
async fn cancelled_while_unit_query_stalls() {
    let t = fixture();
    let provider = StallingFindingProvider::default();
    let started = Arc::clone(&provider.started);
    let cancel = CancellationToken::new();
    let fixer = BatchFixer::new(Arc::new(provider));
    let rule_set = rules(&["R1"]);

    let joined = tokio::time::timeout(Duration::from_secs(2), async {
        tokio::join!(
            fixer.apply(
                Scope::Unit(t.unit("a").id()),
                &rule_set,
                Arc::new(RecordingFix::new()),
                &t.corpus,
                &cancel,
            ),
            async {
                started.notified().await;
                cancel.cancel();
            }
        )
    })
    .await;

    let (result, ()) = joined.expect("batch still running after cancellation");
    assert!(matches!(result, Err(FixAllError::Cancelled)));
}

/// Findings refer to the resolver's trees, not the trees attached to units
#[tokio::test]
async fn findings_follow_resolved_tree_identity() {
    let t = fixture();
    let core = t.group("core").id();
    let (a, b) = (t.unit("a"), t.unit("b"));
    let resolver = Arc::new(
        FixAllConfig::default()
            .with_resolver_cache_capacity(8)
            .caching_resolver(ReparsingResolver::default()),
    );
    let tree_a = resolver.resolve_root(a).await.unwrap();
    let tree_b = resolver.resolve_root(b).await.unwrap();
    assert_ne!(tree_a.id(), a.tree_id());

    let on_a = Finding::new("R1", tree_a.id(), TextRange::new(0, 1));
    let on_b = Finding::new("R1", tree_b.id(), TextRange::new(2, 3));
    let attached = finding("R1", a, 5);
    let provider = InMemoryFindingProvider::default()
        .with_foreign(core, on_b.clone())
        .with_foreign(core, attached.clone())
        .with_foreign(core, on_a.clone());
    let fix = Arc::new(RecordingFix::new());

    let (updated, report) = BatchFixer::new(Arc::new(provider))
        .with_resolver(resolver)
        .apply_with_report(Scope::UnitGroup(core), &rules(&["R1"]), fix.clone(), &t.corpus, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.findings_dropped, 1);
    assert_eq!(fix.invocation_for(a.id()).unwrap().findings, vec![on_a]);
    assert_eq!(fix.invocation_for(b.id()).unwrap().findings, vec![on_b]);

    let corpus = updated.into_corpus().unwrap();
    assert_eq!(corpus.find_unit(&a.id()).unwrap().1.root(), &RecordingFix::fixed_root(a));
}

/// Findings on attached trees are stale once a reparsing resolver is in use
#[tokio::test]
async fn caching_resolver_rebuilds_tree_index() {
    let t = fixture();
    let core = t.group("core").id();
    let provider = InMemoryFindingProvider::new(vec![
        finding("R1", t.unit("a"), 0),
        finding("R1", t.unit("b"), 0),
    ]);
    let fix = Arc::new(RecordingFix::new());

    let fixer = BatchFixer::new(Arc::new(provider))
        .with_config(FixAllConfig::default().with_resolver_cache_capacity(4))
        .unwrap()
        .with_caching_resolver(ReparsingResolver::default());
    let (updated, report) = fixer
        .apply_with_report(Scope::UnitGroup(core), &rules(&["R1"]), fix.clone(), &t.corpus, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.findings_aggregated, 2);
    assert_eq!(report.findings_dropped, 2);
    assert!(fix.invocations().is_empty());
    assert_eq!(updated, UpdatedEntity::Corpus(t.corpus.clone()));
}

#[tokio::test]
async fn resolver_failure_surfaces_as_tree_resolution_error() {
    let t = fixture();
    let broken = t.unit("b").id();
    let provider = InMemoryFindingProvider::new(vec![finding("R1", t.unit("a"), 0)]);

    let err = BatchFixer::new(Arc::new(provider))
        .with_resolver(Arc::new(FailingResolver { unit: broken }))
        .apply(
            Scope::UnitGroup(t.group("core").id()),
            &rules(&["R1"]),
            Arc::new(RecordingFix::new()),
            &t.corpus,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        FixAllError::TreeResolution { unit, source } => {
            assert_eq!(unit, broken);
            assert!(source.to_string().contains("does not parse"));
        }
        other => panic!("expected TreeResolution, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_failure_surfaces_as_aggregation_error() {
    let t = fixture();
    let core = t.group("core").id();
    let provider = InMemoryFindingProvider::new(vec![finding("R1", t.unit("a"), 0)]).failing_for(core);

    let err = run(provider, Scope::Corpus { origin: core }, &["R1"], Arc::new(RecordingFix::new()), &t.corpus)
        .await
        .unwrap_err();

    match err {
        FixAllError::Aggregation { target, source } => {
            assert!(target.contains("core"));
            assert!(source.to_string().contains("analyzer crashed"));
        }
        other => panic!("expected Aggregation, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_scope_target_rejected() {
    let t = fixture();
    let err = run(
        InMemoryFindingProvider::default(),
        Scope::UnitGroup(GroupId::new()),
        &["R1"],
        Arc::new(RecordingFix::new()),
        &t.corpus,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FixAllError::UnknownGroup(_)));
}

/// Concurrency bound of one still fixes every unit
#[tokio::test]
async fn serial_concurrency_bound() {
    let t = CorpusBuilder::new()
        .group("core", "rust", &["u1", "u2", "u3", "u4"])
        .build();
    let all: Vec<_> = ["u1", "u2", "u3", "u4"]
        .iter()
        .map(|n| finding("R1", t.unit(n), 0))
        .collect();

    let fixer = BatchFixer::new(Arc::new(InMemoryFindingProvider::new(all)))
        .with_config(FixAllConfig::default().with_max_concurrent_fixes(1))
        .unwrap();
    let (_, report) = fixer
        .apply_with_report(
            Scope::UnitGroup(t.group("core").id()),
            &rules(&["R1"]),
            Arc::new(RecordingFix::new()),
            &t.corpus,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.units_fixed, 4);
}

#[test]
fn invalid_config_rejected_by_fixer() {
    let result = BatchFixer::new(Arc::new(InMemoryFindingProvider::default()))
        .with_config(FixAllConfig::default().with_max_concurrent_fixes(0));
    assert!(matches!(result, Err(FixAllError::Config(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every implicated unit is fixed exactly once with exactly its own
    /// findings, in the order they were reported
    #[test]
    fn prop_grouping_matches_ownership(owners in proptest::collection::vec(0usize..3, 0..12)) {
        let t = CorpusBuilder::new().group("core", "rust", &["u0", "u1", "u2"]).build();
        let units = [t.unit("u0"), t.unit("u1"), t.unit("u2")];
        let all: Vec<Finding> = owners
            .iter()
            .enumerate()
            .map(|(i, &o)| finding("R1", units[o], u32::try_from(i).unwrap()))
            .collect();
        let fix = Arc::new(RecordingFix::new());

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime
            .block_on(run(
                InMemoryFindingProvider::new(all.clone()),
                Scope::UnitGroup(t.group("core").id()),
                &["R1"],
                fix.clone(),
                &t.corpus,
            ))
            .unwrap();

        let mut implicated: Vec<usize> = owners.clone();
        implicated.sort_unstable();
        implicated.dedup();
        prop_assert_eq!(fix.invocations().len(), implicated.len());

        for (o, unit) in units.iter().enumerate() {
            let expected: Vec<Finding> = all
                .iter()
                .zip(&owners)
                .filter(|(_, owner)| **owner == o)
                .map(|(f, _)| f.clone())
                .collect();
            let got = fix.invocation_for(unit.id()).map(|i| i.findings).unwrap_or_default();
            prop_assert_eq!(got, expected);
        }
    }
}

//! Testing utilities for the fixall workspace
//!
//! Corpus fixtures, scripted finding providers and tree resolvers, and fix
//! functions that record, fail, or stall on demand.

#![allow(missing_docs)]

use async_trait::async_trait;
use fixall_core::{
    Finding, FindingProvider, FindingQuery, FixFunction, QueryKey, RuleSet, TreeResolver,
};
use fixall_syntax::{
    Corpus, GroupId, SourceUnit, SyntaxNode, SyntaxTree, TextRange, UnitGroup, UnitId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Unit whose root holds a single identifier named after the unit
pub fn unit(name: &str) -> SourceUnit {
    SourceUnit::new(name, SyntaxNode::root(vec![SyntaxNode::identifier(name)]))
}

/// Finding owned by `unit`'s current tree
pub fn finding(rule: &str, unit: &SourceUnit, start: u32) -> Finding {
    Finding::new(rule, unit.tree_id(), TextRange::new(start, start + 1))
}

/// Corpus plus name-based access to its groups and units
#[derive(Debug, Clone)]
pub struct TestCorpus {
    pub corpus: Corpus,
    groups: HashMap<String, GroupId>,
    units: HashMap<String, UnitId>,
}

impl TestCorpus {
    pub fn group(&self, name: &str) -> &UnitGroup {
        let id = self.groups[name];
        self.corpus.group(&id).unwrap()
    }

    pub fn unit(&self, name: &str) -> &SourceUnit {
        let id = self.units[name];
        self.corpus.find_unit(&id).unwrap().1
    }
}

/// Builds a [`TestCorpus`] group by group
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    groups: Vec<(String, String, Vec<String>)>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, name: &str, language: &str, units: &[&str]) -> Self {
        self.groups.push((
            name.to_owned(),
            language.to_owned(),
            units.iter().map(|u| (*u).to_owned()).collect(),
        ));
        self
    }

    pub fn build(self) -> TestCorpus {
        let mut corpus = Corpus::new();
        let mut groups = HashMap::new();
        let mut units = HashMap::new();

        for (name, language, unit_names) in self.groups {
            let mut group = UnitGroup::new(&name, language.as_str());
            for unit_name in unit_names {
                let u = unit(&unit_name);
                units.insert(unit_name, u.id());
                group = group.add_unit(u).unwrap();
            }
            groups.insert(name, group.id());
            corpus = corpus.add_group(group).unwrap();
        }

        TestCorpus { corpus, groups, units }
    }
}

/// Finding provider answering from a fixed list
///
/// Each query gets the registered findings owned by its units, in
/// registration order, regardless of the requested rules. Findings attached
/// with [`with_foreign`](Self::with_foreign) are appended to a group's
/// answer whatever their owner.
#[derive(Debug, Default)]
pub struct InMemoryFindingProvider {
    findings: Vec<Finding>,
    foreign: HashMap<GroupId, Vec<Finding>>,
    failing: HashSet<GroupId>,
    queries: Mutex<Vec<QueryKey>>,
}

impl InMemoryFindingProvider {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            ..Self::default()
        }
    }

    pub fn with_foreign(mut self, group: GroupId, finding: Finding) -> Self {
        self.foreign.entry(group).or_default().push(finding);
        self
    }

    pub fn failing_for(mut self, group: GroupId) -> Self {
        self.failing.insert(group);
        self
    }

    pub fn queries(&self) -> Vec<QueryKey> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl FindingProvider for InMemoryFindingProvider {
    async fn query_findings(&self, query: FindingQuery, _rules: &RuleSet) -> anyhow::Result<Vec<Finding>> {
        self.queries.lock().push(query.key());

        let (trees, group): (HashSet<_>, Option<GroupId>) = match &query {
            FindingQuery::Unit(unit) => (HashSet::from([unit.tree_id()]), None),
            FindingQuery::Group(group) => (
                group.units().iter().map(SourceUnit::tree_id).collect(),
                Some(group.id()),
            ),
        };

        if let Some(id) = group {
            if self.failing.contains(&id) {
                anyhow::bail!("analyzer crashed on group {id}");
            }
        }

        let mut out: Vec<Finding> = self
            .findings
            .iter()
            .filter(|f| trees.contains(&f.owner_tree()))
            .cloned()
            .collect();
        if let Some(extra) = group.and_then(|id| self.foreign.get(&id)) {
            out.extend(extra.iter().cloned());
        }
        Ok(out)
    }
}

/// One recorded fix invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub unit: UnitId,
    pub findings: Vec<Finding>,
}

/// Fix appending a `fixed` literal to the root of every unit it sees
#[derive(Debug, Default)]
pub struct RecordingFix {
    invocations: Mutex<Vec<Invocation>>,
    fail_on: Option<UnitId>,
    no_change_on: HashSet<UnitId>,
}

impl RecordingFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an error for `unit`
    pub fn failing_on(unit: UnitId) -> Self {
        Self {
            fail_on: Some(unit),
            ..Self::default()
        }
    }

    /// Return `None` for `unit`
    pub fn unchanged_on(mut self, unit: UnitId) -> Self {
        self.no_change_on.insert(unit);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn invocation_for(&self, unit: UnitId) -> Option<Invocation> {
        self.invocations.lock().iter().find(|i| i.unit == unit).cloned()
    }

    /// Root this fix produces for `unit`
    pub fn fixed_root(unit: &SourceUnit) -> SyntaxNode {
        let mut children = unit.root().children().to_vec();
        children.push(SyntaxNode::literal("fixed"));
        unit.root().with_children(children)
    }
}

#[async_trait]
impl FixFunction for RecordingFix {
    async fn fix(&self, unit: &SourceUnit, findings: &[Finding]) -> anyhow::Result<Option<SyntaxNode>> {
        self.invocations.lock().push(Invocation {
            unit: unit.id(),
            findings: findings.to_vec(),
        });

        if self.fail_on == Some(unit.id()) {
            anyhow::bail!("fix for {} produced invalid syntax", unit.name());
        }
        if self.no_change_on.contains(&unit.id()) {
            return Ok(None);
        }
        Ok(Some(Self::fixed_root(unit)))
    }
}

/// Fix that signals when it starts and then never completes
#[derive(Debug, Default)]
pub struct StallingFix {
    pub started: Arc<Notify>,
}

#[async_trait]
impl FixFunction for StallingFix {
    async fn fix(&self, _unit: &SourceUnit, _findings: &[Finding]) -> anyhow::Result<Option<SyntaxNode>> {
        self.started.notify_one();
        std::future::pending::<()>().await;
        Ok(None)
    }
}

/// Provider that signals when queried and then never answers
#[derive(Debug, Default)]
pub struct StallingFindingProvider {
    pub started: Arc<Notify>,
}

#[async_trait]
impl FindingProvider for StallingFindingProvider {
    async fn query_findings(&self, _query: FindingQuery, _rules: &RuleSet) -> anyhow::Result<Vec<Finding>> {
        self.started.notify_one();
        std::future::pending().await
    }
}

/// Resolver building a fresh tree, with a fresh id, on every call
#[derive(Debug, Default)]
pub struct ReparsingResolver {
    calls: AtomicUsize,
}

impl ReparsingResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TreeResolver for ReparsingResolver {
    async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SyntaxTree::new(unit.root().clone()))
    }
}

/// Resolver failing for one unit and reparsing the rest
#[derive(Debug)]
pub struct FailingResolver {
    pub unit: UnitId,
}

#[async_trait]
impl TreeResolver for FailingResolver {
    async fn resolve_root(&self, unit: &SourceUnit) -> anyhow::Result<SyntaxTree> {
        if unit.id() == self.unit {
            anyhow::bail!("{} does not parse", unit.name());
        }
        Ok(SyntaxTree::new(unit.root().clone()))
    }
}

//! Findings, rule sets and finding queries
//!
//! A [`Finding`] is one reported issue instance. Findings are produced by
//! external detectors; the orchestrator only groups them by owning unit.

use fixall_syntax::{GroupId, SourceUnit, TextRange, TreeId, UnitGroup, UnitId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// One reported issue instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    rule_id: Arc<str>,
    owner_tree: TreeId,
    span: TextRange,
    properties: BTreeMap<String, String>,
}

impl Finding {
    /// Create finding with no properties
    #[must_use]
    pub fn new(rule_id: &str, owner_tree: TreeId, span: TextRange) -> Self {
        Self {
            rule_id: Arc::from(rule_id),
            owner_tree,
            span,
            properties: BTreeMap::new(),
        }
    }

    /// With property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Rule identifier
    #[inline]
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Identity of the tree the finding was reported against
    #[inline]
    #[must_use]
    pub fn owner_tree(&self) -> TreeId {
        self.owner_tree
    }

    /// Reported source range
    #[inline]
    #[must_use]
    pub fn span(&self) -> TextRange {
        self.span
    }

    /// All properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Raw property value
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Property parsed into `T`
    ///
    /// # Errors
    /// Returns `FindingKindError::Missing` or `FindingKindError::Unrecognized`
    pub fn property_as<T: FromStr>(&self, key: &str) -> Result<T, FindingKindError> {
        let value = self.property(key).ok_or_else(|| FindingKindError::Missing {
            rule_id: self.rule_id.to_string(),
            property: key.to_owned(),
        })?;
        value.parse().map_err(|_| FindingKindError::Unrecognized {
            rule_id: self.rule_id.to_string(),
            property: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Decide the tagged variant this finding asks for
    ///
    /// Reads [`FindingKind::PROPERTY`] and parses it into `K`, so a fix
    /// function matches exhaustively on `K` instead of comparing strings.
    ///
    /// # Errors
    /// Returns `FindingKindError` when the discriminator is absent or unknown
    pub fn kind<K: FindingKind>(&self) -> Result<K, FindingKindError> {
        self.property_as(K::PROPERTY)
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}[{}]", self.rule_id, self.owner_tree, self.span)
    }
}

/// Closed set of rewrite strategies selected by a finding property
///
/// ```rust
/// use fixall_core::{Finding, FindingKind};
/// use fixall_syntax::{TextRange, TreeId};
///
/// #[derive(Debug, PartialEq)]
/// enum Comparison { Ordinal, IgnoreCase }
///
/// impl std::str::FromStr for Comparison {
///     type Err = ();
///     fn from_str(s: &str) -> Result<Self, ()> {
///         match s {
///             "ordinal" => Ok(Self::Ordinal),
///             "ignore-case" => Ok(Self::IgnoreCase),
///             _ => Err(()),
///         }
///     }
/// }
///
/// impl FindingKind for Comparison {}
///
/// let finding = Finding::new("CMP001", TreeId::new(), TextRange::new(0, 4))
///     .with_property("kind", "ignore-case");
/// assert_eq!(finding.kind::<Comparison>().unwrap(), Comparison::IgnoreCase);
/// ```
pub trait FindingKind: FromStr {
    /// Property holding the discriminator
    const PROPERTY: &'static str = "kind";
}

/// Failed to decide a finding's variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FindingKindError {
    /// Discriminator property absent
    #[error("finding {rule_id} has no `{property}` property")]
    Missing {
        /// Rule of the finding
        rule_id: String,
        /// Expected property
        property: String,
    },

    /// Discriminator value not recognised
    #[error("finding {rule_id} has unrecognized `{property}` value `{value}`")]
    Unrecognized {
        /// Rule of the finding
        rule_id: String,
        /// Property read
        property: String,
        /// Value found
        value: String,
    },
}

/// Ordered set of rule identifiers wanted for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: IndexSet<Arc<str>>,
}

impl RuleSet {
    /// Create empty rule set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rule id, returning `false` if already present
    pub fn insert(&mut self, rule_id: &str) -> bool {
        self.rules.insert(Arc::from(rule_id))
    }

    /// Whether `rule_id` is wanted
    #[inline]
    #[must_use]
    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains(rule_id)
    }

    /// Whether `finding` belongs to this batch
    #[inline]
    #[must_use]
    pub fn admits(&self, finding: &Finding) -> bool {
        self.contains(finding.rule_id())
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule is wanted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule ids in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| &**r)
    }
}

impl<'a> FromIterator<&'a str> for RuleSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(Arc::from).collect(),
        }
    }
}

impl Display for RuleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(rule)?;
        }
        f.write_str("}")
    }
}

/// What a finding provider is asked to analyse
#[derive(Debug, Clone)]
pub enum FindingQuery {
    /// Findings of one unit only
    Unit(SourceUnit),

    /// Findings of every unit in one group
    Group(UnitGroup),
}

impl FindingQuery {
    /// Identity of the queried unit or group
    #[must_use]
    pub fn key(&self) -> QueryKey {
        match self {
            Self::Unit(unit) => QueryKey::Unit(unit.id()),
            Self::Group(group) => QueryKey::Group(group.id()),
        }
    }

    /// Short description used in errors and logs
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl Display for FindingQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(unit) => write!(f, "unit {} ({})", unit.id(), unit.name()),
            Self::Group(group) => write!(f, "group {} ({})", group.id(), group.name()),
        }
    }
}

/// Disjoint key of one aggregation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Unit query
    Unit(UnitId),

    /// Group query
    Group(GroupId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Rewrite {
        AddArgument,
        SwapCall,
    }

    impl FromStr for Rewrite {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "add-argument" => Ok(Self::AddArgument),
                "swap-call" => Ok(Self::SwapCall),
                other => Err(other.to_owned()),
            }
        }
    }

    impl FindingKind for Rewrite {
        const PROPERTY: &'static str = "rewrite";
    }

    fn finding() -> Finding {
        Finding::new("R1", TreeId::new(), TextRange::new(3, 9))
    }

    #[test]
    fn kind_dispatches_on_discriminator() {
        let f = finding().with_property("rewrite", "swap-call");
        assert_eq!(f.kind::<Rewrite>().unwrap(), Rewrite::SwapCall);

        let g = finding().with_property("rewrite", "add-argument");
        assert_eq!(g.kind::<Rewrite>().unwrap(), Rewrite::AddArgument);
    }

    #[test]
    fn kind_reports_missing_and_unknown_values() {
        assert!(matches!(
            finding().kind::<Rewrite>(),
            Err(FindingKindError::Missing { property, .. }) if property == "rewrite"
        ));
        assert!(matches!(
            finding().with_property("rewrite", "inline").kind::<Rewrite>(),
            Err(FindingKindError::Unrecognized { value, .. }) if value == "inline"
        ));
    }

    #[test]
    fn typed_property_access() {
        let f = finding().with_property("position", "2");
        assert_eq!(f.property_as::<usize>("position").unwrap(), 2);
        assert!(f.property_as::<usize>("absent").is_err());
        assert_eq!(f.property("position"), Some("2"));
    }

    #[test]
    fn rule_set_keeps_insertion_order() {
        let mut rules: RuleSet = ["B", "A"].into_iter().collect();
        assert!(!rules.insert("B"));
        assert!(rules.insert("C"));

        assert_eq!(rules.iter().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert!(rules.admits(&Finding::new("A", TreeId::new(), TextRange::default())));
        assert!(!rules.contains("D"));
        assert_eq!(rules.to_string(), "{B, A, C}");
    }
}

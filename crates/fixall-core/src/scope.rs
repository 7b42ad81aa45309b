//! Fix scopes and their resolution against a corpus

use crate::error::{FixAllError, Result};
use crate::finding::FindingQuery;
use fixall_syntax::{Corpus, GroupId, LanguageTag, SourceUnit, UnitGroup, UnitId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Breadth over which a batch fix is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// One unit; only that unit is fixed
    Unit(UnitId),

    /// Every unit of one group
    UnitGroup(GroupId),

    /// Every group sharing the language of `origin`
    Corpus {
        /// Group the request came from
        origin: GroupId,
    },
}

impl Scope {
    /// Whether the result is a single unit
    #[inline]
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit(_))
    }

    /// Resolve against `corpus`
    ///
    /// # Errors
    /// Returns `FixAllError::UnknownUnit`/`UnknownGroup` if the scope names
    /// something outside `corpus`
    pub fn resolve(&self, corpus: &Corpus) -> Result<ResolvedScope> {
        match *self {
            Self::Unit(id) => {
                let (group, unit) = corpus.find_unit(&id).ok_or(FixAllError::UnknownUnit(id))?;
                Ok(ResolvedScope {
                    scope: *self,
                    language: group.language().clone(),
                    groups: vec![group.clone()],
                    units: vec![unit.clone()],
                    queries: vec![FindingQuery::Unit(unit.clone())],
                })
            }
            Self::UnitGroup(id) => {
                let group = corpus.group(&id).ok_or(FixAllError::UnknownGroup(id))?;
                Ok(ResolvedScope {
                    scope: *self,
                    language: group.language().clone(),
                    units: group.units().iter().cloned().collect(),
                    queries: vec![FindingQuery::Group(group.clone())],
                    groups: vec![group.clone()],
                })
            }
            Self::Corpus { origin } => {
                let language = corpus
                    .group(&origin)
                    .ok_or(FixAllError::UnknownGroup(origin))?
                    .language()
                    .clone();
                let groups: Vec<UnitGroup> = corpus.groups_with_language(&language).cloned().collect();
                Ok(ResolvedScope {
                    scope: *self,
                    units: groups.iter().flat_map(|g| g.units().iter().cloned()).collect(),
                    queries: groups.iter().cloned().map(FindingQuery::Group).collect(),
                    groups,
                    language,
                })
            }
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "unit {id}"),
            Self::UnitGroup(id) => write!(f, "group {id}"),
            Self::Corpus { origin } => write!(f, "corpus (origin {origin})"),
        }
    }
}

/// A scope resolved to concrete groups and units
#[derive(Debug, Clone)]
pub struct ResolvedScope {
    scope: Scope,
    language: LanguageTag,
    groups: Vec<UnitGroup>,
    units: Vec<SourceUnit>,
    queries: Vec<FindingQuery>,
}

impl ResolvedScope {
    /// Scope this was resolved from
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Language shared by the target groups
    #[inline]
    #[must_use]
    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    /// Participating groups, in corpus order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[UnitGroup] {
        &self.groups
    }

    /// Units that may be fixed, in corpus order
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// One query per aggregation task
    #[inline]
    #[must_use]
    pub fn queries(&self) -> &[FindingQuery] {
        &self.queries
    }
}

/// Result of a batch fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatedEntity {
    /// Returned for `Scope::Unit`
    Unit(SourceUnit),

    /// Returned for `Scope::UnitGroup` and `Scope::Corpus`
    Corpus(Corpus),
}

impl UpdatedEntity {
    /// The unit, if this is a unit result
    #[must_use]
    pub fn as_unit(&self) -> Option<&SourceUnit> {
        match self {
            Self::Unit(unit) => Some(unit),
            Self::Corpus(_) => None,
        }
    }

    /// The corpus, if this is a corpus result
    #[must_use]
    pub fn as_corpus(&self) -> Option<&Corpus> {
        match self {
            Self::Corpus(corpus) => Some(corpus),
            Self::Unit(_) => None,
        }
    }

    /// Take the unit, if this is a unit result
    #[must_use]
    pub fn into_unit(self) -> Option<SourceUnit> {
        match self {
            Self::Unit(unit) => Some(unit),
            Self::Corpus(_) => None,
        }
    }

    /// Take the corpus, if this is a corpus result
    #[must_use]
    pub fn into_corpus(self) -> Option<Corpus> {
        match self {
            Self::Corpus(corpus) => Some(corpus),
            Self::Unit(_) => None,
        }
    }
}

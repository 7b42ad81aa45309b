//! Source units, unit groups and corpus snapshots
//!
//! All three are immutable values. Groups and the corpus hold their children
//! in persistent [`im::Vector`]s, so replacing one unit produces a new corpus
//! that shares every other unit and group with the old one.

use crate::node::SyntaxNode;
use crate::path::PathError;
use crate::tree::{SyntaxTree, TreeId};
use im::Vector;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use ulid::Ulid;

/// Stable unit identity (survives edits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Ulid);

impl UnitId {
    /// Generate new unit ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable group identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Ulid);

impl GroupId {
    /// Generate new group ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Language/dialect tag shared by every unit of a group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageTag(Arc<str>);

impl LanguageTag {
    /// Create tag
    #[inline]
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(Arc::from(tag))
    }

    /// Tag text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LanguageTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl Display for LanguageTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One source file's immutable parsed form
///
/// Editing never mutates a unit; [`SourceUnit::with_root`] returns the
/// superseding unit, which keeps the [`UnitId`] and gets a fresh [`TreeId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    id: UnitId,
    name: Arc<str>,
    tree: SyntaxTree,
}

impl SourceUnit {
    /// Create unit with fresh identities
    #[must_use]
    pub fn new(name: &str, root: SyntaxNode) -> Self {
        Self {
            id: UnitId::new(),
            name: Arc::from(name),
            tree: SyntaxTree::new(root),
        }
    }

    /// Create unit from known parts
    #[must_use]
    pub fn from_parts(id: UnitId, name: &str, tree: SyntaxTree) -> Self {
        Self {
            id,
            name: Arc::from(name),
            tree,
        }
    }

    /// Unit identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Display name (path-like, not used for identity)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Identity of the current tree
    #[inline]
    #[must_use]
    pub fn tree_id(&self) -> TreeId {
        self.tree.id()
    }

    /// Current root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &SyntaxNode {
        self.tree.root()
    }

    /// Superseding unit with a new root
    #[must_use]
    pub fn with_root(&self, root: SyntaxNode) -> Self {
        self.with_tree(SyntaxTree::new(root))
    }

    /// Same unit viewed through another tree value
    #[must_use]
    pub fn with_tree(&self, tree: SyntaxTree) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            tree,
        }
    }
}

/// Ordered units sharing one language tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGroup {
    id: GroupId,
    name: Arc<str>,
    language: LanguageTag,
    units: Vector<SourceUnit>,
}

impl UnitGroup {
    /// Create empty group
    #[must_use]
    pub fn new(name: &str, language: impl Into<LanguageTag>) -> Self {
        Self {
            id: GroupId::new(),
            name: Arc::from(name),
            language: language.into(),
            units: Vector::new(),
        }
    }

    /// Append a unit
    ///
    /// # Errors
    /// Returns `SyntaxError::DuplicateUnit` if the unit id is already present
    pub fn add_unit(mut self, unit: SourceUnit) -> Result<Self, SyntaxError> {
        if self.contains_unit(&unit.id()) {
            return Err(SyntaxError::DuplicateUnit(unit.id()));
        }
        self.units.push_back(unit);
        Ok(self)
    }

    /// Group identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language tag
    #[inline]
    #[must_use]
    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    /// Units in declaration order
    #[inline]
    #[must_use]
    pub fn units(&self) -> &Vector<SourceUnit> {
        &self.units
    }

    /// Number of units
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// No units
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit by id
    #[must_use]
    pub fn unit(&self, id: &UnitId) -> Option<&SourceUnit> {
        self.units.iter().find(|u| u.id() == *id)
    }

    /// Check if the group owns a unit
    #[inline]
    #[must_use]
    pub fn contains_unit(&self, id: &UnitId) -> bool {
        self.unit(id).is_some()
    }

    /// New group with one unit superseded
    ///
    /// # Errors
    /// Returns `SyntaxError::UnknownUnit` if the group does not own the unit
    pub fn replace_unit(&self, unit: SourceUnit) -> Result<Self, SyntaxError> {
        let index = self
            .units
            .iter()
            .position(|u| u.id() == unit.id())
            .ok_or(SyntaxError::UnknownUnit(unit.id()))?;

        let mut group = self.clone();
        group.units.set(index, unit);
        Ok(group)
    }
}

/// Immutable multi-group snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corpus {
    groups: Vector<UnitGroup>,
}

impl Corpus {
    /// Empty corpus
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build corpus from groups
    ///
    /// # Errors
    /// Returns an error if a group or unit id appears twice
    pub fn from_groups(groups: impl IntoIterator<Item = UnitGroup>) -> Result<Self, SyntaxError> {
        groups
            .into_iter()
            .try_fold(Self::new(), |corpus, group| corpus.add_group(group))
    }

    /// Append a group
    ///
    /// # Errors
    /// Returns an error if the group id or any of its unit ids is already present
    pub fn add_group(mut self, group: UnitGroup) -> Result<Self, SyntaxError> {
        if self.group(&group.id()).is_some() {
            return Err(SyntaxError::DuplicateGroup(group.id()));
        }
        if let Some(dup) = group.units().iter().find(|u| self.find_unit(&u.id()).is_some()) {
            return Err(SyntaxError::DuplicateUnit(dup.id()));
        }
        self.groups.push_back(group);
        Ok(self)
    }

    /// Groups in order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &Vector<UnitGroup> {
        &self.groups
    }

    /// Group by id
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&UnitGroup> {
        self.groups.iter().find(|g| g.id() == *id)
    }

    /// Unit by id, with its owning group
    #[must_use]
    pub fn find_unit(&self, id: &UnitId) -> Option<(&UnitGroup, &SourceUnit)> {
        self.groups
            .iter()
            .find_map(|g| g.unit(id).map(|u| (g, u)))
    }

    /// Groups carrying the given language tag, in corpus order
    pub fn groups_with_language<'a>(
        &'a self,
        language: &'a LanguageTag,
    ) -> impl Iterator<Item = &'a UnitGroup> + 'a {
        self.groups.iter().filter(move |g| g.language() == language)
    }

    /// Total number of units
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.groups.iter().map(UnitGroup::len).sum()
    }

    /// New corpus with the given units superseded
    ///
    /// Units are matched by [`UnitId`]; every group and unit not mentioned
    /// is shared with `self`.
    ///
    /// # Errors
    /// Returns `SyntaxError::UnknownUnit` if a unit is not part of the corpus
    pub fn replace_units(
        &self,
        units: impl IntoIterator<Item = SourceUnit>,
    ) -> Result<Self, SyntaxError> {
        let mut groups = self.groups.clone();
        for unit in units {
            let index = groups
                .iter()
                .position(|g| g.contains_unit(&unit.id()))
                .ok_or(SyntaxError::UnknownUnit(unit.id()))?;
            let group = groups[index].replace_unit(unit)?;
            groups.set(index, group);
        }
        Ok(Self { groups })
    }
}

/// Errors for corpus operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// Unit not in group/corpus
    #[error("unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// Group not in corpus
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    /// Unit id already present
    #[error("duplicate unit: {0}")]
    DuplicateUnit(UnitId),

    /// Group id already present
    #[error("duplicate group: {0}")]
    DuplicateGroup(GroupId),

    /// Node path problem
    #[error(transparent)]
    Path(#[from] PathError),
}

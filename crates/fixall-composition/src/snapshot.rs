//! Corpus snapshot composition
//!
//! Provides [`SnapshotComposer`], the single-threaded replace-and-rebuild
//! step that turns independently computed per-unit roots into one new
//! [`Corpus`] value.

use fixall_syntax::{Corpus, GroupId, SyntaxError, SyntaxNode, UnitId};
use std::collections::HashSet;

/// New root for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReplacement {
    /// Unit being superseded
    pub unit: UnitId,

    /// Root of the superseding unit
    pub root: SyntaxNode,
}

impl UnitReplacement {
    /// Create replacement
    #[inline]
    #[must_use]
    pub fn new(unit: UnitId, root: SyntaxNode) -> Self {
        Self { unit, root }
    }
}

/// Rebuilds a corpus from per-unit replacements
///
/// The result always has the same groups, in the same order, holding the
/// same unit ids in the same order as the base; only roots differ.
/// Replacements whose root equals the unit's current root are ignored so
/// the unit (and its tree identity) is carried over untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotComposer;

impl SnapshotComposer {
    /// Create composer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `replacements` to `base`
    ///
    /// # Errors
    /// - `CompositionError::UnknownUnit` if a replacement names a unit outside `base`
    /// - `CompositionError::DuplicateReplacement` if a unit is replaced twice
    /// - `CompositionError::ShapeMismatch` if the rebuilt corpus lost or reordered units
    pub fn compose(
        &self,
        base: &Corpus,
        replacements: impl IntoIterator<Item = UnitReplacement>,
    ) -> Result<Corpus, CompositionError> {
        let mut seen = HashSet::new();
        let mut superseding = Vec::new();

        for replacement in replacements {
            if !seen.insert(replacement.unit) {
                return Err(CompositionError::DuplicateReplacement(replacement.unit));
            }
            let (_, unit) = base
                .find_unit(&replacement.unit)
                .ok_or(CompositionError::UnknownUnit(replacement.unit))?;
            if *unit.root() == replacement.root {
                continue;
            }
            superseding.push(unit.with_root(replacement.root));
        }

        if superseding.is_empty() {
            return Ok(base.clone());
        }

        let composed = base.replace_units(superseding)?;
        verify_shape(base, &composed)?;
        Ok(composed)
    }
}

/// Check that `composed` holds exactly the groups and units of `base`
///
/// # Errors
/// Returns `CompositionError::ShapeMismatch` describing the first difference
pub fn verify_shape(base: &Corpus, composed: &Corpus) -> Result<(), CompositionError> {
    let mismatch = |group: GroupId, reason: String| CompositionError::ShapeMismatch { group, reason };

    if base.groups().len() != composed.groups().len() {
        let group = base.groups().iter().next().map(|g| g.id()).unwrap_or_default();
        return Err(mismatch(
            group,
            format!(
                "group count changed from {} to {}",
                base.groups().len(),
                composed.groups().len()
            ),
        ));
    }

    for (before, after) in base.groups().iter().zip(composed.groups().iter()) {
        if before.id() != after.id() {
            return Err(mismatch(before.id(), format!("group replaced by {}", after.id())));
        }
        if before.len() != after.len() {
            return Err(mismatch(
                before.id(),
                format!("unit count changed from {} to {}", before.len(), after.len()),
            ));
        }
        let reordered = before
            .units()
            .iter()
            .zip(after.units().iter())
            .find(|(b, a)| b.id() != a.id());
        if let Some((b, a)) = reordered {
            return Err(mismatch(
                before.id(),
                format!("unit {} replaced by {}", b.id(), a.id()),
            ));
        }
    }

    Ok(())
}

/// Errors for composition operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// Replacement targets a unit outside the base corpus
    #[error("unit {0} is not part of the base corpus")]
    UnknownUnit(UnitId),

    /// Same unit replaced more than once
    #[error("unit {0} replaced more than once")]
    DuplicateReplacement(UnitId),

    /// Rebuilt corpus does not match the base shape
    #[error("snapshot shape mismatch in group {group}: {reason}")]
    ShapeMismatch {
        /// Group where the difference was found
        group: GroupId,

        /// Description of the difference
        reason: String,
    },

    /// Underlying corpus operation failed
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixall_syntax::{SourceUnit, UnitGroup};
    use pretty_assertions::assert_eq;

    fn unit(name: &str) -> SourceUnit {
        SourceUnit::new(name, SyntaxNode::root(vec![SyntaxNode::identifier(name)]))
    }

    fn corpus() -> (Corpus, Vec<SourceUnit>) {
        let units = vec![unit("a"), unit("b"), unit("c")];
        let g1 = UnitGroup::new("g1", "rust")
            .add_unit(units[0].clone())
            .unwrap()
            .add_unit(units[1].clone())
            .unwrap();
        let g2 = UnitGroup::new("g2", "rust").add_unit(units[2].clone()).unwrap();
        (Corpus::from_groups([g1, g2]).unwrap(), units)
    }

    #[test]
    fn replaces_only_named_units() {
        let (base, units) = corpus();
        let new_root = SyntaxNode::root(vec![SyntaxNode::literal("1")]);

        let composed = SnapshotComposer::new()
            .compose(&base, [UnitReplacement::new(units[1].id(), new_root.clone())])
            .unwrap();

        let (_, a) = composed.find_unit(&units[0].id()).unwrap();
        let (_, b) = composed.find_unit(&units[1].id()).unwrap();
        let (_, c) = composed.find_unit(&units[2].id()).unwrap();
        assert_eq!(a, &units[0]);
        assert_eq!(b.root(), &new_root);
        assert_ne!(b.tree_id(), units[1].tree_id());
        assert_eq!(c, &units[2]);
        assert_eq!(composed.unit_count(), base.unit_count());
        verify_shape(&base, &composed).unwrap();
    }

    #[test]
    fn unchanged_root_keeps_unit_identity() {
        let (base, units) = corpus();
        let same = UnitReplacement::new(units[0].id(), units[0].root().clone());

        let composed = SnapshotComposer::new().compose(&base, [same]).unwrap();
        assert_eq!(composed, base);
    }

    #[test]
    fn unknown_unit_rejected() {
        let (base, _) = corpus();
        let stranger = unit("z");
        let err = SnapshotComposer::new()
            .compose(&base, [UnitReplacement::new(stranger.id(), SyntaxNode::root(vec![]))])
            .unwrap_err();
        assert_eq!(err, CompositionError::UnknownUnit(stranger.id()));
    }

    #[test]
    fn duplicate_replacement_rejected() {
        let (base, units) = corpus();
        let root = SyntaxNode::root(vec![]);
        let err = SnapshotComposer::new()
            .compose(
                &base,
                [
                    UnitReplacement::new(units[0].id(), root.clone()),
                    UnitReplacement::new(units[0].id(), root),
                ],
            )
            .unwrap_err();
        assert_eq!(err, CompositionError::DuplicateReplacement(units[0].id()));
    }

    #[test]
    fn shape_check_detects_missing_unit() {
        let (base, units) = corpus();
        let g1 = UnitGroup::new("g1", "rust").add_unit(units[0].clone()).unwrap();
        let smaller = Corpus::from_groups([g1]).unwrap();

        assert!(matches!(
            verify_shape(&base, &smaller),
            Err(CompositionError::ShapeMismatch { .. })
        ));
    }
}

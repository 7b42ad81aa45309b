//! Overload signature matching
//!
//! Finds the sibling overload of a method that differs from it only by the
//! insertion of a given list of "extra" parameter types.
//!
//! Each candidate is tested in two phases; the first candidate (in sibling
//! order) passing either phase wins:
//!
//! 1. **Positional**: walk target, candidate and extra lists with three
//!    cursors. Equal types advance target and candidate together; otherwise
//!    the current extra type may be skipped on the target side or consumed on
//!    the candidate side. Equal-type matching is always tried first.
//! 2. **Multiset**: remove the target's types and then the extra types from
//!    the candidate's parameters; what is left must be nothing, or only
//!    optional parameters when an optional tail is allowed.

use crate::signature::{MethodSignature, Parameter, TypeRef};

/// Matching switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Accept candidates whose leftover parameters are all optional
    pub allow_optional_tail: bool,

    /// Consider candidates marked as excluded
    pub include_excluded: bool,
}

/// Which phase accepted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Ordered three-cursor walk
    Positional,

    /// Order-insensitive fallback
    Multiset,
}

/// Overload signature matcher
///
/// Pure and total: every input is legal, the worst case is no match.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverloadMatcher {
    options: MatchOptions,
}

impl OverloadMatcher {
    /// Create matcher
    #[inline]
    #[must_use]
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Accept trailing optional parameters
    #[inline]
    #[must_use]
    pub fn with_optional_tail(mut self) -> Self {
        self.options.allow_optional_tail = true;
        self
    }

    /// Consider excluded candidates
    #[inline]
    #[must_use]
    pub fn including_excluded(mut self) -> Self {
        self.options.include_excluded = true;
        self
    }

    /// Active options
    #[inline]
    #[must_use]
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// First sibling of `target` that adds exactly `extra`
    #[must_use]
    pub fn find<'a>(
        &self,
        target: &MethodSignature,
        siblings: &'a [MethodSignature],
        extra: &[TypeRef],
    ) -> Option<&'a MethodSignature> {
        self.find_with_phase(target, siblings, extra)
            .map(|(found, _)| found)
    }

    /// Like [`find`](Self::find), also reporting which phase accepted the match
    #[must_use]
    pub fn find_with_phase<'a>(
        &self,
        target: &MethodSignature,
        siblings: &'a [MethodSignature],
        extra: &[TypeRef],
    ) -> Option<(&'a MethodSignature, MatchPhase)> {
        siblings
            .iter()
            .filter(|candidate| candidate.id() != target.id())
            .filter(|candidate| self.options.include_excluded || !candidate.is_excluded())
            .find_map(|candidate| {
                self.test_candidate(target.parameters(), candidate.parameters(), extra)
                    .map(|phase| (candidate, phase))
            })
    }

    fn test_candidate(
        &self,
        target: &[Parameter],
        candidate: &[Parameter],
        extra: &[TypeRef],
    ) -> Option<MatchPhase> {
        if positional_match(target, candidate, extra) {
            Some(MatchPhase::Positional)
        } else if multiset_match(target, candidate, extra, self.options.allow_optional_tail) {
            Some(MatchPhase::Multiset)
        } else {
            None
        }
    }
}

/// Find the overload of `target` among `siblings` that adds `extra`
#[must_use]
pub fn find_overload<'a>(
    target: &MethodSignature,
    siblings: &'a [MethodSignature],
    extra: &[TypeRef],
    allow_optional_tail: bool,
    include_excluded: bool,
) -> Option<&'a MethodSignature> {
    OverloadMatcher::new(MatchOptions {
        allow_optional_tail,
        include_excluded,
    })
    .find(target, siblings, extra)
}

fn positional_match(target: &[Parameter], candidate: &[Parameter], extra: &[TypeRef]) -> bool {
    let (mut i, mut j, mut k) = (0, 0, 0);

    while i < target.len() || j < candidate.len() {
        let t = target.get(i).map(Parameter::ty);
        let c = candidate.get(j).map(Parameter::ty);
        let x = extra.get(k);

        match (t, c) {
            (Some(t), Some(c)) if t == c => {
                i += 1;
                j += 1;
            }
            (Some(t), _) if x == Some(t) => {
                i += 1;
                k += 1;
            }
            (_, Some(c)) if x == Some(c) => {
                j += 1;
                k += 1;
            }
            _ => return false,
        }
    }

    true
}

fn multiset_match(
    target: &[Parameter],
    candidate: &[Parameter],
    extra: &[TypeRef],
    allow_optional_tail: bool,
) -> bool {
    let mut remaining: Vec<&Parameter> = candidate.iter().collect();

    // Target types the candidate lacks; only an extra of the same type excuses them.
    // Keeps a candidate with fewer parameters than the target from matching.
    let mut unmatched: Vec<&TypeRef> = Vec::new();
    for param in target {
        if !take(&mut remaining, param.ty()) {
            unmatched.push(param.ty());
        }
    }

    for ty in extra {
        if take(&mut remaining, ty) {
            continue;
        }
        if let Some(pos) = unmatched.iter().position(|u| *u == ty) {
            unmatched.remove(pos);
        }
    }

    if !unmatched.is_empty() {
        return false;
    }

    remaining.is_empty() || (allow_optional_tail && remaining.iter().all(|p| p.is_optional()))
}

/// Remove one parameter of type `ty`, preferring a required one
fn take(remaining: &mut Vec<&Parameter>, ty: &TypeRef) -> bool {
    let pos = remaining
        .iter()
        .position(|p| p.ty() == ty && !p.is_optional())
        .or_else(|| remaining.iter().position(|p| p.ty() == ty));

    match pos {
        Some(pos) => {
            remaining.remove(pos);
            true
        }
        None => false,
    }
}

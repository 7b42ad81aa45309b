//! Overload sibling index
//!
//! Provides [`SignatureIndex`], a concurrent map from a method's container and
//! name to every overload declared there, in declaration order.

use crate::overload::OverloadMatcher;
use crate::signature::{MethodSignature, TypeRef};
use crate::symbol::SymbolId;
use dashmap::DashMap;
use std::sync::Arc;

/// Key grouping overloads: declaring container plus method name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OverloadKey {
    container: Arc<str>,
    name: Arc<str>,
}

impl OverloadKey {
    fn new(container: &str, name: &str) -> Self {
        Self {
            container: Arc::from(container),
            name: Arc::from(name),
        }
    }
}

/// Thread-safe index of method overloads
///
/// Readers may query while other tasks insert; each overload list keeps
/// insertion order.
#[derive(Debug, Default)]
pub struct SignatureIndex {
    overloads: DashMap<OverloadKey, Vec<MethodSignature>>,
}

impl SignatureIndex {
    /// Create empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `signature` as declared in `container`
    ///
    /// Re-inserting a signature with an id already present replaces it in place.
    pub fn insert(&self, container: &str, signature: MethodSignature) {
        let key = OverloadKey::new(container, signature.name());
        let mut entry = self.overloads.entry(key).or_default();
        match entry.iter_mut().find(|s| s.id() == signature.id()) {
            Some(existing) => *existing = signature,
            None => entry.push(signature),
        }
    }

    /// Every overload of `name` in `container`, in declaration order
    #[must_use]
    pub fn siblings(&self, container: &str, name: &str) -> Vec<MethodSignature> {
        self.overloads
            .get(&OverloadKey::new(container, name))
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Look up a signature by id within its overload set
    #[must_use]
    pub fn get(&self, container: &str, name: &str, id: SymbolId) -> Option<MethodSignature> {
        self.overloads
            .get(&OverloadKey::new(container, name))
            .and_then(|list| list.iter().find(|s| s.id() == id).cloned())
    }

    /// Resolve the overload of `target` adding `extra`, using the indexed siblings
    #[must_use]
    pub fn find_overload(
        &self,
        container: &str,
        target: &MethodSignature,
        extra: &[TypeRef],
        matcher: &OverloadMatcher,
    ) -> Option<MethodSignature> {
        let siblings = self.siblings(container, target.name());
        matcher.find(target, &siblings, extra).cloned()
    }

    /// Number of indexed signatures
    #[must_use]
    pub fn len(&self) -> usize {
        self.overloads.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.overloads.clear();
    }
}

//! Symbol identities
//!
//! A [`Symbol`] is what an identifier *means*, as opposed to what it spells.
//! Two identifiers with the same text may denote different symbols when one
//! of them is shadowed by a nested declaration.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use ulid::Ulid;

/// Unique symbol identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub Ulid);

impl SymbolId {
    /// Generate new symbol ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Lambda parameter
    Parameter,

    /// `let`-bound local
    Local,

    /// Method or named function
    Method,

    /// Name with no declaration in the bound subtree
    Free,
}

/// A declared (or free) name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: SymbolId,
    name: Arc<str>,
    kind: SymbolKind,
}

impl Symbol {
    /// Create symbol with a fresh id
    #[must_use]
    pub fn new(name: &str, kind: SymbolKind) -> Self {
        Self {
            id: SymbolId::new(),
            name: Arc::from(name),
            kind,
        }
    }

    /// Symbol id
    #[inline]
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Declared name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symbol kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

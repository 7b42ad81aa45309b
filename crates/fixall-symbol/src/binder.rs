//! Lexical binder
//!
//! Resolves every identifier in a subtree to the [`Symbol`] it denotes.
//! Scoping rules:
//! - a `Lambda`'s parameters are in scope in its body only
//! - a `Let`'s name is in scope in its body (second child) only, not in its value
//! - an identifier resolves to the innermost enclosing declaration with the
//!   same text; otherwise to a free symbol shared by all free uses of that text

use crate::symbol::{Symbol, SymbolId, SymbolKind};
use fixall_syntax::{NodePath, SyntaxKind, SyntaxNode};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of binding one subtree
///
/// Paths are relative to the node passed to [`Binder::bind`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    symbols: HashMap<SymbolId, Symbol>,
    declarations: BTreeMap<NodePath, SymbolId>,
    references: BTreeMap<NodePath, SymbolId>,
}

impl Bindings {
    /// Symbol by id
    #[inline]
    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Symbol declared by the node at `path` (a `Parameter` or `Let`)
    #[inline]
    #[must_use]
    pub fn declared_at(&self, path: &NodePath) -> Option<SymbolId> {
        self.declarations.get(path).copied()
    }

    /// Symbol an identifier at `path` resolves to
    #[inline]
    #[must_use]
    pub fn referenced_at(&self, path: &NodePath) -> Option<SymbolId> {
        self.references.get(path).copied()
    }

    /// Paths of every identifier resolving to `id`, in preorder
    #[must_use]
    pub fn references_to(&self, id: SymbolId) -> Vec<NodePath> {
        self.references
            .iter()
            .filter(|(_, sym)| **sym == id)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// All identifier references in preorder
    pub fn references(&self) -> impl Iterator<Item = (&NodePath, SymbolId)> {
        self.references.iter().map(|(path, id)| (path, *id))
    }

    /// All declarations in preorder
    pub fn declarations(&self) -> impl Iterator<Item = (&NodePath, SymbolId)> {
        self.declarations.iter().map(|(path, id)| (path, *id))
    }

    /// Symbols with no declaration inside the bound subtree
    pub fn free_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .values()
            .filter(|s| s.kind() == SymbolKind::Free)
    }

    /// Parameter symbol of the lambda at `lambda_path`, if it has exactly one
    #[must_use]
    pub fn single_parameter_of(&self, root: &SyntaxNode, lambda_path: &NodePath) -> Option<SymbolId> {
        let lambda = root.at(lambda_path)?;
        match lambda.lambda_parameters() {
            [_] => self.declared_at(&lambda_path.child(0)),
            _ => None,
        }
    }
}

/// Explicit symbol-resolution pass over a syntax subtree
#[derive(Debug, Default)]
pub struct Binder {
    bindings: Bindings,
    scopes: Vec<(Arc<str>, SymbolId)>,
    free: HashMap<Arc<str>, SymbolId>,
}

impl Binder {
    /// Bind every identifier under `root`
    #[must_use]
    pub fn bind(root: &SyntaxNode) -> Bindings {
        let mut binder = Self::default();
        binder.walk(root, NodePath::root());
        binder.bindings
    }

    fn walk(&mut self, node: &SyntaxNode, path: NodePath) {
        match node.kind() {
            SyntaxKind::Lambda => {
                let mark = self.scopes.len();
                let params = node.lambda_parameters();
                for (i, param) in params.iter().enumerate() {
                    self.declare(param, path.child(i), SymbolKind::Parameter);
                }
                if let Some(body) = node.lambda_body() {
                    self.walk(body, path.child(params.len()));
                }
                self.scopes.truncate(mark);
            }
            SyntaxKind::Let => {
                if let Some(value) = node.child(0) {
                    self.walk(value, path.child(0));
                }
                let mark = self.scopes.len();
                self.declare(node, path.clone(), SymbolKind::Local);
                for (i, rest) in node.children().iter().enumerate().skip(1) {
                    self.walk(rest, path.child(i));
                }
                self.scopes.truncate(mark);
            }
            SyntaxKind::Identifier => {
                let id = self.resolve(node.text().unwrap_or_default());
                self.bindings.references.insert(path, id);
            }
            _ => {
                for (i, child) in node.children().iter().enumerate() {
                    self.walk(child, path.child(i));
                }
            }
        }
    }

    fn declare(&mut self, node: &SyntaxNode, path: NodePath, kind: SymbolKind) {
        let name = node.text().unwrap_or_default();
        let symbol = Symbol::new(name, kind);
        let id = symbol.id();
        self.bindings.symbols.insert(id, symbol);
        self.bindings.declarations.insert(path, id);
        self.scopes.push((Arc::from(name), id));
    }

    fn resolve(&mut self, name: &str) -> SymbolId {
        if let Some((_, id)) = self.scopes.iter().rev().find(|(n, _)| &**n == name) {
            return *id;
        }
        if let Some(id) = self.free.get(name) {
            return *id;
        }

        let symbol = Symbol::new(name, SymbolKind::Free);
        let id = symbol.id();
        self.bindings.symbols.insert(id, symbol);
        self.free.insert(Arc::from(name), id);
        id
    }
}

//! Immutable syntax nodes
//!
//! A [`SyntaxNode`] is an `Arc`-shared, never-mutated tree node. Every edit
//! produces a new root by path copying: the nodes along the edited path are
//! rebuilt and every untouched sibling subtree is shared with the old root.

use crate::hash::ContentHash;
use crate::path::{NodePath, PathError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    /// Unit root
    Root,
    /// Named top-level declaration (text = name)
    Item,
    /// Statement sequence
    Block,
    /// Local binding (text = declared name, children = `[value, body]`)
    Let,
    /// Anonymous function (children = parameters followed by the body)
    Lambda,
    /// Lambda parameter declaration (text = name)
    Parameter,
    /// Name reference (text = name)
    Identifier,
    /// Literal token (text = source spelling)
    Literal,
    /// Binary operation (text = operator, children = `[lhs, rhs]`)
    Binary,
    /// Prefix operation (text = operator, children = `[operand]`)
    Unary,
    /// Invocation (children = callee followed by arguments)
    Call,
    /// Member access (text = member name, children = `[target]`)
    Member,
    /// Anything the core does not need to understand
    Other,
}

/// Immutable syntax tree node
///
/// Cheap to clone. Equality is structural and decided by content hash.
#[derive(Clone)]
pub struct SyntaxNode {
    inner: Arc<NodeData>,
}

struct NodeData {
    kind: SyntaxKind,
    text: Option<Arc<str>>,
    children: Vec<SyntaxNode>,
    hash: ContentHash,
}

impl SyntaxNode {
    /// Create node from parts, computing its content hash
    #[must_use]
    pub fn new(kind: SyntaxKind, text: Option<&str>, children: Vec<SyntaxNode>) -> Self {
        let hash = ContentHash::of_node(kind, text, children.iter().map(SyntaxNode::content_hash));
        Self {
            inner: Arc::new(NodeData {
                kind,
                text: text.map(Arc::from),
                children,
                hash,
            }),
        }
    }

    /// Unit root
    #[must_use]
    pub fn root(children: Vec<SyntaxNode>) -> Self {
        Self::new(SyntaxKind::Root, None, children)
    }

    /// Named declaration
    #[must_use]
    pub fn item(name: &str, children: Vec<SyntaxNode>) -> Self {
        Self::new(SyntaxKind::Item, Some(name), children)
    }

    /// Statement sequence
    #[must_use]
    pub fn block(children: Vec<SyntaxNode>) -> Self {
        Self::new(SyntaxKind::Block, None, children)
    }

    /// `let name = value; body` where `name` is only in scope inside `body`
    #[must_use]
    pub fn let_in(name: &str, value: SyntaxNode, body: SyntaxNode) -> Self {
        Self::new(SyntaxKind::Let, Some(name), vec![value, body])
    }

    /// Single-parameter lambda `param => body`
    #[must_use]
    pub fn lambda(param: &str, body: SyntaxNode) -> Self {
        Self::lambda_with(&[param], body)
    }

    /// Lambda with any number of parameters
    #[must_use]
    pub fn lambda_with(params: &[&str], body: SyntaxNode) -> Self {
        let mut children: Vec<SyntaxNode> = params.iter().map(|p| Self::parameter(p)).collect();
        children.push(body);
        Self::new(SyntaxKind::Lambda, None, children)
    }

    /// Parameter declaration
    #[must_use]
    pub fn parameter(name: &str) -> Self {
        Self::new(SyntaxKind::Parameter, Some(name), Vec::new())
    }

    /// Name reference
    #[must_use]
    pub fn identifier(name: &str) -> Self {
        Self::new(SyntaxKind::Identifier, Some(name), Vec::new())
    }

    /// Literal token
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::new(SyntaxKind::Literal, Some(text), Vec::new())
    }

    /// Binary operation
    #[must_use]
    pub fn binary(lhs: SyntaxNode, op: &str, rhs: SyntaxNode) -> Self {
        Self::new(SyntaxKind::Binary, Some(op), vec![lhs, rhs])
    }

    /// Logical conjunction `lhs && rhs`
    #[must_use]
    pub fn and(lhs: SyntaxNode, rhs: SyntaxNode) -> Self {
        Self::binary(lhs, "&&", rhs)
    }

    /// Prefix operation
    #[must_use]
    pub fn unary(op: &str, operand: SyntaxNode) -> Self {
        Self::new(SyntaxKind::Unary, Some(op), vec![operand])
    }

    /// Invocation `callee(args...)`
    #[must_use]
    pub fn call(callee: SyntaxNode, args: Vec<SyntaxNode>) -> Self {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(callee);
        children.extend(args);
        Self::new(SyntaxKind::Call, None, children)
    }

    /// Member access `target.name`
    #[must_use]
    pub fn member(target: SyntaxNode, name: &str) -> Self {
        Self::new(SyntaxKind::Member, Some(name), vec![target])
    }

    /// Opaque node
    #[must_use]
    pub fn other(text: &str, children: Vec<SyntaxNode>) -> Self {
        Self::new(SyntaxKind::Other, Some(text), children)
    }

    /// Node kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        self.inner.kind
    }

    /// Token text, if any
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    /// Ordered children
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[SyntaxNode] {
        &self.inner.children
    }

    /// Child at index
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&SyntaxNode> {
        self.inner.children.get(index)
    }

    /// Content hash
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> &ContentHash {
        &self.inner.hash
    }

    /// Whether two handles point at the very same node allocation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &SyntaxNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check node kind
    #[inline]
    #[must_use]
    pub fn is(&self, kind: SyntaxKind) -> bool {
        self.inner.kind == kind
    }

    /// Identifier with the given text
    #[must_use]
    pub fn is_identifier_named(&self, name: &str) -> bool {
        self.is(SyntaxKind::Identifier) && self.text() == Some(name)
    }

    /// Parameter declarations of a lambda (empty for other kinds)
    #[must_use]
    pub fn lambda_parameters(&self) -> &[SyntaxNode] {
        match (self.kind(), self.inner.children.split_last()) {
            (SyntaxKind::Lambda, Some((_, params))) => params,
            _ => &[],
        }
    }

    /// Body of a lambda
    #[must_use]
    pub fn lambda_body(&self) -> Option<&SyntaxNode> {
        if self.is(SyntaxKind::Lambda) {
            self.inner.children.last()
        } else {
            None
        }
    }

    /// Same kind and text with new children
    #[must_use]
    pub fn with_children(&self, children: Vec<SyntaxNode>) -> Self {
        Self::new(self.kind(), self.text(), children)
    }

    /// Same kind and children with new text
    #[must_use]
    pub fn with_text(&self, text: &str) -> Self {
        Self::new(self.kind(), Some(text), self.inner.children.clone())
    }

    /// Node addressed by `path`
    #[must_use]
    pub fn at(&self, path: &NodePath) -> Option<&SyntaxNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, &index| node.child(index))
    }

    /// New root with the node at `path` replaced
    ///
    /// # Errors
    /// Returns `PathError::OutOfBounds` if `path` does not address a node
    pub fn replace_at(
        &self,
        path: &NodePath,
        replacement: SyntaxNode,
    ) -> Result<SyntaxNode, PathError> {
        self.replace_segments(path.segments(), replacement, path, 0)
    }

    fn replace_segments(
        &self,
        segments: &[usize],
        replacement: SyntaxNode,
        full: &NodePath,
        depth: usize,
    ) -> Result<SyntaxNode, PathError> {
        let Some((&first, rest)) = segments.split_first() else {
            return Ok(replacement);
        };

        let child = self.child(first).ok_or_else(|| PathError::OutOfBounds {
            path: full.to_string(),
            depth,
        })?;
        let new_child = child.replace_segments(rest, replacement, full, depth + 1)?;

        let mut children = self.inner.children.clone();
        children[first] = new_child;
        Ok(self.with_children(children))
    }

    /// New root with every `(path, node)` replacement applied
    ///
    /// # Errors
    /// Returns `PathError::OutOfBounds` on the first path that does not
    /// address a node
    pub fn replace_all<'a>(
        &self,
        replacements: impl IntoIterator<Item = (&'a NodePath, SyntaxNode)>,
    ) -> Result<SyntaxNode, PathError> {
        replacements
            .into_iter()
            .try_fold(self.clone(), |root, (path, node)| root.replace_at(path, node))
    }

    /// All nodes in preorder with their paths
    #[must_use]
    pub fn preorder(&self) -> Vec<(NodePath, SyntaxNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(NodePath::root(), self.clone())];
        while let Some((path, node)) = stack.pop() {
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((path.child(i), child.clone()));
            }
            out.push((path, node));
        }
        out
    }

    /// Paths of all nodes matching `predicate`, in preorder
    #[must_use]
    pub fn find_all(&self, predicate: impl Fn(&SyntaxNode) -> bool) -> Vec<NodePath> {
        self.preorder()
            .into_iter()
            .filter(|(_, node)| predicate(node))
            .map(|(path, _)| path)
            .collect()
    }

    /// Render as compact source text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        let text = self.text().unwrap_or_default();
        match self.kind() {
            SyntaxKind::Root => {
                for (i, child) in self.children().iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    child.write_source(out);
                }
            }
            SyntaxKind::Item => {
                out.push_str(text);
                out.push_str(" { ");
                self.write_separated(out, self.children(), "; ");
                out.push_str(" }");
            }
            SyntaxKind::Block => {
                out.push_str("{ ");
                self.write_separated(out, self.children(), "; ");
                out.push_str(" }");
            }
            SyntaxKind::Let => {
                out.push_str("let ");
                out.push_str(text);
                out.push_str(" = ");
                if let Some(value) = self.child(0) {
                    value.write_source(out);
                }
                out.push_str("; ");
                if let Some(body) = self.child(1) {
                    body.write_source(out);
                }
            }
            SyntaxKind::Lambda => {
                let params = self.lambda_parameters();
                if params.len() == 1 {
                    params[0].write_source(out);
                } else {
                    out.push('(');
                    self.write_separated(out, params, ", ");
                    out.push(')');
                }
                out.push_str(" => ");
                if let Some(body) = self.lambda_body() {
                    body.write_source(out);
                }
            }
            SyntaxKind::Parameter | SyntaxKind::Identifier | SyntaxKind::Literal => {
                out.push_str(text);
            }
            SyntaxKind::Binary => {
                let prec = precedence(text);
                if let Some(lhs) = self.child(0) {
                    lhs.write_operand(out, |p| p < prec);
                }
                out.push(' ');
                out.push_str(text);
                out.push(' ');
                if let Some(rhs) = self.child(1) {
                    rhs.write_operand(out, |p| p <= prec);
                }
            }
            SyntaxKind::Unary => {
                out.push_str(text);
                if let Some(operand) = self.child(0) {
                    operand.write_operand(out, |_| true);
                }
            }
            SyntaxKind::Call => {
                if let Some((callee, args)) = self.children().split_first() {
                    callee.write_operand(out, |_| true);
                    out.push('(');
                    self.write_separated(out, args, ", ");
                    out.push(')');
                }
            }
            SyntaxKind::Member => {
                if let Some(target) = self.child(0) {
                    target.write_operand(out, |_| true);
                }
                out.push('.');
                out.push_str(text);
            }
            SyntaxKind::Other => {
                out.push_str(text);
                if !self.children().is_empty() {
                    out.push('(');
                    self.write_separated(out, self.children(), ", ");
                    out.push(')');
                }
            }
        }
    }

    fn write_operand(&self, out: &mut String, needs_parens: impl Fn(u8) -> bool) {
        let wrap = match self.kind() {
            SyntaxKind::Binary => needs_parens(precedence(self.text().unwrap_or_default())),
            SyntaxKind::Lambda | SyntaxKind::Let => true,
            _ => false,
        };
        if wrap {
            out.push('(');
            self.write_source(out);
            out.push(')');
        } else {
            self.write_source(out);
        }
    }

    fn write_separated(&self, out: &mut String, nodes: &[SyntaxNode], sep: &str) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            node.write_source(out);
        }
    }
}

fn precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" => 3,
        "<" | ">" | "<=" | ">=" => 4,
        "+" | "-" => 5,
        "*" | "/" | "%" => 6,
        _ => 7,
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.hash == other.inner.hash
    }
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash.hash(state);
    }
}

impl Debug for SyntaxNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind())?;
        if let Some(text) = self.text() {
            write!(f, "({text:?})")?;
        }
        if !self.children().is_empty() {
            f.debug_list().entries(self.children()).finish()?;
        }
        Ok(())
    }
}

impl Display for SyntaxNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

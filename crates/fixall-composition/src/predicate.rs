//! Predicate combination
//!
//! Merges two chained single-parameter boolean functions into one
//! conjunctive function `p => lhs && rhs`.
//!
//! Parameter unification is done by symbol identity: every body is run
//! through the [`Binder`] first, and only identifiers resolving to that
//! side's own parameter are rewritten. Same-text identifiers bound by a
//! nested declaration keep their meaning.

use fixall_symbol::{Binder, SymbolId};
use fixall_syntax::{NodePath, SyntaxKind, SyntaxNode};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Parameter name used when neither side supplies one
pub const DEFAULT_FALLBACK_PARAMETER: &str = "arg";

/// A single-parameter boolean function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateFunction {
    /// Lambda written in place: `parameter => body`
    Inline {
        /// Declared parameter name
        parameter: Arc<str>,

        /// Function body
        body: SyntaxNode,
    },

    /// Reference to a named function, e.g. a method group
    NamedReference {
        /// Referenced name as written
        name: Arc<str>,

        /// Symbol the name resolves to
        symbol: SymbolId,
    },
}

impl PredicateFunction {
    /// Inline predicate
    #[must_use]
    pub fn inline(parameter: &str, body: SyntaxNode) -> Self {
        Self::Inline {
            parameter: Arc::from(parameter),
            body,
        }
    }

    /// Named function reference
    #[must_use]
    pub fn named(name: &str, symbol: SymbolId) -> Self {
        Self::NamedReference {
            name: Arc::from(name),
            symbol,
        }
    }

    /// Inline predicate from a single-parameter `Lambda` node
    ///
    /// Returns `None` for any other node or parameter count.
    #[must_use]
    pub fn from_lambda(node: &SyntaxNode) -> Option<Self> {
        match node.lambda_parameters() {
            [param] => {
                let body = node.lambda_body()?;
                Some(Self::inline(param.text().unwrap_or_default(), body.clone()))
            }
            _ => None,
        }
    }

    /// Declared parameter name of an inline predicate
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Inline { parameter, .. } => Some(parameter),
            Self::NamedReference { .. } => None,
        }
    }

    /// Whether this is an inline predicate
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    /// Syntax for this predicate: a lambda or an identifier
    #[must_use]
    pub fn to_node(&self) -> SyntaxNode {
        match self {
            Self::Inline { parameter, body } => SyntaxNode::lambda(parameter, body.clone()),
            Self::NamedReference { name, .. } => SyntaxNode::identifier(name),
        }
    }
}

impl Display for PredicateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_node().render())
    }
}

/// Conjunctive predicate combinator
#[derive(Debug, Clone)]
pub struct PredicateCombinator {
    fallback: Arc<str>,
}

impl Default for PredicateCombinator {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_PARAMETER)
    }
}

impl PredicateCombinator {
    /// Combinator with the given fallback parameter name
    #[must_use]
    pub fn new(fallback: &str) -> Self {
        Self {
            fallback: Arc::from(fallback),
        }
    }

    /// Fallback parameter name
    #[inline]
    #[must_use]
    pub fn fallback_name(&self) -> &str {
        &self.fallback
    }

    /// Combine two optional predicates with logical AND
    ///
    /// An absent side is the identity: the other side is returned
    /// unchanged. When both are present the result is a new inline
    /// predicate whose parameter is `first`'s parameter name (or the
    /// fallback name when `first` is a named reference), renamed with a
    /// numeric suffix if either body already uses that name.
    #[must_use]
    pub fn combine(
        &self,
        first: Option<PredicateFunction>,
        second: Option<PredicateFunction>,
    ) -> Option<PredicateFunction> {
        match (first, second) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only),
            (Some(first), Some(second)) => Some(self.conjoin(&first, &second)),
        }
    }

    fn conjoin(&self, first: &PredicateFunction, second: &PredicateFunction) -> PredicateFunction {
        let lhs = Operand::of(first);
        let rhs = Operand::of(second);

        let base = first.parameter().unwrap_or(self.fallback_name());
        let mut taken = lhs.other_names();
        taken.extend(rhs.other_names());
        let canonical = fresh_name(base, &taken);

        let replacement = SyntaxNode::identifier(&canonical);
        let body = SyntaxNode::and(lhs.rewrite(&replacement), rhs.rewrite(&replacement));
        PredicateFunction::inline(&canonical, body)
    }
}

/// Combine with the default fallback parameter name
#[must_use]
pub fn combine_predicates(
    first: Option<PredicateFunction>,
    second: Option<PredicateFunction>,
) -> Option<PredicateFunction> {
    PredicateCombinator::default().combine(first, second)
}

/// One side of a conjunction: an expression plus the identifier paths
/// that stand for the predicate's argument
struct Operand {
    body: SyntaxNode,
    parameter_uses: HashSet<NodePath>,
}

impl Operand {
    fn of(function: &PredicateFunction) -> Self {
        match function {
            PredicateFunction::Inline { parameter, body } => {
                let lambda = SyntaxNode::lambda(parameter, body.clone());
                let bindings = Binder::bind(&lambda);
                let body_path = NodePath::new(&[1]);

                let parameter_uses = bindings
                    .single_parameter_of(&lambda, &NodePath::root())
                    .map(|param| {
                        bindings
                            .references_to(param)
                            .iter()
                            .filter_map(|path| path.strip_prefix(&body_path))
                            .collect()
                    })
                    .unwrap_or_default();

                Self {
                    body: body.clone(),
                    parameter_uses,
                }
            }
            PredicateFunction::NamedReference { name, .. } => {
                // name(<argument>)
                let body = SyntaxNode::call(
                    SyntaxNode::identifier(name),
                    vec![SyntaxNode::identifier(name)],
                );
                Self {
                    body,
                    parameter_uses: HashSet::from([NodePath::new(&[1])]),
                }
            }
        }
    }

    /// Names declared or referenced anywhere except the argument positions
    fn other_names(&self) -> HashSet<String> {
        self.body
            .preorder()
            .into_iter()
            .filter(|(path, node)| match node.kind() {
                SyntaxKind::Identifier => !self.parameter_uses.contains(path),
                SyntaxKind::Parameter | SyntaxKind::Let => true,
                _ => false,
            })
            .filter_map(|(_, node)| node.text().map(str::to_owned))
            .collect()
    }

    fn rewrite(&self, replacement: &SyntaxNode) -> SyntaxNode {
        substitute(&self.body, &NodePath::root(), &self.parameter_uses, replacement)
    }
}

/// Replace every node at a path in `targets`, sharing untouched subtrees
fn substitute(
    node: &SyntaxNode,
    path: &NodePath,
    targets: &HashSet<NodePath>,
    replacement: &SyntaxNode,
) -> SyntaxNode {
    if targets.contains(path) {
        return replacement.clone();
    }
    if !targets.iter().any(|t| path.is_ancestor_of(t)) {
        return node.clone();
    }

    let children = node
        .children()
        .iter()
        .enumerate()
        .map(|(i, child)| substitute(child, &path.child(i), targets, replacement))
        .collect();
    node.with_children(children)
}

fn fresh_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}

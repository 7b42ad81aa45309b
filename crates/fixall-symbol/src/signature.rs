//! Method signatures
//!
//! Read-only descriptions of a method's parameter list, consumed by the
//! overload matcher.

use crate::symbol::SymbolId;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Reference to a type by its fully resolved name
///
/// Cheap to clone. Two references are the same type iff their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    /// Create type reference
    #[inline]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: Arc<str>,
    ty: TypeRef,
    is_optional: bool,
}

impl Parameter {
    /// Required parameter
    #[must_use]
    pub fn required(name: &str, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: Arc::from(name),
            ty: ty.into(),
            is_optional: false,
        }
    }

    /// Parameter with a default value
    #[must_use]
    pub fn optional(name: &str, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: Arc::from(name),
            ty: ty.into(),
            is_optional: true,
        }
    }

    /// Parameter name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type
    #[inline]
    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Whether the parameter has a default value
    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.is_optional
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)?;
        if self.is_optional {
            f.write_str(" = ..")?;
        }
        Ok(())
    }
}

/// A method's identity and parameter list
///
/// `excluded` marks candidates that lookups skip by default
/// (deprecated or otherwise discouraged overloads).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    id: SymbolId,
    name: Arc<str>,
    parameters: Vec<Parameter>,
    excluded: bool,
}

impl MethodSignature {
    /// Create signature with a fresh identity
    #[must_use]
    pub fn new(name: &str, parameters: Vec<Parameter>) -> Self {
        Self {
            id: SymbolId::new(),
            name: Arc::from(name),
            parameters,
            excluded: false,
        }
    }

    /// Mark as excluded from default lookups
    #[inline]
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Method identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether lookups skip this signature by default
    #[inline]
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }
}

impl Display for MethodSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_parameters() {
        let sig = MethodSignature::new(
            "Compare",
            vec![
                Parameter::required("a", "int"),
                Parameter::optional("b", "StringComparison"),
            ],
        );
        assert_eq!(sig.to_string(), "Compare(a: int, b: StringComparison = ..)");
        assert_eq!(sig.arity(), 2);
        assert!(!sig.is_excluded());
        assert!(sig.clone().excluded().is_excluded());
    }

    #[test]
    fn type_refs_compare_by_name() {
        assert_eq!(TypeRef::new("int"), TypeRef::from("int"));
        assert_ne!(TypeRef::new("int"), TypeRef::new("long"));
    }
}

use super::error::ConfigurationError;
use crate::expression::{Expression, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Whether a type can be the runtime type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeKind {
    #[default]
    Concrete,
    Abstract,
    Interface,
}

impl FromStr for TypeKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concrete" | "class" => Ok(TypeKind::Concrete),
            "abstract" => Ok(TypeKind::Abstract),
            "interface" => Ok(TypeKind::Interface),
            _ => Err(ConfigurationError::UnknownTypeKind(s.to_string())),
        }
    }
}

/// A named type together with its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeRef {
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete,
        }
    }

    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Abstract types and interfaces are never the exact runtime type of anything
    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete
    }
}

/// Declared kinds of the type names rules may refer to.
/// Undeclared names resolve as concrete types.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    kinds: HashMap<String, TypeKind>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, kind: TypeKind) {
        self.kinds.insert(name.into(), kind);
    }

    pub fn with_type(mut self, name: impl Into<String>, kind: TypeKind) -> Self {
        self.declare(name, kind);
        self
    }

    pub fn resolve(&self, name: &str) -> TypeRef {
        let name = name.trim();
        TypeRef::new(name, self.kinds.get(name).copied().unwrap_or_default())
    }
}

/// Tests the runtime type of a property value
#[derive(Debug, Clone)]
pub struct TypeAssertion {
    expression: Expression,
    expected: TypeRef,
    by_compatibility: bool,
}

impl TypeAssertion {
    /// Exact-identity mode is only honoured for concrete types
    pub fn new(expression: Expression, expected: TypeRef, by_compatibility: bool) -> Self {
        let by_compatibility = by_compatibility || !expected.is_instantiable();
        Self {
            expression,
            expected,
            by_compatibility,
        }
    }

    pub fn expected(&self) -> &TypeRef {
        &self.expected
    }

    pub fn by_compatibility(&self) -> bool {
        self.by_compatibility
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub(super) fn test_result(&self, value: &Value<'_>) -> Option<bool> {
        let expected = self.expected.name.as_str();
        match value {
            Value::Null => None,
            Value::Exception(exception) if self.by_compatibility => {
                Some(exception.is_compatible_with(expected))
            }
            Value::Exception(exception) => Some(exception.type_name == expected),
            other => other.kind().map(|kind| kind.name() == expected),
        }
    }
}

impl fmt::Display for TypeAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = if self.by_compatibility { "is-a" } else { "is" };
        write!(f, "{} {} {}", self.expression, relation, self.expected.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ExceptionInfo;

    fn assertion(expected: TypeRef, by_compatibility: bool) -> TypeAssertion {
        TypeAssertion::new(
            Expression::compile("BaseException").unwrap(),
            expected,
            by_compatibility,
        )
    }

    #[test]
    fn test_interface_forces_compatibility_mode() {
        let a = assertion(TypeRef::new("Retryable", TypeKind::Interface), false);
        assert!(a.by_compatibility());
        let a = assertion(TypeRef::new("BaseHttpError", TypeKind::Abstract), false);
        assert!(a.by_compatibility());
        let a = assertion(TypeRef::concrete("TimeoutError"), false);
        assert!(!a.by_compatibility());
    }

    #[test]
    fn test_exact_and_compatible_matching() {
        let ex = ExceptionInfo::new("GatewayTimeout", "slow").with_ancestry(["TimeoutError", "Error"]);
        let value = Value::Exception(&ex);

        assert_eq!(assertion(TypeRef::concrete("GatewayTimeout"), false).test_result(&value), Some(true));
        assert_eq!(assertion(TypeRef::concrete("TimeoutError"), false).test_result(&value), Some(false));
        assert_eq!(assertion(TypeRef::concrete("TimeoutError"), true).test_result(&value), Some(true));
        assert_eq!(assertion(TypeRef::concrete("Error"), true).test_result(&value), Some(true));
        assert_eq!(assertion(TypeRef::concrete("IoError"), true).test_result(&value), Some(false));
        assert_eq!(assertion(TypeRef::concrete("Error"), true).test_result(&Value::Null), None);
    }

    #[test]
    fn test_catalog_defaults_to_concrete() {
        let catalog = TypeCatalog::new().with_type("Retryable", TypeKind::Interface);
        assert_eq!(catalog.resolve("Retryable").kind, TypeKind::Interface);
        assert_eq!(catalog.resolve("TimeoutError").kind, TypeKind::Concrete);
    }
}

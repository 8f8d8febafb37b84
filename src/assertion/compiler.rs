use super::comparison::{ComparisonAssertion, ComparisonOp, Literal, LiteralType};
use super::document::RuleNode;
use super::error::ConfigurationError;
use super::pattern::PatternAssertion;
use super::type_match::{TypeAssertion, TypeCatalog};
use super::{Assertion, CustomAssertion, Predicate};
use crate::expression::Expression;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an assertion from a rule node of a registered kind
pub type AssertionFactory =
    fn(&AssertionCompiler, &RuleNode) -> Result<Assertion, ConfigurationError>;

/// Turns rule nodes into assertion trees.
///
/// Dispatch is by node name through a registry, so hosts can add kinds of
/// their own with [`AssertionCompiler::register`].
#[derive(Clone)]
pub struct AssertionCompiler {
    factories: HashMap<String, AssertionFactory>,
    predicates: HashMap<String, Arc<dyn Predicate>>,
    catalog: TypeCatalog,
}

impl Default for AssertionCompiler {
    fn default() -> Self {
        let mut compiler = Self {
            factories: HashMap::new(),
            predicates: HashMap::new(),
            catalog: TypeCatalog::default(),
        };
        compiler.register("true", |_, _| Ok(Assertion::TRUE));
        compiler.register("false", |_, _| Ok(Assertion::FALSE));
        compiler.register("not", compile_not);
        compiler.register("and", |c, node| Ok(Assertion::and(c.compile_children(node)?)));
        compiler.register("or", |c, node| Ok(Assertion::or(c.compile_children(node)?)));
        compiler.register("equal", |_, node| compile_comparison(node, ComparisonOp::Equal));
        compiler.register("not-equal", |_, node| {
            compile_comparison(node, ComparisonOp::Equal).map(Assertion::not)
        });
        compiler.register("greater", |_, node| compile_comparison(node, ComparisonOp::Greater));
        compiler.register("greater-or-equal", |_, node| {
            compile_comparison(node, ComparisonOp::GreaterOrEqual)
        });
        compiler.register("lesser", |_, node| compile_comparison(node, ComparisonOp::Lesser));
        compiler.register("lesser-or-equal", |_, node| {
            compile_comparison(node, ComparisonOp::LesserOrEqual)
        });
        compiler.register("is-type", |c, node| compile_type(c, node, false));
        compiler.register("is-type-compatible", |c, node| compile_type(c, node, true));
        compiler.register("regex", compile_regex);
        compiler.register("custom", compile_custom);
        compiler
    }
}

impl AssertionCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TypeCatalog {
        &mut self.catalog
    }

    /// Registers (or replaces) the factory for an assertion kind
    pub fn register(&mut self, kind: &str, factory: AssertionFactory) {
        self.factories.insert(kind.to_ascii_lowercase(), factory);
    }

    /// Makes a host predicate available to `custom` nodes under `name`
    pub fn register_predicate(&mut self, name: &str, predicate: impl Predicate + 'static) {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn compile(&self, node: &RuleNode) -> Result<Assertion, ConfigurationError> {
        let factory = self
            .factories
            .get(&node.name().to_ascii_lowercase())
            .ok_or_else(|| {
                ConfigurationError::UnknownAssertion(node.name().to_string()).at(node.location())
            })?;
        factory(self, node).map_err(|e| e.at(node.location()))
    }

    pub fn compile_children(&self, node: &RuleNode) -> Result<Vec<Assertion>, ConfigurationError> {
        node.children().iter().map(|child| self.compile(child)).collect()
    }

    /// Compiles a `test` element, which must wrap exactly one assertion
    pub fn compile_test(&self, node: &RuleNode) -> Result<Assertion, ConfigurationError> {
        match node.children() {
            [single] => self.compile(single),
            [] => Err(node.malformed("test must contain an assertion")),
            _ => Err(node.malformed("test must contain exactly one assertion")),
        }
    }
}

fn compile_not(compiler: &AssertionCompiler, node: &RuleNode) -> Result<Assertion, ConfigurationError> {
    match node.children() {
        [single] => Ok(Assertion::not(compiler.compile(single)?)),
        _ => Err(node.malformed("not must contain exactly one assertion")),
    }
}

fn binding(node: &RuleNode) -> Result<Expression, ConfigurationError> {
    Expression::compile(node.require("binding")?)
}

fn compile_comparison(node: &RuleNode, op: ComparisonOp) -> Result<Assertion, ConfigurationError> {
    let expression = binding(node)?;
    let value = node.require("value")?;

    let comparison = match node.attribute("type") {
        Some(type_name) => ComparisonAssertion::parse(expression, op, type_name, value)?,
        None => {
            let literal_type = LiteralType::for_kind(expression.kind()).ok_or_else(|| {
                ConfigurationError::NonOrdinalType(expression.kind().name().to_string())
            })?;
            let literal = Literal::parse(literal_type, value)?;
            ComparisonAssertion::new(expression, op, literal)
        }
    };
    Ok(Assertion::Comparison(comparison))
}

fn compile_type(
    compiler: &AssertionCompiler,
    node: &RuleNode,
    by_compatibility: bool,
) -> Result<Assertion, ConfigurationError> {
    let expression = binding(node)?;
    let expected = compiler.catalog.resolve(node.require("type")?);
    if expected.name.is_empty() {
        return Err(node.malformed("type name is empty"));
    }
    Ok(Assertion::Type(TypeAssertion::new(
        expression,
        expected,
        by_compatibility,
    )))
}

fn compile_regex(_: &AssertionCompiler, node: &RuleNode) -> Result<Assertion, ConfigurationError> {
    let expression = binding(node)?;
    let pattern = node.require("pattern")?;
    let case_sensitive = node.flag("case-sensitive", true)?;
    Ok(Assertion::Pattern(PatternAssertion::new(
        expression,
        pattern,
        case_sensitive,
    )?))
}

fn compile_custom(
    compiler: &AssertionCompiler,
    node: &RuleNode,
) -> Result<Assertion, ConfigurationError> {
    let name = node.require("name")?;
    let predicate = compiler
        .predicates
        .get(name)
        .ok_or_else(|| ConfigurationError::UnknownPredicate(name.to_string()))?;
    Ok(Assertion::Custom(CustomAssertion::new(
        name,
        Arc::clone(predicate),
    )))
}
